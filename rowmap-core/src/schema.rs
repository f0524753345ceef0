//! Declarative table schemas: column descriptors and DDL generation
//!
//! A [`TableSchema`] aggregates named [`Column`] descriptors and generates
//! the CREATE TABLE / CREATE INDEX / ALTER TABLE text for them. Rows of a
//! schema live in [`crate::row`].

use std::collections::BTreeMap;

use crate::executor::Executor;
use crate::{Error, Result};

/// SQL type of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Auto-incrementing integer (PostgreSQL SERIAL)
    Serial,
    Integer,
    BigInt,
    Real,
    Boolean,
    Text,
    Date,
    /// Timestamp without time zone
    Timestamp,
    /// IP address (PostgreSQL INET)
    Inet,
    /// Any other SQL type, spelled out verbatim
    Custom(String),
}

impl ColumnType {
    /// The SQL spelling of this type
    pub fn sql_name(&self) -> &str {
        match self {
            ColumnType::Serial => "SERIAL",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Real => "REAL",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP WITHOUT TIME ZONE",
            ColumnType::Inet => "INET",
            ColumnType::Custom(name) => name,
        }
    }
}

/// How a column is indexed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indexing {
    /// No index
    No,
    /// Plain index on the column itself
    Plain,
    /// Expression index, e.g. `LOWER(username)`
    Expression(String),
}

/// Defines a column in a [`TableSchema`]
///
/// # Examples
/// ```
/// use rowmap_core::Column;
///
/// let column = Column::text().default_value("'NZD'").not_null();
/// assert_eq!(column.constraints_sql(), "DEFAULT 'NZD' NOT NULL");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    sql_type: ColumnType,
    indexing: Indexing,
    primary_key: bool,
    secondary_key: bool,
    constraints: Vec<String>,
}

impl Column {
    /// Create a column of the given SQL type
    pub fn new(sql_type: ColumnType) -> Self {
        Self {
            sql_type,
            indexing: Indexing::No,
            primary_key: false,
            secondary_key: false,
            constraints: Vec::new(),
        }
    }

    pub fn serial() -> Self {
        Self::new(ColumnType::Serial)
    }

    pub fn integer() -> Self {
        Self::new(ColumnType::Integer)
    }

    pub fn bigint() -> Self {
        Self::new(ColumnType::BigInt)
    }

    pub fn real() -> Self {
        Self::new(ColumnType::Real)
    }

    pub fn boolean() -> Self {
        Self::new(ColumnType::Boolean)
    }

    pub fn text() -> Self {
        Self::new(ColumnType::Text)
    }

    pub fn date() -> Self {
        Self::new(ColumnType::Date)
    }

    pub fn timestamp() -> Self {
        Self::new(ColumnType::Timestamp)
    }

    pub fn inet() -> Self {
        Self::new(ColumnType::Inet)
    }

    /// Create a column with a verbatim SQL type
    pub fn custom(sql_type: impl Into<String>) -> Self {
        Self::new(ColumnType::Custom(sql_type.into()))
    }

    /// Mark this column as the (integer) primary key
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark this column as the unique string secondary key (like a
    /// username, email address, or slug). Implies NOT NULL UNIQUE and a
    /// plain index.
    pub fn secondary_key(mut self) -> Self {
        self.secondary_key = true;
        if self.indexing == Indexing::No {
            self.indexing = Indexing::Plain;
        }
        self
    }

    /// Create a plain index for this column
    pub fn indexed(mut self) -> Self {
        self.indexing = Indexing::Plain;
        self
    }

    /// Create an expression index for this column, e.g.
    /// `indexed_by("LOWER(username)")`
    pub fn indexed_by(mut self, expression: impl Into<String>) -> Self {
        self.indexing = Indexing::Expression(expression.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.push("NOT NULL".to_string());
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.push("UNIQUE".to_string());
        self
    }

    /// Add a DEFAULT constraint. The expression is spelled verbatim, so
    /// string defaults need their own quotes: `default_value("'NZD'")`.
    pub fn default_value(mut self, expression: impl Into<String>) -> Self {
        self.constraints.push(format!("DEFAULT {}", expression.into()));
        self
    }

    /// Add a CHECK constraint
    pub fn check(mut self, expression: impl Into<String>) -> Self {
        self.constraints.push(format!("CHECK ({})", expression.into()));
        self
    }

    /// Add a verbatim constraint fragment
    pub fn constraint(mut self, raw: impl Into<String>) -> Self {
        self.constraints.push(raw.into());
        self
    }

    pub fn sql_type(&self) -> &ColumnType {
        &self.sql_type
    }

    pub fn indexing(&self) -> &Indexing {
        &self.indexing
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_secondary_key(&self) -> bool {
        self.secondary_key
    }

    /// Assemble the constraint text for this column: PRIMARY KEY first,
    /// NOT NULL UNIQUE for secondary keys, then modifiers in call order
    pub fn constraints_sql(&self) -> String {
        let mut parts = Vec::new();
        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if self.secondary_key {
            parts.push("NOT NULL UNIQUE".to_string());
        }
        parts.extend(self.constraints.iter().cloned());
        parts.join(" ")
    }
}

/// Defines a database table with its columns
///
/// Columns iterate in name order, so generated DDL is deterministic.
///
/// # Examples
/// ```
/// use rowmap_core::{Column, TableSchema};
///
/// let users = TableSchema::new("users")
///     .column("id", Column::serial().primary_key())
///     .column("username", Column::text().secondary_key())
///     .column("hash", Column::text());
/// assert_eq!(users.primary_key(), Some("id"));
/// ```
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: BTreeMap<String, Column>,
    primary_key: Option<String>,
    secondary_key: Option<String>,
}

impl TableSchema {
    /// Create a schema for the given table name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
            primary_key: None,
            secondary_key: None,
        }
    }

    /// Add a column. The first column declared as primary (or secondary)
    /// key becomes the table's primary (or secondary) key.
    pub fn column(mut self, name: impl Into<String>, column: Column) -> Self {
        let name = name.into();
        if column.is_primary_key() && self.primary_key.is_none() {
            self.primary_key = Some(name.clone());
        }
        if column.is_secondary_key() && self.secondary_key.is_none() {
            self.secondary_key = Some(name.clone());
        }
        self.columns.insert(name, column);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in name order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Name of the primary key column, if any
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    /// Name of the secondary key column, if any
    pub fn secondary_key(&self) -> Option<&str> {
        self.secondary_key.as_deref()
    }

    /// The SQL required to create the given column, and its index
    /// statement if the column is indexed
    pub fn column_sql(&self, name: &str) -> Result<(String, Option<String>)> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| Error::column_not_found(&self.name, name))?;

        let constraints = column.constraints_sql();
        let sql = if constraints.is_empty() {
            format!("{} {}", name, column.sql_type().sql_name())
        } else {
            format!("{} {} {}", name, column.sql_type().sql_name(), constraints)
        };

        let index = match column.indexing() {
            Indexing::No => None,
            Indexing::Plain => Some(self.index_sql(name, name)),
            Indexing::Expression(expr) => Some(self.index_sql(name, expr)),
        };

        Ok((sql, index))
    }

    fn index_sql(&self, column: &str, expression: &str) -> String {
        format!(
            "CREATE INDEX {table}_{column}_idx ON {table} ({expr})",
            table = self.name,
            column = column,
            expr = expression
        )
    }

    /// The statements that create this table and its indexes, in
    /// execution order: CREATE TABLE first, then one CREATE INDEX per
    /// indexed column
    pub fn create_statements(&self) -> Result<Vec<String>> {
        if self.columns.is_empty() {
            return Err(Error::sql_generation(format!(
                "table '{}' has no columns",
                self.name
            )));
        }

        let mut columns = Vec::new();
        let mut indexes = Vec::new();
        for name in self.columns.keys() {
            let (column, index) = self.column_sql(name)?;
            columns.push(format!("    {}", column));
            if let Some(index) = index {
                indexes.push(index);
            }
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n{})",
            self.name,
            columns.join(",\n")
        )];
        statements.extend(indexes);
        Ok(statements)
    }

    /// The full CREATE TABLE text including index statements, one
    /// statement per line
    pub fn create_sql(&self) -> Result<String> {
        let statements = self.create_statements()?;
        Ok(statements
            .into_iter()
            .map(|s| format!("{};", s))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// The statements that add the given column to an existing table
    pub fn add_column_statements(&self, name: &str) -> Result<Vec<String>> {
        let (column, index) = self.column_sql(name)?;
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.name, column
        )];
        if let Some(index) = index {
            statements.push(index);
        }
        Ok(statements)
    }

    /// The full ALTER TABLE text for adding the given column
    pub fn add_column_sql(&self, name: &str) -> Result<String> {
        let statements = self.add_column_statements(name)?;
        Ok(statements
            .into_iter()
            .map(|s| format!("{};", s))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Create the table and its indexes on the database
    pub async fn create<E: Executor>(&self, executor: &E) -> Result<()> {
        for statement in self.create_statements()? {
            tracing::debug!(table = %self.name, sql = %statement, "creating table");
            executor.execute(&statement, &[]).await?;
        }
        Ok(())
    }

    /// Add a column (after the table has been created)
    pub async fn add_column<E: Executor>(&self, name: &str, executor: &E) -> Result<()> {
        for statement in self.add_column_statements(name)? {
            tracing::debug!(table = %self.name, sql = %statement, "adding column");
            executor.execute(&statement, &[]).await?;
        }
        Ok(())
    }
}
