//! SQL statement builders
//!
//! Builders generate dialect-neutral SQL with `?` placeholders plus the
//! parameter list to bind. Drivers that number their placeholders rewrite
//! them before binding (see [`crate::executor`]).

use crate::schema::TableSchema;
use crate::{Error, IntoOperator, Operator, Result, Value};

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// Generate the SQL text
    fn to_sql(&self) -> Result<String>;

    /// The parameters to bind, in placeholder order
    fn parameters(&self) -> Vec<Value>;

    /// Generate the SQL text with parameters spliced in as literals.
    ///
    /// For logging and dry-run display only; execution always binds.
    /// Builds the output in one pass over the generated SQL so spliced
    /// literals are never re-scanned for placeholders.
    fn to_inline_sql(&self) -> Result<String> {
        let sql = self.to_sql()?;
        let mut params = self.parameters().into_iter();
        let mut out = String::with_capacity(sql.len());
        for ch in sql.chars() {
            if ch == '?' {
                let param = params.next().ok_or_else(|| {
                    Error::sql_generation("more placeholders than parameters")
                })?;
                out.push_str(&param.to_sql_literal());
            } else {
                out.push(ch);
            }
        }
        if params.next().is_some() {
            return Err(Error::sql_generation("more parameters than placeholders"));
        }
        Ok(out)
    }
}

/// Trait for conditions that can be used in WHERE clauses
pub trait IntoCondition {
    fn into_condition(self) -> (String, Operator, Value);
}

// Shorthand equality: where_(("username", "bob"))
impl<T> IntoCondition for (&str, T)
where
    T: Into<Value>,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0.to_string(), Operator::EQ, self.1.into())
    }
}

// Explicit operators: where_(("age", op::GT, 18)) or where_(("age", ">", 18))
impl<T, O> IntoCondition for (&str, O, T)
where
    T: Into<Value>,
    O: IntoOperator,
{
    fn into_condition(self) -> (String, Operator, Value) {
        (self.0.to_string(), self.1.into_operator(), self.2.into())
    }
}

/// A WHERE condition
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    pub connector: WhereConnector,
}

/// How WHERE conditions are connected
#[derive(Debug, Clone, PartialEq)]
pub enum WhereConnector {
    And,
    Or,
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

fn render_where(sql: &mut String, conditions: &[WhereCondition]) -> Result<()> {
    if conditions.is_empty() {
        return Ok(());
    }
    sql.push_str(" WHERE ");
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            match condition.connector {
                WhereConnector::And => sql.push_str(" AND "),
                WhereConnector::Or => sql.push_str(" OR "),
            }
        }

        sql.push_str(&condition.column);
        sql.push(' ');
        sql.push_str(condition.operator.as_str());

        if condition.operator.is_unary() {
            continue;
        }

        // Value lists get one placeholder per element
        match &condition.value {
            Value::Array(items) if items.is_empty() => {
                return Err(Error::invalid_query(format!(
                    "empty value list for column '{}'",
                    condition.column
                )));
            }
            Value::Array(items) => {
                let placeholders: Vec<&str> = items.iter().map(|_| "?").collect();
                sql.push_str(&format!(" ({})", placeholders.join(", ")));
            }
            // IN with a scalar value is a one-element list
            _ if condition.operator.is_list() => sql.push_str(" (?)"),
            _ => sql.push_str(" ?"),
        }
    }
    Ok(())
}

fn where_parameters(conditions: &[WhereCondition], params: &mut Vec<Value>) {
    for condition in conditions {
        if condition.operator.is_unary() {
            continue;
        }
        match &condition.value {
            Value::Array(items) => params.extend(items.iter().cloned()),
            value => params.push(value.clone()),
        }
    }
}

/// SELECT statement builder
///
/// Optionally bound to a [`TableSchema`], in which case referenced columns
/// are validated when the SQL is generated.
///
/// # Examples
/// ```
/// use rowmap_core::{select, op, QueryBuilder, SortDirection};
///
/// let query = select("users")
///     .where_(("username", op::LIKE, "jo%"))
///     .order_by("username", SortDirection::Asc)
///     .limit(5);
/// assert_eq!(
///     query.to_sql().unwrap(),
///     "SELECT * FROM users WHERE username LIKE ? ORDER BY username ASC LIMIT 5"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder<'s> {
    table_name: String,
    schema: Option<&'s TableSchema>,
    selected_columns: Vec<String>,
    where_conditions: Vec<WhereCondition>,
    order_by_clauses: Vec<(String, SortDirection)>,
    limit_value: Option<u64>,
    offset_value: Option<u64>,
}

impl<'s> SelectBuilder<'s> {
    /// Create a new SELECT builder for the given table
    pub fn new(table: &str) -> SelectBuilder<'static> {
        SelectBuilder {
            table_name: table.to_string(),
            schema: None,
            selected_columns: vec!["*".to_string()],
            where_conditions: Vec::new(),
            order_by_clauses: Vec::new(),
            limit_value: None,
            offset_value: None,
        }
    }

    /// Create a SELECT builder bound to a schema
    pub fn for_schema(schema: &'s TableSchema) -> SelectBuilder<'s> {
        SelectBuilder {
            table_name: schema.name().to_string(),
            schema: Some(schema),
            selected_columns: vec!["*".to_string()],
            where_conditions: Vec::new(),
            order_by_clauses: Vec::new(),
            limit_value: None,
            offset_value: None,
        }
    }

    pub(crate) fn schema(&self) -> Option<&'s TableSchema> {
        self.schema
    }

    /// Select specific columns
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.selected_columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Select all columns (the default)
    pub fn select_all(mut self) -> Self {
        self.selected_columns = vec!["*".to_string()];
        self
    }

    /// Add a WHERE condition
    pub fn where_<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector: WhereConnector::And,
        });
        self
    }

    /// Add an OR WHERE condition
    pub fn or_where<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector: WhereConnector::Or,
        });
        self
    }

    /// Add an AND WHERE condition (same as where_)
    pub fn and_where<C>(self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        self.where_(condition)
    }

    /// Add an ORDER BY clause
    pub fn order_by(mut self, column: &str, direction: SortDirection) -> Self {
        self.order_by_clauses.push((column.to_string(), direction));
        self
    }

    /// Add an ORDER BY ASC clause (convenience method)
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Asc)
    }

    /// Add an ORDER BY DESC clause (convenience method)
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, SortDirection::Desc)
    }

    /// Set the LIMIT clause
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_value = Some(limit);
        self
    }

    /// Set the OFFSET clause
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset_value = Some(offset);
        self
    }

    fn validate_column(&self, column: &str) -> Result<()> {
        if let Some(schema) = self.schema {
            if column != "*" && !schema.has_column(column) {
                return Err(Error::column_not_found(schema.name(), column));
            }
        }
        Ok(())
    }
}

impl QueryBuilder for SelectBuilder<'_> {
    fn to_sql(&self) -> Result<String> {
        for column in &self.selected_columns {
            self.validate_column(column)?;
        }
        for condition in &self.where_conditions {
            self.validate_column(&condition.column)?;
        }
        for (column, _) in &self.order_by_clauses {
            self.validate_column(column)?;
        }

        let mut sql = String::new();
        sql.push_str("SELECT ");
        sql.push_str(&self.selected_columns.join(", "));
        sql.push_str(" FROM ");
        sql.push_str(&self.table_name);

        render_where(&mut sql, &self.where_conditions)?;

        if !self.order_by_clauses.is_empty() {
            sql.push_str(" ORDER BY ");
            let order_parts: Vec<String> = self
                .order_by_clauses
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(&order_parts.join(", "));
        }

        if let Some(limit) = self.limit_value {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok(sql)
    }

    fn parameters(&self) -> Vec<Value> {
        let mut params = Vec::new();
        where_parameters(&self.where_conditions, &mut params);
        params
    }
}

/// INSERT statement builder
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table_name: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl InsertBuilder {
    /// Create a new INSERT builder for the given table
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Add a column/value pair
    pub fn value(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.columns.push(column.to_string());
        self.values.push(value.into());
        self
    }

    /// Add several column/value pairs
    pub fn values<I, S, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        for (column, value) in pairs {
            self.columns.push(column.into());
            self.values.push(value.into());
        }
        self
    }
}

impl QueryBuilder for InsertBuilder {
    fn to_sql(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(Error::invalid_query("INSERT requires columns and values"));
        }

        let placeholders: Vec<&str> = self.values.iter().map(|_| "?").collect();
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name,
            self.columns.join(", "),
            placeholders.join(", ")
        ))
    }

    fn parameters(&self) -> Vec<Value> {
        self.values.clone()
    }
}

/// UPDATE statement builder
///
/// Parameters bind SET values first, then WHERE values.
#[derive(Debug, Clone)]
pub struct UpdateBuilder {
    table_name: String,
    set_clauses: Vec<(String, Value)>,
    where_conditions: Vec<WhereCondition>,
}

impl UpdateBuilder {
    /// Create a new UPDATE builder for the given table
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            set_clauses: Vec::new(),
            where_conditions: Vec::new(),
        }
    }

    /// Set a column to a value
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set_clauses.push((column.to_string(), value.into()));
        self
    }

    /// Set several column/value pairs
    pub fn set_values<I, S, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        for (column, value) in pairs {
            self.set_clauses.push((column.into(), value.into()));
        }
        self
    }

    /// Add a WHERE condition
    pub fn where_<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector: WhereConnector::And,
        });
        self
    }

    /// Add an OR WHERE condition
    pub fn or_where<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector: WhereConnector::Or,
        });
        self
    }
}

impl QueryBuilder for UpdateBuilder {
    fn to_sql(&self) -> Result<String> {
        if self.set_clauses.is_empty() {
            return Err(Error::invalid_query("UPDATE requires SET clauses"));
        }

        let mut sql = String::new();
        sql.push_str("UPDATE ");
        sql.push_str(&self.table_name);
        sql.push_str(" SET ");
        let set_parts: Vec<String> = self
            .set_clauses
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .collect();
        sql.push_str(&set_parts.join(", "));

        render_where(&mut sql, &self.where_conditions)?;

        Ok(sql)
    }

    fn parameters(&self) -> Vec<Value> {
        let mut params: Vec<Value> = self
            .set_clauses
            .iter()
            .map(|(_, value)| value.clone())
            .collect();
        where_parameters(&self.where_conditions, &mut params);
        params
    }
}

/// DELETE statement builder
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table_name: String,
    where_conditions: Vec<WhereCondition>,
}

impl DeleteBuilder {
    /// Create a new DELETE builder for the given table
    pub fn new(table: &str) -> Self {
        Self {
            table_name: table.to_string(),
            where_conditions: Vec::new(),
        }
    }

    /// Add a WHERE condition
    pub fn where_<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector: WhereConnector::And,
        });
        self
    }

    /// Add an OR WHERE condition
    pub fn or_where<C>(mut self, condition: C) -> Self
    where
        C: IntoCondition,
    {
        let (column, operator, value) = condition.into_condition();
        self.where_conditions.push(WhereCondition {
            column,
            operator,
            value,
            connector: WhereConnector::Or,
        });
        self
    }
}

impl QueryBuilder for DeleteBuilder {
    fn to_sql(&self) -> Result<String> {
        let mut sql = String::new();
        sql.push_str("DELETE FROM ");
        sql.push_str(&self.table_name);
        render_where(&mut sql, &self.where_conditions)?;
        Ok(sql)
    }

    fn parameters(&self) -> Vec<Value> {
        let mut params = Vec::new();
        where_parameters(&self.where_conditions, &mut params);
        params
    }
}
