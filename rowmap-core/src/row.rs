//! Rows and change tracking
//!
//! A [`Row`] holds the values of one table row and remembers which columns
//! were assigned since it was loaded, so INSERT and UPDATE statements only
//! touch changed columns.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::builder::{DeleteBuilder, InsertBuilder, QueryBuilder, SelectBuilder, UpdateBuilder};
use crate::executor::{Executor, RowData};
use crate::schema::TableSchema;
use crate::{Error, Result, Value};

/// A primary or secondary key value
///
/// Integers look up the primary key column, strings the secondary key
/// column.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Primary(i64),
    Secondary(String),
}

impl Key {
    /// The key column this key selects on the given schema
    pub fn column<'s>(&self, schema: &'s TableSchema) -> Result<&'s str> {
        match self {
            Key::Primary(_) => schema
                .primary_key()
                .ok_or_else(|| Error::missing_key(schema.name(), "primary")),
            Key::Secondary(_) => schema
                .secondary_key()
                .ok_or_else(|| Error::missing_key(schema.name(), "secondary")),
        }
    }

    fn value(&self) -> Value {
        match self {
            Key::Primary(id) => Value::I64(*id),
            Key::Secondary(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for Key {
    fn from(id: i64) -> Self {
        Key::Primary(id)
    }
}

impl From<i32> for Key {
    fn from(id: i32) -> Self {
        Key::Primary(i64::from(id))
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Key::Secondary(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Key::Secondary(key)
    }
}

/// One row of a table, with its changed columns tracked
#[derive(Debug, Clone)]
pub struct Row<'s> {
    schema: &'s TableSchema,
    values: BTreeMap<String, Value>,
    changed: BTreeSet<String>,
}

impl<'s> Row<'s> {
    /// Create an empty row of the given schema
    pub fn new(schema: &'s TableSchema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            changed: BTreeSet::new(),
        }
    }

    /// Create a row from name/value pairs. Every assigned column counts
    /// as changed, as if assigned one by one.
    pub fn with_values<I, S, V>(schema: &'s TableSchema, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new(schema);
        for (name, value) in pairs {
            row.set(&name.into(), value)?;
        }
        Ok(row)
    }

    /// Create a row from values fetched from the database. The change set
    /// starts clear; result columns the schema does not declare are
    /// skipped.
    pub fn from_db(schema: &'s TableSchema, values: RowData) -> Self {
        let values = values
            .into_iter()
            .filter(|(name, _)| schema.has_column(name))
            .collect();
        Self {
            schema,
            values,
            changed: BTreeSet::new(),
        }
    }

    pub fn schema(&self) -> &'s TableSchema {
        self.schema
    }

    /// Get a column value, if set
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a column value and mark the column changed
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if !self.schema.has_column(name) {
            return Err(Error::column_not_found(self.schema.name(), name));
        }
        self.values.insert(name.to_string(), value.into());
        self.changed.insert(name.to_string());
        Ok(())
    }

    /// True if any column has been assigned since the row was loaded
    pub fn is_dirty(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Names of the changed columns, in name order
    pub fn changed_columns(&self) -> impl Iterator<Item = &str> {
        self.changed.iter().map(String::as_str)
    }

    /// Clear the change set without touching any values
    pub fn mark_clean(&mut self) {
        self.changed.clear();
    }

    /// The set columns as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// The primary key value, if the column is set and non-NULL
    fn primary_key_value(&self) -> Option<&Value> {
        let pk = self.schema.primary_key()?;
        match self.values.get(pk) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    fn changed_values(&self) -> Vec<(String, Value)> {
        self.changed
            .iter()
            .filter_map(|name| {
                self.values
                    .get(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect()
    }

    /// The INSERT statement for this row: changed columns only, primary
    /// key excluded (serial assignment is the database's job)
    pub fn insert_stmt(&self) -> Result<(String, Vec<Value>)> {
        let pk = self.schema.primary_key();
        let pairs: Vec<(String, Value)> = self
            .changed_values()
            .into_iter()
            .filter(|(name, _)| Some(name.as_str()) != pk)
            .collect();

        let builder = InsertBuilder::new(self.schema.name()).values(pairs);
        Ok((builder.to_sql()?, builder.parameters()))
    }

    /// The UPDATE statement for this row: changed columns only, keyed on
    /// `key_name` (the primary key when not given). The key column must
    /// hold a value and is excluded from the SET clause.
    pub fn update_stmt(&self, key_name: Option<&str>) -> Result<(String, Vec<Value>)> {
        let key_name = match key_name {
            Some(name) => name,
            None => self
                .schema
                .primary_key()
                .ok_or_else(|| Error::missing_key(self.schema.name(), "primary"))?,
        };
        let key_value = self
            .values
            .get(key_name)
            .ok_or_else(|| {
                Error::invalid_query(format!(
                    "UPDATE requires a value for key column '{}'",
                    key_name
                ))
            })?
            .clone();

        let pairs: Vec<(String, Value)> = self
            .changed_values()
            .into_iter()
            .filter(|(name, _)| name != key_name)
            .collect();

        let builder = UpdateBuilder::new(self.schema.name())
            .set_values(pairs)
            .where_((key_name, key_value));
        Ok((builder.to_sql()?, builder.parameters()))
    }

    /// The DELETE statement for this row, keyed on the primary key
    pub fn delete_stmt(&self) -> Result<(String, Vec<Value>)> {
        let pk = self
            .schema
            .primary_key()
            .ok_or_else(|| Error::missing_key(self.schema.name(), "primary"))?;
        let key_value = self
            .values
            .get(pk)
            .ok_or_else(|| {
                Error::invalid_query(format!(
                    "DELETE requires a value for key column '{}'",
                    pk
                ))
            })?
            .clone();

        let builder = DeleteBuilder::new(self.schema.name()).where_((pk, key_value));
        Ok((builder.to_sql()?, builder.parameters()))
    }

    /// Insert this row as a new database row
    pub async fn insert<E: Executor>(&self, executor: &E) -> Result<u64> {
        let (sql, params) = self.insert_stmt()?;
        executor.execute(&sql, &params).await
    }

    /// Update this row in the database (changed columns only)
    pub async fn update<E: Executor>(&self, key_name: Option<&str>, executor: &E) -> Result<u64> {
        let (sql, params) = self.update_stmt(key_name)?;
        executor.execute(&sql, &params).await
    }

    /// Save this row: update if the primary key holds a value, insert a
    /// new row otherwise. The change set is not cleared by saving.
    pub async fn save<E: Executor>(&self, executor: &E) -> Result<u64> {
        if self.primary_key_value().is_some() {
            self.update(None, executor).await
        } else {
            self.insert(executor).await
        }
    }

    /// Delete this row from the database by primary key
    pub async fn delete<E: Executor>(&self, executor: &E) -> Result<u64> {
        let (sql, params) = self.delete_stmt()?;
        executor.execute(&sql, &params).await
    }
}

/// Renders the set columns in name order, e.g.
/// `users(hash='asdf', id=5, username='bob')`
impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .values
            .iter()
            .map(|(name, value)| format!("{}={}", name, value.to_sql_literal()))
            .collect();
        write!(f, "{}({})", self.schema.name(), args.join(", "))
    }
}

impl TableSchema {
    /// The SELECT statement that looks up a row by key
    pub fn lookup_stmt(&self, key: &Key) -> Result<(String, Vec<Value>)> {
        let column = key.column(self)?;
        let builder = SelectBuilder::for_schema(self).where_((column, key.value()));
        Ok((builder.to_sql()?, builder.parameters()))
    }

    /// Load a single row by primary or secondary key. It is an error if
    /// the query does not match exactly one row.
    pub async fn load<E: Executor>(&self, key: impl Into<Key>, executor: &E) -> Result<Row<'_>> {
        let key = key.into();
        let (sql, params) = self.lookup_stmt(&key)?;
        let mut rows = executor.fetch_all(&sql, &params).await?;
        if rows.len() != 1 {
            let column = key.column(self)?;
            return Err(Error::key_lookup(
                self.name(),
                column,
                key.value().to_sql_literal(),
            ));
        }
        Ok(Row::from_db(self, rows.remove(0)))
    }

    /// Get a single row by key, returning `None` where [`load`] would
    /// fail on the row count
    ///
    /// [`load`]: TableSchema::load
    pub async fn get<E: Executor>(
        &self,
        key: impl Into<Key>,
        executor: &E,
    ) -> Result<Option<Row<'_>>> {
        match self.load(key, executor).await {
            Ok(row) => Ok(Some(row)),
            Err(Error::KeyLookup { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Start a SELECT over this table. Fetch the rows with
    /// [`SelectExt::fetch`].
    pub fn select(&self) -> SelectBuilder<'_> {
        SelectBuilder::for_schema(self)
    }
}

/// Fetching rows from a schema-bound SELECT
pub trait SelectExt<'s> {
    /// Execute the query and map the results to rows with a clean change
    /// set
    fn fetch<E: Executor>(
        self,
        executor: &E,
    ) -> impl std::future::Future<Output = Result<Vec<Row<'s>>>> + Send;
}

impl<'s> SelectExt<'s> for SelectBuilder<'s> {
    async fn fetch<E: Executor>(self, executor: &E) -> Result<Vec<Row<'s>>> {
        let schema = self
            .schema()
            .ok_or_else(|| Error::invalid_query("fetch requires a schema-bound SELECT"))?;
        let sql = self.to_sql()?;
        let params = self.parameters();
        let rows = executor.fetch_all(&sql, &params).await?;
        Ok(rows
            .into_iter()
            .map(|values| Row::from_db(schema, values))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::op;
    use crate::schema::Column;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn users() -> TableSchema {
        TableSchema::new("users")
            .column("id", Column::serial().primary_key())
            .column("username", Column::text().secondary_key())
            .column("hash", Column::text())
            .column(
                "time",
                Column::timestamp().default_value("now()").not_null(),
            )
    }

    /// Records executed SQL and replays canned fetch results
    struct MockExecutor {
        executed: Mutex<Vec<(String, Vec<Value>)>>,
        results: Mutex<VecDeque<Vec<RowData>>>,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self {
                executed: Mutex::new(Vec::new()),
                results: Mutex::new(VecDeque::new()),
            }
        }

        fn with_results(results: Vec<Vec<RowData>>) -> Self {
            let mock = Self::new();
            *mock.results.lock().unwrap() = results.into();
            mock
        }

        fn executed_sql(&self) -> Vec<String> {
            self.executed
                .lock()
                .unwrap()
                .iter()
                .map(|(sql, _)| sql.clone())
                .collect()
        }
    }

    impl Executor for MockExecutor {
        async fn execute(&self, sql: &str, params: &[Value]) -> crate::Result<u64> {
            self.executed
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(1)
        }

        async fn fetch_all(&self, sql: &str, params: &[Value]) -> crate::Result<Vec<RowData>> {
            self.executed
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            Ok(self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }
    }

    fn row_data(pairs: &[(&str, Value)]) -> RowData {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_dirty_tracking() {
        let schema = users();
        let mut row = Row::new(&schema);
        assert!(!row.is_dirty());

        row.set("username", "bob").unwrap();
        row.set("hash", "1234").unwrap();
        assert!(row.is_dirty());
        assert_eq!(
            row.changed_columns().collect::<Vec<_>>(),
            vec!["hash", "username"]
        );
        assert_eq!(row.get("username"), Some(&Value::from("bob")));

        row.mark_clean();
        assert!(!row.is_dirty());
        assert_eq!(row.get("username"), Some(&Value::from("bob")));
    }

    #[test]
    fn test_set_unknown_column_fails() {
        let schema = users();
        let mut row = Row::new(&schema);
        let err = row.set("nickname", "bob").unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }

    #[test]
    fn test_from_db_is_clean_and_skips_unknown() {
        let schema = users();
        let row = Row::from_db(
            &schema,
            row_data(&[
                ("id", Value::I32(5)),
                ("username", Value::from("bob")),
                ("extraneous", Value::from("x")),
            ]),
        );
        assert!(!row.is_dirty());
        assert_eq!(row.get("id"), Some(&Value::I32(5)));
        assert!(row.get("extraneous").is_none());
    }

    #[test]
    fn test_insert_stmt_excludes_primary_key() {
        let schema = users();
        let row = Row::with_values(
            &schema,
            vec![
                ("id", Value::I32(5)),
                ("username", Value::from("bob")),
                ("hash", Value::from("1234")),
            ],
        )
        .unwrap();

        let (sql, params) = row.insert_stmt().unwrap();
        assert_eq!(sql, "INSERT INTO users (hash, username) VALUES (?, ?)");
        assert_eq!(
            params,
            vec![Value::from("1234"), Value::from("bob")]
        );
    }

    #[test]
    fn test_insert_stmt_with_nothing_to_insert_fails() {
        let schema = users();
        let row = Row::new(&schema);
        assert!(row.insert_stmt().is_err());
    }

    #[test]
    fn test_update_stmt_only_changed_fields() {
        let schema = users();
        let mut row = Row::from_db(&schema, row_data(&[("id", Value::I32(5))]));
        row.set("username", "bill").unwrap();

        let (sql, params) = row.update_stmt(None).unwrap();
        assert_eq!(sql, "UPDATE users SET username = ? WHERE id = ?");
        assert_eq!(params, vec![Value::from("bill"), Value::I32(5)]);
    }

    #[test]
    fn test_update_stmt_excludes_key_from_set() {
        let schema = users();
        let row = Row::with_values(
            &schema,
            vec![("id", Value::I32(5)), ("username", Value::from("bill"))],
        )
        .unwrap();

        let (sql, _) = row.update_stmt(None).unwrap();
        assert_eq!(sql, "UPDATE users SET username = ? WHERE id = ?");
    }

    #[test]
    fn test_update_stmt_with_secondary_key() {
        let schema = users();
        let mut row = Row::from_db(
            &schema,
            row_data(&[("username", Value::from("bob"))]),
        );
        row.set("hash", "qwer").unwrap();

        let (sql, params) = row.update_stmt(Some("username")).unwrap();
        assert_eq!(sql, "UPDATE users SET hash = ? WHERE username = ?");
        assert_eq!(params, vec![Value::from("qwer"), Value::from("bob")]);
    }

    #[test]
    fn test_update_stmt_without_key_value_fails() {
        let schema = users();
        let mut row = Row::new(&schema);
        row.set("username", "bill").unwrap();
        assert!(row.update_stmt(None).is_err());
    }

    #[test]
    fn test_delete_stmt() {
        let schema = users();
        let row = Row::with_values(&schema, vec![("id", Value::I32(5))]).unwrap();
        let (sql, params) = row.delete_stmt().unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE id = ?");
        assert_eq!(params, vec![Value::I32(5)]);
    }

    #[test]
    fn test_display() {
        let schema = users();
        let row = Row::with_values(
            &schema,
            vec![
                ("id", Value::I32(5)),
                ("username", Value::from("bob")),
                ("hash", Value::from("asdf")),
            ],
        )
        .unwrap();
        assert_eq!(
            row.to_string(),
            "users(hash='asdf', id=5, username='bob')"
        );

        let empty = Row::new(&schema);
        assert_eq!(empty.to_string(), "users()");
    }

    #[test]
    fn test_to_json() {
        let schema = users();
        let row = Row::with_values(
            &schema,
            vec![("id", Value::I32(5)), ("username", Value::from("bob"))],
        )
        .unwrap();
        assert_eq!(
            row.to_json(),
            serde_json::json!({"id": 5, "username": "bob"})
        );
    }

    #[test]
    fn test_lookup_stmt() {
        let schema = users();
        let (sql, params) = schema.lookup_stmt(&Key::from(5i64)).unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id = ?");
        assert_eq!(params, vec![Value::I64(5)]);

        let (sql, params) = schema.lookup_stmt(&Key::from("bob")).unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE username = ?");
        assert_eq!(params, vec![Value::from("bob")]);
    }

    #[test]
    fn test_lookup_without_key_column_fails() {
        let schema = TableSchema::new("logs").column("message", Column::text());
        let err = schema.lookup_stmt(&Key::from(5i64)).unwrap_err();
        assert!(matches!(err, Error::MissingKey { .. }));
    }

    #[tokio::test]
    async fn test_load_by_primary_key() {
        let schema = users();
        let executor = MockExecutor::with_results(vec![vec![row_data(&[
            ("id", Value::I32(5)),
            ("username", Value::from("bob")),
        ])]]);

        let row = schema.load(5i64, &executor).await.unwrap();
        assert!(!row.is_dirty());
        assert_eq!(row.get("username"), Some(&Value::from("bob")));
        assert_eq!(
            executor.executed_sql(),
            vec!["SELECT * FROM users WHERE id = ?"]
        );
    }

    #[tokio::test]
    async fn test_load_no_match_fails() {
        let schema = users();
        let executor = MockExecutor::with_results(vec![vec![]]);

        let err = schema.load("baduser", &executor).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "no users (or more than one) with username of 'baduser'"
        );
    }

    #[tokio::test]
    async fn test_load_multiple_matches_fails() {
        let schema = users();
        let executor = MockExecutor::with_results(vec![vec![
            row_data(&[("id", Value::I32(1))]),
            row_data(&[("id", Value::I32(2))]),
        ]]);

        let result = schema.load("bob", &executor).await;
        assert!(matches!(result, Err(Error::KeyLookup { .. })));
    }

    #[tokio::test]
    async fn test_get_returns_none_on_no_match() {
        let schema = users();
        let executor = MockExecutor::with_results(vec![vec![]]);
        let row = schema.get("baduser", &executor).await.unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_select_fetch() {
        let schema = users();
        let executor = MockExecutor::with_results(vec![vec![
            row_data(&[("username", Value::from("john"))]),
            row_data(&[("username", Value::from("jo"))]),
        ]]);

        let rows = schema
            .select()
            .where_(("username", op::LIKE, "jo%"))
            .order_by_asc("username")
            .limit(5)
            .fetch(&executor)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| !row.is_dirty()));
        assert_eq!(
            executor.executed_sql(),
            vec!["SELECT * FROM users WHERE username LIKE ? ORDER BY username ASC LIMIT 5"]
        );
    }

    #[tokio::test]
    async fn test_save_inserts_without_primary_key() {
        let schema = users();
        let executor = MockExecutor::new();
        let row = Row::with_values(
            &schema,
            vec![("username", Value::from("bob")), ("hash", Value::from("asdf"))],
        )
        .unwrap();

        row.save(&executor).await.unwrap();
        assert_eq!(
            executor.executed_sql(),
            vec!["INSERT INTO users (hash, username) VALUES (?, ?)"]
        );
    }

    #[tokio::test]
    async fn test_save_updates_with_primary_key() {
        let schema = users();
        let executor = MockExecutor::new();
        let mut row = Row::from_db(&schema, row_data(&[("id", Value::I32(5))]));
        row.set("username", "bill").unwrap();

        row.save(&executor).await.unwrap();
        assert_eq!(
            executor.executed_sql(),
            vec!["UPDATE users SET username = ? WHERE id = ?"]
        );
    }

    #[tokio::test]
    async fn test_save_with_null_primary_key_inserts() {
        let schema = users();
        let executor = MockExecutor::new();
        let row = Row::with_values(
            &schema,
            vec![("id", Value::Null), ("username", Value::from("bob"))],
        )
        .unwrap();

        row.save(&executor).await.unwrap();
        let sql = executor.executed_sql();
        assert!(sql[0].starts_with("INSERT INTO users"));
    }

    #[tokio::test]
    async fn test_schema_create_executes_statements() {
        let schema = users();
        let executor = MockExecutor::new();
        schema.create(&executor).await.unwrap();

        let sql = executor.executed_sql();
        assert_eq!(sql.len(), 2);
        assert!(sql[0].starts_with("CREATE TABLE users ("));
        assert_eq!(
            sql[1],
            "CREATE INDEX users_username_idx ON users (username)"
        );
    }

    #[tokio::test]
    async fn test_schema_add_column_executes_statements() {
        let schema = users();
        let executor = MockExecutor::new();
        schema.add_column("hash", &executor).await.unwrap();
        assert_eq!(
            executor.executed_sql(),
            vec!["ALTER TABLE users ADD COLUMN hash TEXT"]
        );
    }
}
