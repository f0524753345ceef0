//! Query execution seam
//!
//! The database driver is an external collaborator: the row and schema
//! layers only ever see the [`Executor`] trait. A Postgres implementation
//! over sqlx lives behind the `postgres` feature.

use std::collections::BTreeMap;
use std::future::Future;

use crate::{Result, Value};

/// One fetched row: column name to value, in column-name order
pub type RowData = BTreeMap<String, Value>;

/// Trait for query execution against a database
pub trait Executor: Send + Sync {
    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE,
    /// DDL) and report the number of affected rows
    fn execute(&self, sql: &str, params: &[Value])
        -> impl Future<Output = Result<u64>> + Send;

    /// Execute a query and return all resulting rows
    fn fetch_all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Vec<RowData>>> + Send;
}

/// Rewrite `?` placeholders to numbered `$1, $2, ...` placeholders.
///
/// The builders emit dialect-neutral `?`; drivers with numbered
/// placeholders (PostgreSQL) rewrite before binding. Generated SQL never
/// contains string literals, so every `?` is a placeholder.
pub fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut n = 0;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push_str(&format!("${}", n));
        } else {
            out.push(ch);
        }
    }
    out
}

/// SQLx-backed PostgreSQL executor
#[cfg(feature = "postgres")]
pub mod postgres {
    use super::*;
    use crate::Error;
    use sqlx::postgres::{PgArguments, PgRow};
    use sqlx::{Column as _, PgPool, Row as _, TypeInfo as _};

    /// PostgreSQL connection pool wrapper
    #[derive(Clone)]
    pub struct PostgresPool {
        inner: PgPool,
    }

    impl PostgresPool {
        /// Create a new PostgreSQL pool from a connection string
        pub async fn new(database_url: &str) -> Result<Self> {
            let pool = PgPool::connect(database_url).await?;
            Ok(Self { inner: pool })
        }

        /// Create from an existing PgPool
        pub fn from_pool(pool: PgPool) -> Self {
            Self { inner: pool }
        }
    }

    impl Executor for PostgresPool {
        async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
            let sql = number_placeholders(sql);
            tracing::debug!(sql = %sql, params = params.len(), "executing statement");
            let query = bind_values(sqlx::query(&sql), params)?;
            let result = query.execute(&self.inner).await?;
            Ok(result.rows_affected())
        }

        async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<RowData>> {
            let sql = number_placeholders(sql);
            tracing::debug!(sql = %sql, params = params.len(), "fetching rows");
            let query = bind_values(sqlx::query(&sql), params)?;
            let rows = query.fetch_all(&self.inner).await?;

            let mut results = Vec::with_capacity(rows.len());
            for row in rows {
                results.push(decode_row(&row)?);
            }
            Ok(results)
        }
    }

    /// Bind parameter values to a sqlx query
    ///
    /// Value lists are expanded to one placeholder per element before
    /// binding, so a leftover array here is a builder bug.
    fn bind_values<'q>(
        mut query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        params: &'q [Value],
    ) -> Result<sqlx::query::Query<'q, sqlx::Postgres, PgArguments>> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i32>),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(*f),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.as_str()),
                Value::Bytes(b) => query.bind(b.as_slice()),
                Value::Array(_) => {
                    return Err(Error::sql_generation(
                        "array parameter reached the driver; value lists must expand to one placeholder per element",
                    ));
                }
            };
        }
        Ok(query)
    }

    /// Decode a fetched row to column name/value pairs, driven by the
    /// Postgres type of each result column
    fn decode_row(row: &PgRow) -> Result<RowData> {
        let mut values = RowData::new();
        for (index, column) in row.columns().iter().enumerate() {
            let name = column.name().to_string();
            let value = decode_column(row, index, column.type_info().name())
                .map_err(|e| Error::decode(&name, e.to_string()))?;
            values.insert(name, value);
        }
        Ok(values)
    }

    fn decode_column(
        row: &PgRow,
        index: usize,
        type_name: &str,
    ) -> std::result::Result<Value, sqlx::Error> {
        let value = match type_name {
            "BOOL" => row
                .try_get::<Option<bool>, _>(index)?
                .map_or(Value::Null, Value::Bool),
            "INT2" | "INT4" => row
                .try_get::<Option<i32>, _>(index)?
                .map_or(Value::Null, Value::I32),
            "INT8" => row
                .try_get::<Option<i64>, _>(index)?
                .map_or(Value::Null, Value::I64),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(index)?
                .map_or(Value::Null, Value::F32),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(index)?
                .map_or(Value::Null, Value::F64),
            "BYTEA" => row
                .try_get::<Option<Vec<u8>>, _>(index)?
                .map_or(Value::Null, Value::Bytes),
            #[cfg(feature = "datetime-support")]
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(index)?
                .map_or(Value::Null, |d| Value::String(d.to_string())),
            #[cfg(feature = "datetime-support")]
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
                .map_or(Value::Null, |t| Value::String(t.to_string())),
            // TEXT, VARCHAR, INET and anything else textual
            _ => row
                .try_get::<Option<String>, _>(index)?
                .map_or(Value::Null, Value::String),
        };
        Ok(value)
    }

}
