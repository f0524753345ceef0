//! Rowmap Core - a minimal row/object mapping layer
//!
//! Rowmap maps declaratively-defined table schemas to rows fetched from,
//! and written to, a relational database. Schemas are built from
//! [`Column`] descriptors; a [`Row`] tracks which columns changed so that
//! INSERT and UPDATE statements only touch changed values. The database
//! driver stays behind the [`Executor`] seam.
//!
//! ```
//! use rowmap_core::{Column, Row, TableSchema, Value};
//!
//! let users = TableSchema::new("users")
//!     .column("id", Column::serial().primary_key())
//!     .column("username", Column::text().secondary_key())
//!     .column("hash", Column::text());
//!
//! let mut row = Row::new(&users);
//! row.set("username", "bob").unwrap();
//! row.set("hash", "1234").unwrap();
//!
//! let (sql, params) = row.insert_stmt().unwrap();
//! assert_eq!(sql, "INSERT INTO users (hash, username) VALUES (?, ?)");
//! assert_eq!(params, vec![Value::from("1234"), Value::from("bob")]);
//! ```

pub mod builder;
pub mod error;
pub mod executor;
pub mod operator;
pub mod row;
pub mod schema;
pub mod value;

// Re-export main types
pub use builder::{
    DeleteBuilder, InsertBuilder, IntoCondition, QueryBuilder, SelectBuilder, SortDirection,
    UpdateBuilder, WhereCondition, WhereConnector,
};
pub use error::{Error, Result};
pub use executor::{Executor, RowData};
pub use operator::{op, IntoOperator, Operator};
pub use row::{Key, Row, SelectExt};
pub use schema::{Column, ColumnType, Indexing, TableSchema};
pub use value::Value;

#[cfg(feature = "postgres")]
pub use executor::postgres::PostgresPool;

/// Create a new SELECT builder for the given table
pub fn select(table: &str) -> SelectBuilder<'static> {
    SelectBuilder::new(table)
}

/// Create a new INSERT builder for the given table
pub fn insert_into(table: &str) -> InsertBuilder {
    InsertBuilder::new(table)
}

/// Create a new UPDATE builder for the given table
pub fn update(table: &str) -> UpdateBuilder {
    UpdateBuilder::new(table)
}

/// Create a new DELETE builder for the given table
pub fn delete_from(table: &str) -> DeleteBuilder {
    DeleteBuilder::new(table)
}
