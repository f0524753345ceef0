//! Error types for Rowmap

use thiserror::Error;

/// The main error type for Rowmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// SQL generation error
    #[error("SQL generation error: {message}")]
    SqlGeneration { message: String },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Column not found error
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Table has no key column of the required kind
    #[error("Table '{table}' has no {kind} key column")]
    MissingKey { table: String, kind: &'static str },

    /// Key lookup did not match exactly one row
    #[error("no {table} (or more than one) with {column} of {key}")]
    KeyLookup {
        table: String,
        column: String,
        key: String,
    },

    /// Failed to decode a database value
    #[error("Decode error for column '{column}': {message}")]
    Decode { column: String, message: String },
}

/// Convenience Result type for Rowmap operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new SQL generation error
    pub fn sql_generation(message: impl Into<String>) -> Self {
        Self::SqlGeneration {
            message: message.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new column not found error
    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a new missing key error
    pub fn missing_key(table: impl Into<String>, kind: &'static str) -> Self {
        Self::MissingKey {
            table: table.into(),
            kind,
        }
    }

    /// Create a new key lookup error
    pub fn key_lookup(
        table: impl Into<String>,
        column: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::KeyLookup {
            table: table.into(),
            column: column.into(),
            key: key.into(),
        }
    }

    /// Create a new decode error
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::sql_generation("Invalid CREATE TABLE");
        assert!(matches!(err, Error::SqlGeneration { .. }));
        assert_eq!(
            err.to_string(),
            "SQL generation error: Invalid CREATE TABLE"
        );
    }

    #[test]
    fn test_invalid_query_error() {
        let err = Error::invalid_query("UPDATE requires SET clauses");
        assert!(matches!(err, Error::InvalidQuery { .. }));
        assert_eq!(err.to_string(), "Invalid query: UPDATE requires SET clauses");
    }

    #[test]
    fn test_column_not_found_error() {
        let err = Error::column_not_found("users", "nickname");
        assert!(matches!(err, Error::ColumnNotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Column 'nickname' not found in table 'users'"
        );
    }

    #[test]
    fn test_key_lookup_error() {
        let err = Error::key_lookup("users", "username", "'baduser'");
        assert!(matches!(err, Error::KeyLookup { .. }));
        assert_eq!(
            err.to_string(),
            "no users (or more than one) with username of 'baduser'"
        );
    }

    #[test]
    fn test_missing_key_error() {
        let err = Error::missing_key("logs", "primary");
        assert_eq!(err.to_string(), "Table 'logs' has no primary key column");
    }
}
