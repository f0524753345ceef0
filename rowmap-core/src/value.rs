//! Value types for SQL parameters

use serde::{Deserialize, Serialize};

/// A SQL value that can be used as a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// Array of values (used for IN lists)
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BYTEA",
            Value::Array(_) => "ARRAY",
        }
    }

    /// Extract array values if this is an Array variant
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Render this value as an SQL literal.
    ///
    /// Strings are single-quoted with embedded quotes doubled, bytes render
    /// as a hex bytea literal, arrays as a parenthesised list. Used for
    /// inline/dry-run SQL display, not for execution; executed statements
    /// bind parameters instead.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::I32(i) => i.to_string(),
            Value::I64(i) => i.to_string(),
            Value::F32(f) => f.to_string(),
            Value::F64(f) => f.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{:02x}", byte)).collect();
                format!("'\\x{}'", hex)
            }
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(Value::to_sql_literal).collect();
                format!("({})", items.join(", "))
            }
        }
    }

    /// Convert this value to a serde_json::Value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I32(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            Value::I64(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            Value::F32(f) => serde_json::Number::from_f64(f64::from(*f))
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::Array(
                b.iter()
                    .map(|byte| serde_json::Value::Number(serde_json::Number::from(*byte)))
                    .collect(),
            ),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Value::to_json).collect())
            }
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(vals: Vec<T>) -> Self {
        Value::Array(vals.into_iter().map(|v| v.into()).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_array_conversion() {
        let arr = vec![1, 2, 3];
        let value = Value::from(arr);
        assert_eq!(
            value,
            Value::Array(vec![Value::I32(1), Value::I32(2), Value::I32(3)])
        );
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::I32(42).is_null());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::I32(42).type_name(), "INTEGER");
        assert_eq!(Value::String("test".to_string()).type_name(), "TEXT");
        assert_eq!(Value::Bool(true).type_name(), "BOOLEAN");
        assert_eq!(Value::Null.type_name(), "NULL");
    }

    #[test]
    fn test_sql_literals() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Bool(true).to_sql_literal(), "TRUE");
        assert_eq!(Value::I64(5).to_sql_literal(), "5");
        assert_eq!(Value::from("bob").to_sql_literal(), "'bob'");
        assert_eq!(Value::from("o'brien").to_sql_literal(), "'o''brien'");
        assert_eq!(
            Value::Bytes(vec![0xde, 0xad]).to_sql_literal(),
            "'\\xdead'"
        );
        assert_eq!(
            Value::from(vec![1, 2, 3]).to_sql_literal(),
            "(1, 2, 3)"
        );
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Null.to_json(), serde_json::Value::Null);
        assert_eq!(Value::I32(5).to_json(), serde_json::json!(5));
        assert_eq!(Value::from("bob").to_json(), serde_json::json!("bob"));
        assert_eq!(
            Value::from(vec![1, 2]).to_json(),
            serde_json::json!([1, 2])
        );
    }
}
