//! SQL operator types and conversions

use std::fmt::{self, Display};

/// Type-safe SQL comparison operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator(&'static str);

impl Operator {
    pub const GT: Self = Operator(">");
    pub const LT: Self = Operator("<");
    pub const EQ: Self = Operator("=");
    pub const NEQ: Self = Operator("!=");
    pub const GTE: Self = Operator(">=");
    pub const LTE: Self = Operator("<=");
    pub const LIKE: Self = Operator("LIKE");
    pub const IN: Self = Operator("IN");
    pub const NOT_IN: Self = Operator("NOT IN");
    pub const IS_NULL: Self = Operator("IS NULL");
    pub const IS_NOT_NULL: Self = Operator("IS NOT NULL");

    /// Create a custom operator for database-specific operations
    ///
    /// # Examples
    /// ```
    /// use rowmap_core::Operator;
    ///
    /// // PostgreSQL case-insensitive LIKE
    /// let ilike = Operator::custom("ILIKE");
    /// ```
    pub const fn custom(op: &'static str) -> Self {
        Operator(op)
    }

    /// Get the string representation of the operator
    pub fn as_str(&self) -> &str {
        self.0
    }

    /// True for operators that take no right-hand value (IS NULL family)
    pub fn is_unary(&self) -> bool {
        matches!(self.0, "IS NULL" | "IS NOT NULL")
    }

    /// True for operators whose right-hand side is a parenthesised value
    /// list (IN family)
    pub fn is_list(&self) -> bool {
        matches!(self.0, "IN" | "NOT IN")
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for types that can be converted to SQL operators
pub trait IntoOperator {
    fn into_operator(self) -> Operator;
}

impl IntoOperator for Operator {
    fn into_operator(self) -> Operator {
        self
    }
}

/// Allow string literals for common SQL operators with validation
impl IntoOperator for &str {
    fn into_operator(self) -> Operator {
        match self {
            ">" => Operator::GT,
            "<" => Operator::LT,
            "=" => Operator::EQ,
            "!=" => Operator::NEQ,
            ">=" => Operator::GTE,
            "<=" => Operator::LTE,
            "LIKE" | "like" => Operator::LIKE,
            "IN" | "in" => Operator::IN,
            "NOT IN" | "not in" => Operator::NOT_IN,
            "IS NULL" | "is null" => Operator::IS_NULL,
            "IS NOT NULL" | "is not null" => Operator::IS_NOT_NULL,
            _ => panic!(
                "Unknown operator '{}'. Use Operator constants or Operator::custom(\"{}\") for custom operators.",
                self, self
            ),
        }
    }
}

/// Convenience module for operator constants
pub mod op {
    use super::Operator;

    pub const GT: Operator = Operator::GT;
    pub const LT: Operator = Operator::LT;
    pub const EQ: Operator = Operator::EQ;
    pub const NEQ: Operator = Operator::NEQ;
    pub const GTE: Operator = Operator::GTE;
    pub const LTE: Operator = Operator::LTE;
    pub const LIKE: Operator = Operator::LIKE;
    pub const IN: Operator = Operator::IN;
    pub const NOT_IN: Operator = Operator::NOT_IN;
    pub const IS_NULL: Operator = Operator::IS_NULL;
    pub const IS_NOT_NULL: Operator = Operator::IS_NOT_NULL;
}
