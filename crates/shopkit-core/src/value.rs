//! # Value Module
//!
//! Typed parameter values carried alongside compiled SQL.
//!
//! ## Why a Value Enum?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Compiled statements are (sql, params) pairs                            │
//! │                                                                         │
//! │  SELECT ... WHERE pri."value" > ?  ──►  params: [Int(500)]              │
//! │                                                                         │
//! │  The compiler never interpolates values into SQL text. Every value     │
//! │  travels as a typed parameter and is bound by the execution layer.     │
//! │  This is what makes the generated SQL injection-safe.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Semantic Type
// =============================================================================

/// The domain-level type of a search attribute.
///
/// Mirrors the semantic types published in entity attribute catalogs so
/// callers know what kind of value a key accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Integer columns (ids, positions, status flags).
    Int,

    /// Text columns (codes, labels, domains).
    Str,

    /// Date/time columns (ctime, mtime, start/end dates).
    DateTime,

    /// Boolean columns.
    Bool,

    /// Decimal columns (prices, tax rates).
    Float,
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Int => write!(f, "integer"),
            SemanticType::Str => write!(f, "string"),
            SemanticType::DateTime => write!(f, "datetime"),
            SemanticType::Bool => write!(f, "boolean"),
            SemanticType::Float => write!(f, "float"),
        }
    }
}

// =============================================================================
// Value
// =============================================================================

/// A typed parameter value.
///
/// ## Design Decisions
/// - **No raw SQL variant**: values can never smuggle SQL text into a
///   statement
/// - **List**: only valid as input to IN/NOT IN comparisons; the compiler
///   expands it into one `?` marker per element before execution
/// - **Serde derives**: values round-trip through config and transport the
///   same way the rest of the workspace serializes data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),

    /// 64-bit float.
    Float(f64),

    /// UTF-8 string.
    Str(String),

    /// Boolean.
    Bool(bool),

    /// UTC timestamp.
    DateTime(DateTime<Utc>),

    /// Ordered list of values (IN / NOT IN operands only).
    List(Vec<Value>),

    /// SQL NULL.
    Null,
}

impl Value {
    /// Returns true if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(5i64), Value::Int(5));
        assert_eq!(Value::from("abc"), Value::Str("abc".to_string()));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(
            Value::from(vec![1i64, 2, 3]),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }

    #[test]
    fn test_semantic_type_display() {
        assert_eq!(SemanticType::Int.to_string(), "integer");
        assert_eq!(SemanticType::DateTime.to_string(), "datetime");
    }
}
