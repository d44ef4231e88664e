//! Cell value representation.
//!
//! This module provides the value model shared by schemas, rows, and checks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell value in a tabular data source.
///
/// Raw cells produced by a row-stream source and cast cells produced by
/// field casting share this representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Null/missing value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Number(f64),
    /// String value
    String(String),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp with timezone
    Datetime(DateTime<Utc>),
}

impl CellValue {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Boolean(_) => "boolean",
            CellValue::Integer(_) => "integer",
            CellValue::Number(_) => "number",
            CellValue::String(_) => "string",
            CellValue::Date(_) => "date",
            CellValue::Datetime(_) => "datetime",
        }
    }

    /// Attempts to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float, widening integers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(f) => Some(*f),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    /// Stable textual form used for error messages and row hashing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Datetime(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(CellValue::Null.type_name(), "null");
        assert_eq!(CellValue::String("test".into()).type_name(), "string");
        assert_eq!(CellValue::Integer(42).type_name(), "integer");
        assert_eq!(CellValue::Number(3.5).type_name(), "number");
        assert_eq!(CellValue::Boolean(true).type_name(), "boolean");
    }

    #[test]
    fn test_conversions() {
        let val = CellValue::String("hello".into());
        assert_eq!(val.as_str(), Some("hello"));
        assert_eq!(val.as_integer(), None);

        let val = CellValue::Integer(42);
        assert_eq!(val.as_integer(), Some(42));
        assert_eq!(val.as_number(), Some(42.0));
        assert_eq!(val.as_str(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Integer(7).to_string(), "7");
        assert_eq!(CellValue::Boolean(false).to_string(), "false");
        assert_eq!(CellValue::String("中国人".into()).to_string(), "中国人");
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2024-01-15");
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(CellValue::from("a"), CellValue::String("a".into()));
        assert_eq!(CellValue::from(1i64), CellValue::Integer(1));
        assert_eq!(CellValue::from(true), CellValue::Boolean(true));
    }
}
