//! Field definitions and the cell casting contract.
//!
//! A field casts raw cells into typed values and reports violations as
//! notes: `read_cell(raw) -> (value, notes)` where notes map a constraint
//! name (or the literal key `"type"`) to a human-readable note. Casting
//! never fails; all violations are notes for the caller to collect.

use crate::value::CellValue;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Notes produced by casting one cell: note key (a constraint name or
/// `"type"`) to a human-readable violation note.
pub type CastNotes = BTreeMap<String, String>;

/// Field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Accepts any value unchanged
    Any,
    /// String value
    String,
    /// Integer value
    Integer,
    /// Floating point value
    Number,
    /// Boolean value
    Boolean,
    /// Calendar date (ISO `YYYY-MM-DD`)
    Date,
    /// Timestamp (RFC 3339 or `YYYY-MM-DD HH:MM:SS`)
    Datetime,
}

impl FieldType {
    /// Returns the type name as used in descriptors and notes.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Datetime => "datetime",
        }
    }

    /// Returns true for integer/number fields.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Number)
    }
}

/// Validation constraints that can be applied to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldConstraint {
    /// Value must be present (a missing cell is a violation)
    Required,

    /// Value must be one of the allowed values
    Enum {
        /// List of valid values, compared by textual form
        values: Vec<String>,
    },

    /// Numeric value must be at least this
    Minimum {
        /// Minimum value (inclusive)
        value: f64,
    },

    /// Numeric value must be at most this
    Maximum {
        /// Maximum value (inclusive)
        value: f64,
    },

    /// String value must have at least this many characters
    MinLength {
        /// Minimum length (inclusive)
        value: usize,
    },

    /// String value must have at most this many characters
    MaxLength {
        /// Maximum length (inclusive)
        value: usize,
    },

    /// String value must match the regex pattern
    Pattern {
        /// Regular expression pattern
        regex: String,
    },
}

fn default_missing_values() -> Vec<String> {
    vec![String::new()]
}

/// A single field definition in a schema.
#[derive(Debug, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,

    /// Field data type
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Raw string values treated as missing (default: the empty string)
    #[serde(rename = "missingValues", default = "default_missing_values")]
    pub missing_values: Vec<String>,

    /// Validation constraints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<FieldConstraint>,

    #[serde(skip)]
    pattern: OnceLock<Option<Regex>>,
}

impl Clone for Field {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            field_type: self.field_type,
            description: self.description.clone(),
            missing_values: self.missing_values.clone(),
            constraints: self.constraints.clone(),
            pattern: OnceLock::new(),
        }
    }
}

impl Field {
    /// Creates a field with the given name and type and no constraints.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            missing_values: default_missing_values(),
            constraints: Vec::new(),
            pattern: OnceLock::new(),
        }
    }

    /// Returns true when the field carries a `required` constraint.
    pub fn is_required(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, FieldConstraint::Required))
    }

    /// Casts a raw cell against this field.
    ///
    /// Returns the cast value plus violation notes. A raw null (or a raw
    /// string listed in `missing_values`) casts to `Null` without a type
    /// note; unparseable input yields a `"type"` note and a `Null` value;
    /// each unmet constraint yields one note under its own name.
    pub fn read_cell(&self, raw: &CellValue) -> (CellValue, CastNotes) {
        let mut notes = CastNotes::new();

        if self.cell_is_missing(raw) {
            if self.is_required() {
                notes.insert(
                    "required".to_string(),
                    "constraint \"required\" is \"true\"".to_string(),
                );
            }
            return (CellValue::Null, notes);
        }

        let value = match self.cast(raw) {
            Some(value) => value,
            None => {
                notes.insert(
                    "type".to_string(),
                    format!("type is \"{}\"", self.field_type.as_str()),
                );
                return (CellValue::Null, notes);
            }
        };

        self.check_constraints(&value, &mut notes);
        (value, notes)
    }

    fn cell_is_missing(&self, raw: &CellValue) -> bool {
        match raw {
            CellValue::Null => true,
            CellValue::String(s) => self.missing_values.iter().any(|m| m == s),
            _ => false,
        }
    }

    fn cast(&self, raw: &CellValue) -> Option<CellValue> {
        match self.field_type {
            FieldType::Any => Some(raw.clone()),
            FieldType::String => match raw {
                CellValue::String(_) => Some(raw.clone()),
                _ => None,
            },
            FieldType::Integer => match raw {
                CellValue::Integer(_) => Some(raw.clone()),
                CellValue::String(s) => s.parse::<i64>().ok().map(CellValue::Integer),
                _ => None,
            },
            FieldType::Number => match raw {
                CellValue::Number(_) => Some(raw.clone()),
                CellValue::Integer(i) => Some(CellValue::Number(*i as f64)),
                CellValue::String(s) => s.parse::<f64>().ok().map(CellValue::Number),
                _ => None,
            },
            FieldType::Boolean => match raw {
                CellValue::Boolean(_) => Some(raw.clone()),
                CellValue::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" => Some(CellValue::Boolean(true)),
                    "false" => Some(CellValue::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Date => match raw {
                CellValue::Date(_) => Some(raw.clone()),
                CellValue::String(s) => chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .map(CellValue::Date),
                _ => None,
            },
            FieldType::Datetime => match raw {
                CellValue::Datetime(_) => Some(raw.clone()),
                CellValue::String(s) => parse_datetime(s).map(CellValue::Datetime),
                _ => None,
            },
        }
    }

    fn check_constraints(&self, value: &CellValue, notes: &mut CastNotes) {
        for constraint in &self.constraints {
            match constraint {
                FieldConstraint::Required => {}
                FieldConstraint::Enum { values } => {
                    let text = value.to_string();
                    if !values.iter().any(|v| v == &text) {
                        notes.insert(
                            "enum".to_string(),
                            format!("constraint \"enum\" is \"{}\"", values.join(", ")),
                        );
                    }
                }
                FieldConstraint::Minimum { value: minimum } => {
                    if let Some(number) = value.as_number() {
                        if number < *minimum {
                            notes.insert(
                                "minimum".to_string(),
                                format!("constraint \"minimum\" is \"{}\"", minimum),
                            );
                        }
                    }
                }
                FieldConstraint::Maximum { value: maximum } => {
                    if let Some(number) = value.as_number() {
                        if number > *maximum {
                            notes.insert(
                                "maximum".to_string(),
                                format!("constraint \"maximum\" is \"{}\"", maximum),
                            );
                        }
                    }
                }
                FieldConstraint::MinLength { value: length } => {
                    if let Some(text) = value.as_str() {
                        if text.chars().count() < *length {
                            notes.insert(
                                "minLength".to_string(),
                                format!("constraint \"minLength\" is \"{}\"", length),
                            );
                        }
                    }
                }
                FieldConstraint::MaxLength { value: length } => {
                    if let Some(text) = value.as_str() {
                        if text.chars().count() > *length {
                            notes.insert(
                                "maxLength".to_string(),
                                format!("constraint \"maxLength\" is \"{}\"", length),
                            );
                        }
                    }
                }
                FieldConstraint::Pattern { regex } => {
                    if let Some(text) = value.as_str() {
                        match self.compiled_pattern(regex) {
                            Some(compiled) if compiled.is_match(text) => {}
                            Some(_) => {
                                notes.insert(
                                    "pattern".to_string(),
                                    format!("constraint \"pattern\" is \"{}\"", regex),
                                );
                            }
                            None => {
                                notes.insert(
                                    "pattern".to_string(),
                                    format!("constraint \"pattern\" is invalid: \"{}\"", regex),
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    fn compiled_pattern(&self, regex: &str) -> Option<&Regex> {
        self.pattern
            .get_or_init(|| Regex::new(regex).ok())
            .as_ref()
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cast_integer_from_string() {
        let field = Field::new("id", FieldType::Integer);
        let (value, notes) = field.read_cell(&CellValue::String("42".into()));
        assert_eq!(value, CellValue::Integer(42));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_cast_type_note() {
        let field = Field::new("id", FieldType::Integer);
        let (value, notes) = field.read_cell(&CellValue::String("abc".into()));
        assert_eq!(value, CellValue::Null);
        assert_eq!(notes.get("type").unwrap(), "type is \"integer\"");
    }

    #[test]
    fn test_missing_value_is_blank_not_error() {
        let field = Field::new("name", FieldType::String);
        let (value, notes) = field.read_cell(&CellValue::String(String::new()));
        assert_eq!(value, CellValue::Null);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_custom_missing_values() {
        let mut field = Field::new("name", FieldType::String);
        field.missing_values = vec!["".to_string(), "n/a".to_string()];
        let (value, notes) = field.read_cell(&CellValue::String("n/a".into()));
        assert_eq!(value, CellValue::Null);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_required_note_on_missing() {
        let mut field = Field::new("id", FieldType::Integer);
        field.constraints.push(FieldConstraint::Required);
        let (value, notes) = field.read_cell(&CellValue::Null);
        assert_eq!(value, CellValue::Null);
        assert_eq!(notes.get("required").unwrap(), "constraint \"required\" is \"true\"");
        assert_eq!(notes.get("type"), None);
    }

    #[test]
    fn test_enum_constraint() {
        let mut field = Field::new("status", FieldType::String);
        field.constraints.push(FieldConstraint::Enum {
            values: vec!["active".to_string(), "inactive".to_string()],
        });
        let (_, notes) = field.read_cell(&CellValue::String("active".into()));
        assert!(notes.is_empty());
        let (_, notes) = field.read_cell(&CellValue::String("pending".into()));
        assert_eq!(
            notes.get("enum").unwrap(),
            "constraint \"enum\" is \"active, inactive\""
        );
    }

    #[test]
    fn test_range_constraints() {
        let mut field = Field::new("age", FieldType::Integer);
        field
            .constraints
            .push(FieldConstraint::Minimum { value: 0.0 });
        field
            .constraints
            .push(FieldConstraint::Maximum { value: 120.0 });
        let (_, notes) = field.read_cell(&CellValue::Integer(25));
        assert!(notes.is_empty());
        let (_, notes) = field.read_cell(&CellValue::Integer(200));
        assert_eq!(notes.len(), 1);
        assert!(notes.contains_key("maximum"));
    }

    #[test]
    fn test_length_constraints_count_chars() {
        let mut field = Field::new("name", FieldType::String);
        field
            .constraints
            .push(FieldConstraint::MinLength { value: 3 });
        let (_, notes) = field.read_cell(&CellValue::String("中国人".into()));
        assert!(notes.is_empty());
        let (_, notes) = field.read_cell(&CellValue::String("中国".into()));
        assert!(notes.contains_key("minLength"));
    }

    #[test]
    fn test_pattern_constraint() {
        let mut field = Field::new("url", FieldType::String);
        field.constraints.push(FieldConstraint::Pattern {
            regex: r"^https?://.*".to_string(),
        });
        let (_, notes) = field.read_cell(&CellValue::String("https://example.com".into()));
        assert!(notes.is_empty());
        let (_, notes) = field.read_cell(&CellValue::String("not-a-url".into()));
        assert!(notes.contains_key("pattern"));
    }

    #[test]
    fn test_invalid_pattern_yields_note() {
        let mut field = Field::new("test", FieldType::String);
        field.constraints.push(FieldConstraint::Pattern {
            regex: "[invalid(regex".to_string(),
        });
        let (_, notes) = field.read_cell(&CellValue::String("anything".into()));
        assert!(notes.get("pattern").unwrap().contains("invalid"));
    }

    #[test]
    fn test_multiple_constraint_notes() {
        let mut field = Field::new("code", FieldType::String);
        field
            .constraints
            .push(FieldConstraint::MinLength { value: 5 });
        field.constraints.push(FieldConstraint::Pattern {
            regex: r"^[a-z]+$".to_string(),
        });
        let (_, notes) = field.read_cell(&CellValue::String("AB".into()));
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn test_int_widens_to_number() {
        let field = Field::new("value", FieldType::Number);
        let (value, notes) = field.read_cell(&CellValue::Integer(42));
        assert_eq!(value, CellValue::Number(42.0));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_datetime_formats() {
        let field = Field::new("ts", FieldType::Datetime);
        let (value, notes) = field.read_cell(&CellValue::String("2024-01-15T10:30:00Z".into()));
        assert!(matches!(value, CellValue::Datetime(_)));
        assert!(notes.is_empty());
        let (value, _) = field.read_cell(&CellValue::String("2024-01-15 10:30:00".into()));
        assert!(matches!(value, CellValue::Datetime(_)));
    }

    #[test]
    fn test_any_passes_through() {
        let field = Field::new("data", FieldType::Any);
        let (value, notes) = field.read_cell(&CellValue::String("anything".into()));
        assert_eq!(value, CellValue::String("anything".into()));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_constraint_serde_tags() {
        let constraint = FieldConstraint::MinLength { value: 2 };
        let json = serde_json::to_string(&constraint).unwrap();
        assert_eq!(json, r#"{"type":"minLength","value":2}"#);
    }
}
