//! Schema definition for tabular resources.
//!
//! A schema is an ordered list of fields plus integrity declarations
//! (primary/foreign keys). Key declarations are carried for descriptors and
//! error messages; resolving them against reference tables is the job of an
//! external resolver.

use crate::error::{ErrorKind, ValidationError};
use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A foreign key reference to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyReference {
    /// Name of the referenced resource
    pub resource: String,
    /// Referenced field names
    pub fields: Vec<String>,
}

/// A foreign key declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local field names
    pub fields: Vec<String>,
    /// Reference to the foreign resource and fields
    pub reference: ForeignKeyReference,
}

/// Schema for one tabular resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Ordered field definitions
    pub fields: Vec<Field>,

    /// Fields whose combined values identify a row
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,

    /// Foreign key declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl Schema {
    /// Creates a schema from an ordered field list.
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Ordered field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns true when the schema declares a field with this name.
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Validates the schema definition itself.
    ///
    /// Returns a list of schema errors. An empty list indicates success.
    pub fn validate_definition(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.fields.is_empty() {
            errors.push(ValidationError::new(
                ErrorKind::SchemaError,
                "schema has no fields defined",
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                errors.push(ValidationError::new(
                    ErrorKind::SchemaError,
                    format!("duplicate field name: {}", field.name),
                ));
            }
        }

        for name in &self.primary_key {
            if !self.has_field(name) {
                errors.push(ValidationError::new(
                    ErrorKind::SchemaError,
                    format!("primary key field \"{}\" does not exist", name),
                ));
            }
        }

        for foreign_key in &self.foreign_keys {
            for name in &foreign_key.fields {
                if !self.has_field(name) {
                    errors.push(ValidationError::new(
                        ErrorKind::SchemaError,
                        format!("foreign key field \"{}\" does not exist", name),
                    ));
                }
            }
        }

        errors
    }
}
