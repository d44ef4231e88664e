//! Builder pattern for schemas and fields.
//!
//! This module provides ergonomic builders for constructing schemas
//! and their fields with a fluent API.

use crate::field::{Field, FieldConstraint, FieldType};
use crate::schema::{ForeignKey, Schema};

/// Builder for creating a `Schema`.
///
/// # Example
///
/// ```rust
/// use tabular_core::{FieldBuilder, FieldType, SchemaBuilder};
///
/// let schema = SchemaBuilder::new()
///     .field(FieldBuilder::new("id", FieldType::Integer).required().build())
///     .field(FieldBuilder::new("name", FieldType::String).build())
///     .primary_key(vec!["id"])
///     .build();
/// assert_eq!(schema.field_names(), vec!["id", "name"]);
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
    primary_key: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field to the schema.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds multiple fields to the schema.
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Sets the primary key fields.
    pub fn primary_key(mut self, names: Vec<impl Into<String>>) -> Self {
        self.primary_key = names.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a foreign key declaration.
    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Builds the schema.
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
            primary_key: self.primary_key,
            foreign_keys: self.foreign_keys,
        }
    }
}

/// Builder for creating a `Field`.
///
/// # Example
///
/// ```rust
/// use tabular_core::{FieldBuilder, FieldType};
///
/// let field = FieldBuilder::new("age", FieldType::Integer)
///     .description("Age in years")
///     .minimum(0.0)
///     .maximum(150.0)
///     .build();
/// assert_eq!(field.name, "age");
/// ```
#[derive(Debug)]
pub struct FieldBuilder {
    field: Field,
}

impl FieldBuilder {
    /// Creates a new field builder.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            field: Field::new(name, field_type),
        }
    }

    /// Sets the field description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.field.description = Some(description.into());
        self
    }

    /// Sets the raw string values treated as missing.
    pub fn missing_values(mut self, values: Vec<impl Into<String>>) -> Self {
        self.field.missing_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a constraint to the field.
    pub fn constraint(mut self, constraint: FieldConstraint) -> Self {
        self.field.constraints.push(constraint);
        self
    }

    /// Marks the field as required.
    pub fn required(self) -> Self {
        self.constraint(FieldConstraint::Required)
    }

    /// Restricts the field to a set of allowed values.
    pub fn enumeration(self, values: Vec<impl Into<String>>) -> Self {
        self.constraint(FieldConstraint::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Sets the minimum numeric value.
    pub fn minimum(self, value: f64) -> Self {
        self.constraint(FieldConstraint::Minimum { value })
    }

    /// Sets the maximum numeric value.
    pub fn maximum(self, value: f64) -> Self {
        self.constraint(FieldConstraint::Maximum { value })
    }

    /// Sets the minimum string length.
    pub fn min_length(self, value: usize) -> Self {
        self.constraint(FieldConstraint::MinLength { value })
    }

    /// Sets the maximum string length.
    pub fn max_length(self, value: usize) -> Self {
        self.constraint(FieldConstraint::MaxLength { value })
    }

    /// Requires string values to match a regex pattern.
    pub fn pattern(self, regex: impl Into<String>) -> Self {
        self.constraint(FieldConstraint::Pattern {
            regex: regex.into(),
        })
    }

    /// Builds the field.
    pub fn build(self) -> Field {
        self.field
    }
}
