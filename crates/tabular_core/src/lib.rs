//! # Tabular Core
//!
//! Core data structures and types for the Tabular Validation Engine.
//!
//! This crate provides the building blocks shared across the engine: the
//! cell value model, schemas and fields with their casting contract, the
//! validation error taxonomy, and checklist descriptors.
//!
//! ## Key Concepts
//!
//! - **Schema**: an ordered list of fields describing one tabular resource
//! - **Field**: one column with a type and constraints; `read_cell` casts a
//!   raw cell and reports violations as notes
//! - **ValidationError**: a typed error record with a stable code, tags, and
//!   a rendered human message
//! - **Checklist**: the configured checks plus run-wide policies (filters
//!   and limits)
//!
//! ## Example
//!
//! ```rust
//! use tabular_core::{CellValue, FieldBuilder, FieldType, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .field(FieldBuilder::new("id", FieldType::Integer).required().build())
//!     .field(FieldBuilder::new("name", FieldType::String).build())
//!     .build();
//!
//! let field = schema.get_field("id").unwrap();
//! let (value, notes) = field.read_cell(&CellValue::String("42".into()));
//! assert_eq!(value, CellValue::Integer(42));
//! assert!(notes.is_empty());
//! ```

pub mod builder;
pub mod checklist;
pub mod error;
pub mod field;
pub mod schema;
pub mod value;

pub use builder::*;
pub use checklist::*;
pub use error::*;
pub use field::*;
pub use schema::*;
pub use value::*;
