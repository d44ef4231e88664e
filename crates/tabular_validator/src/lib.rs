//! # Tabular Validator
//!
//! Streaming validation engine for tabular data. This crate drives a
//! resource's row stream through a configurable set of checks and
//! aggregates the collected errors into a stable, serializable report:
//!
//! - Header and Row models that validate the observed shape against a
//!   schema, casting cells lazily and exactly once
//! - a pluggable check lifecycle (`start`/`row`/`end`) with built-in
//!   structural, statistical, and rule-based checks
//! - checklist orchestration with error filters and error/memory limits
//! - Report/ReportTask aggregation with flattening and text summaries
//!
//! ## Example
//!
//! ```rust
//! use tabular_core::{Checklist, FieldBuilder, FieldType, SchemaBuilder};
//! use tabular_validator::{Resource, TableSource, validate};
//!
//! let schema = SchemaBuilder::new()
//!     .field(FieldBuilder::new("id", FieldType::Integer).build())
//!     .field(FieldBuilder::new("name", FieldType::String).build())
//!     .build();
//! let source = TableSource::new(vec![
//!     vec![1i64.into(), "english".into()],
//!     vec![2i64.into(), "中国人".into()],
//! ])
//! .with_labels(vec!["id", "name"]);
//!
//! let report = validate(Resource::new("table", schema, source), &Checklist::new());
//! assert!(report.valid);
//! ```

pub mod checks;
pub mod engine;
pub mod expr;
pub mod header;
pub mod report;
pub mod row;
pub mod source;

pub use checks::{CheckInstance, ObservedStats, TableContext, connect};
pub use engine::{validate, validate_package};
pub use expr::{ExprError, Expression};
pub use header::Header;
pub use report::{Report, ReportStats, ReportTask, TaskStats};
pub use row::{FieldInfo, Row};
pub use source::{Expectations, Resource, RowSource, SourceStats, TableSource};
