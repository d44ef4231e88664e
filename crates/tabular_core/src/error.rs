//! Validation error taxonomy.
//!
//! This module defines the typed error records produced by validation:
//! stable machine codes, classification tags, human templates, and the
//! positional context (header/row/cell) each error carries.
//!
//! Validation errors are ordinary values that get collected into reports;
//! they are never raised. Programmer-contract violations use [`EngineError`]
//! instead and propagate as `Result`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Result type for fatal engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Fatal errors raised on programmer-contract violations.
///
/// These are the only errors that propagate as `Err`; everything shaped by
/// user data is collected as a [`ValidationError`] value instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A field name was referenced that does not exist in the row
    #[error("Field '{0}' is not in the row")]
    UnknownField(String),

    /// A descriptor could not be interpreted
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The closed set of validation error kinds.
///
/// Every kind carries static metadata: a stable machine `code`, a display
/// `name`, classification `tags`, a human `template`, and a `description`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // General
    General,
    SchemaError,
    FieldError,
    CheckError,
    ChecklistError,
    TaskError,
    ReportError,
    // Table
    SourceError,
    HashCount,
    ByteCount,
    FieldCount,
    RowCount,
    TableDimensions,
    // Header
    BlankHeader,
    ExtraLabel,
    MissingLabel,
    BlankLabel,
    DuplicateLabel,
    IncorrectLabel,
    // Structure
    ExtraCell,
    MissingCell,
    BlankRow,
    // Schema
    TypeError,
    ConstraintError,
    // Integrity
    UniqueError,
    PrimaryKeyError,
    ForeignKeyError,
    // Heuristic
    DuplicateRow,
    DeviatedValue,
    OutlierValue,
    DeviatedCell,
    TruncatedValue,
    // Regulation
    ForbiddenValue,
    SequentialValue,
    RowConstraint,
}

impl ErrorKind {
    /// Stable machine identifier, e.g. `"missing-cell"`.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::General => "error",
            ErrorKind::SchemaError => "schema-error",
            ErrorKind::FieldError => "field-error",
            ErrorKind::CheckError => "check-error",
            ErrorKind::ChecklistError => "checklist-error",
            ErrorKind::TaskError => "task-error",
            ErrorKind::ReportError => "report-error",
            ErrorKind::SourceError => "source-error",
            ErrorKind::HashCount => "hash-count",
            ErrorKind::ByteCount => "byte-count",
            ErrorKind::FieldCount => "field-count",
            ErrorKind::RowCount => "row-count",
            ErrorKind::TableDimensions => "table-dimensions",
            ErrorKind::BlankHeader => "blank-header",
            ErrorKind::ExtraLabel => "extra-label",
            ErrorKind::MissingLabel => "missing-label",
            ErrorKind::BlankLabel => "blank-label",
            ErrorKind::DuplicateLabel => "duplicate-label",
            ErrorKind::IncorrectLabel => "incorrect-label",
            ErrorKind::ExtraCell => "extra-cell",
            ErrorKind::MissingCell => "missing-cell",
            ErrorKind::BlankRow => "blank-row",
            ErrorKind::TypeError => "type-error",
            ErrorKind::ConstraintError => "constraint-error",
            ErrorKind::UniqueError => "unique-error",
            ErrorKind::PrimaryKeyError => "primary-key-error",
            ErrorKind::ForeignKeyError => "foreign-key-error",
            ErrorKind::DuplicateRow => "duplicate-row",
            ErrorKind::DeviatedValue => "deviated-value",
            ErrorKind::OutlierValue => "outlier-value",
            ErrorKind::DeviatedCell => "deviated-cell",
            ErrorKind::TruncatedValue => "truncated-value",
            ErrorKind::ForbiddenValue => "forbidden-value",
            ErrorKind::SequentialValue => "sequential-value",
            ErrorKind::RowConstraint => "row-constraint",
        }
    }

    /// Display name, e.g. `"Missing Cell"`.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::General => "Error",
            ErrorKind::SchemaError => "Schema Error",
            ErrorKind::FieldError => "Field Error",
            ErrorKind::CheckError => "Check Error",
            ErrorKind::ChecklistError => "Checklist Error",
            ErrorKind::TaskError => "Task Error",
            ErrorKind::ReportError => "Report Error",
            ErrorKind::SourceError => "Source Error",
            ErrorKind::HashCount => "Hash Count Error",
            ErrorKind::ByteCount => "Byte Count Error",
            ErrorKind::FieldCount => "Field Count Error",
            ErrorKind::RowCount => "Row Count Error",
            ErrorKind::TableDimensions => "Table Dimensions Error",
            ErrorKind::BlankHeader => "Blank Header",
            ErrorKind::ExtraLabel => "Extra Label",
            ErrorKind::MissingLabel => "Missing Label",
            ErrorKind::BlankLabel => "Blank Label",
            ErrorKind::DuplicateLabel => "Duplicate Label",
            ErrorKind::IncorrectLabel => "Incorrect Label",
            ErrorKind::ExtraCell => "Extra Cell",
            ErrorKind::MissingCell => "Missing Cell",
            ErrorKind::BlankRow => "Blank Row",
            ErrorKind::TypeError => "Type Error",
            ErrorKind::ConstraintError => "Constraint Error",
            ErrorKind::UniqueError => "Unique Error",
            ErrorKind::PrimaryKeyError => "Primary Key Error",
            ErrorKind::ForeignKeyError => "Foreign Key Error",
            ErrorKind::DuplicateRow => "Duplicate Row",
            ErrorKind::DeviatedValue => "Deviated Value",
            ErrorKind::OutlierValue => "Outlier Value",
            ErrorKind::DeviatedCell => "Deviated Cell",
            ErrorKind::TruncatedValue => "Truncated Value",
            ErrorKind::ForbiddenValue => "Forbidden Value",
            ErrorKind::SequentialValue => "Sequential Value",
            ErrorKind::RowConstraint => "Row Constraint",
        }
    }

    /// Classification tags, e.g. `["#body", "#structure"]`.
    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            ErrorKind::General
            | ErrorKind::SchemaError
            | ErrorKind::FieldError
            | ErrorKind::CheckError
            | ErrorKind::ChecklistError
            | ErrorKind::TaskError
            | ErrorKind::ReportError => &["#general"],
            ErrorKind::SourceError
            | ErrorKind::HashCount
            | ErrorKind::ByteCount
            | ErrorKind::FieldCount
            | ErrorKind::RowCount
            | ErrorKind::TableDimensions => &["#table"],
            ErrorKind::BlankHeader
            | ErrorKind::ExtraLabel
            | ErrorKind::MissingLabel
            | ErrorKind::BlankLabel
            | ErrorKind::DuplicateLabel => &["#head", "#structure"],
            ErrorKind::IncorrectLabel => &["#head", "#schema"],
            ErrorKind::ExtraCell | ErrorKind::MissingCell | ErrorKind::BlankRow => {
                &["#body", "#structure"]
            }
            ErrorKind::TypeError | ErrorKind::ConstraintError => &["#body", "#schema"],
            ErrorKind::UniqueError
            | ErrorKind::PrimaryKeyError
            | ErrorKind::ForeignKeyError => &["#body", "#schema", "#integrity"],
            ErrorKind::DuplicateRow
            | ErrorKind::DeviatedValue
            | ErrorKind::OutlierValue
            | ErrorKind::DeviatedCell
            | ErrorKind::TruncatedValue => &["#body", "#heuristic"],
            ErrorKind::ForbiddenValue
            | ErrorKind::SequentialValue
            | ErrorKind::RowConstraint => &["#body", "#regulation"],
        }
    }

    /// Message template over the error's own fields.
    pub fn template(&self) -> &'static str {
        match self {
            ErrorKind::General => "{note}",
            ErrorKind::SchemaError => "Schema is not valid: {note}",
            ErrorKind::FieldError => "Field is not valid: {note}",
            ErrorKind::CheckError => "Check is not valid: {note}",
            ErrorKind::ChecklistError => "Checklist is not valid: {note}",
            ErrorKind::TaskError => "The validation task has an error: {note}",
            ErrorKind::ReportError => "Report is not valid: {note}",
            ErrorKind::SourceError => {
                "The data source has not supported or has inconsistent contents: {note}"
            }
            ErrorKind::HashCount => "The data source does not match the expected hash: {note}",
            ErrorKind::ByteCount => {
                "The data source does not match the expected byte count: {note}"
            }
            ErrorKind::FieldCount => {
                "The data source does not match the expected field count: {note}"
            }
            ErrorKind::RowCount => {
                "The data source does not match the expected row count: {note}"
            }
            ErrorKind::TableDimensions => {
                "The data source does not have the required dimensions: {note}"
            }
            ErrorKind::BlankHeader => "Header is completely blank",
            ErrorKind::ExtraLabel => {
                "There is an extra label \"{cell}\" in header at position \"{fieldNumber}\""
            }
            ErrorKind::MissingLabel => {
                "There is a missing label in field \"{fieldName}\" at position \"{fieldNumber}\""
            }
            ErrorKind::BlankLabel => {
                "Label in field at position \"{fieldNumber}\" is blank"
            }
            ErrorKind::DuplicateLabel => {
                "Label \"{cell}\" at position \"{fieldNumber}\" is duplicated to a label: {note}"
            }
            ErrorKind::IncorrectLabel => {
                "Label \"{cell}\" in field {fieldName} at position \"{fieldNumber}\" does not match the field name in the schema"
            }
            ErrorKind::ExtraCell => {
                "Row at position \"{rowNumber}\" has an extra value in field at position \"{fieldNumber}\""
            }
            ErrorKind::MissingCell => {
                "Row at position \"{rowNumber}\" has a missing cell in field \"{fieldName}\" at position \"{fieldNumber}\""
            }
            ErrorKind::BlankRow => "Row at position \"{rowNumber}\" is completely blank",
            ErrorKind::TypeError => {
                "Type error in the cell \"{cell}\" in row \"{rowNumber}\" and field \"{fieldName}\" at position \"{fieldNumber}\": {note}"
            }
            ErrorKind::ConstraintError => {
                "The cell \"{cell}\" in row at position \"{rowNumber}\" and field \"{fieldName}\" at position \"{fieldNumber}\" does not conform to a constraint: {note}"
            }
            ErrorKind::UniqueError => {
                "Row at position \"{rowNumber}\" has unique constraint violation in field \"{fieldName}\" at position \"{fieldNumber}\": {note}"
            }
            ErrorKind::PrimaryKeyError => {
                "The row at position \"{rowNumber}\" does not conform to the primary key constraint: {note}"
            }
            ErrorKind::ForeignKeyError => {
                "The row at position \"{rowNumber}\" does not conform to the foreign key constraint: {note}"
            }
            ErrorKind::DuplicateRow => "Row at position {rowNumber} is duplicated: {note}",
            ErrorKind::DeviatedValue => {
                "There is a possible error because the value is deviated: {note}"
            }
            ErrorKind::OutlierValue => {
                "There is a possible error because the value is an outlier: {note}"
            }
            ErrorKind::DeviatedCell => {
                "There is a possible error because the cell is deviated: {note}"
            }
            ErrorKind::TruncatedValue => {
                "The cell {cell} in row at position {rowNumber} and field {fieldName} at position {fieldNumber} has an error: {note}"
            }
            ErrorKind::ForbiddenValue => {
                "The cell {cell} in row at position {rowNumber} and field {fieldName} at position {fieldNumber} has an error: {note}"
            }
            ErrorKind::SequentialValue => {
                "The cell {cell} in row at position {rowNumber} and field {fieldName} at position {fieldNumber} has an error: {note}"
            }
            ErrorKind::RowConstraint => "The row at position {rowNumber} has an error: {note}",
        }
    }

    /// Static prose describing the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::General => "There is an error.",
            ErrorKind::SchemaError => "Provided schema is not valid.",
            ErrorKind::FieldError => "Provided field is not valid.",
            ErrorKind::CheckError => "Provided check is not valid.",
            ErrorKind::ChecklistError => "Provided checklist is not valid.",
            ErrorKind::TaskError => "General task-level error.",
            ErrorKind::ReportError => "Provided report is not valid.",
            ErrorKind::SourceError => {
                "Data reading error because of not supported or inconsistent contents."
            }
            ErrorKind::HashCount => "This error can happen if the data is corrupted.",
            ErrorKind::ByteCount => "This error can happen if the data is corrupted.",
            ErrorKind::FieldCount => {
                "This error can happen if the data is corrupted or the schema does not match."
            }
            ErrorKind::RowCount => {
                "This error can happen if the data is corrupted or the declaration is stale."
            }
            ErrorKind::TableDimensions => "The table does not have the declared dimensions.",
            ErrorKind::BlankHeader => {
                "There are no labels at all. The header should contain at least one label."
            }
            ErrorKind::ExtraLabel => {
                "The header has a label that does not exist in the schema."
            }
            ErrorKind::MissingLabel => {
                "Based on the schema there should be a label that is missing in the header."
            }
            ErrorKind::BlankLabel => {
                "A label in the header is blank. Labels should be provided and not be blank."
            }
            ErrorKind::DuplicateLabel => {
                "Two labels in the header are the same. Labels should be unique."
            }
            ErrorKind::IncorrectLabel => {
                "A label does not match the field name defined in the schema."
            }
            ErrorKind::ExtraCell => {
                "This row has more values compared to the schema field count. All rows in tabular data must have the same number of columns."
            }
            ErrorKind::MissingCell => {
                "This row has fewer values compared to the schema field count. All rows in tabular data must have the same number of columns."
            }
            ErrorKind::BlankRow => "This row is empty. A row should contain at least one value.",
            ErrorKind::TypeError => {
                "The value does not match the schema type and format for this field."
            }
            ErrorKind::ConstraintError => "A field value does not conform to a constraint.",
            ErrorKind::UniqueError => {
                "This field is a unique field but it contains a value that has been used in another row."
            }
            ErrorKind::PrimaryKeyError => {
                "Values in the primary key fields should be unique for every row."
            }
            ErrorKind::ForeignKeyError => {
                "Values in the foreign key fields should exist in the reference table."
            }
            ErrorKind::DuplicateRow => "The row is duplicated.",
            ErrorKind::DeviatedValue => "The value is deviated.",
            ErrorKind::OutlierValue => "The value is a statistical outlier.",
            ErrorKind::DeviatedCell => "The cell size is deviated.",
            ErrorKind::TruncatedValue => "The value is possibly truncated.",
            ErrorKind::ForbiddenValue => "The value is forbidden.",
            ErrorKind::SequentialValue => "The value is not sequential.",
            ErrorKind::RowConstraint => "The row does not conform to the row constraint.",
        }
    }

    /// Returns true when the given filter token matches this kind's code or
    /// one of its tags. Tokens are codes (`"blank-row"`) or tags (`"#body"`).
    pub fn matches_token(&self, token: &str) -> bool {
        self.code() == token || self.tags().contains(&token)
    }
}

/// Positional context attached to a validation error, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    /// No position (general, table and report-level errors)
    General,
    /// Header-level position
    Header {
        cells: Vec<String>,
        cell: String,
        field_name: String,
        field_number: usize,
        field_position: usize,
    },
    /// Row-level position
    Row { cells: Vec<String>, row_number: u64 },
    /// Cell-level position (row plus field)
    Cell {
        cells: Vec<String>,
        row_number: u64,
        cell: String,
        field_name: String,
        field_number: usize,
        field_position: usize,
    },
}

/// A single validation error: kind metadata, an instance note, positional
/// details, and the message rendered once at construction.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    kind: ErrorKind,
    note: String,
    details: ErrorDetails,
    message: String,
}

impl ValidationError {
    /// Creates a general (position-less) error.
    pub fn new(kind: ErrorKind, note: impl Into<String>) -> Self {
        Self::build(kind, note.into(), ErrorDetails::General)
    }

    /// Creates a header-level error.
    pub fn header(
        kind: ErrorKind,
        note: impl Into<String>,
        cells: Vec<String>,
        cell: impl Into<String>,
        field_name: impl Into<String>,
        field_number: usize,
        field_position: usize,
    ) -> Self {
        Self::build(
            kind,
            note.into(),
            ErrorDetails::Header {
                cells,
                cell: cell.into(),
                field_name: field_name.into(),
                field_number,
                field_position,
            },
        )
    }

    /// Creates a row-level error.
    pub fn row(
        kind: ErrorKind,
        note: impl Into<String>,
        cells: Vec<String>,
        row_number: u64,
    ) -> Self {
        Self::build(kind, note.into(), ErrorDetails::Row { cells, row_number })
    }

    /// Creates a cell-level error.
    #[allow(clippy::too_many_arguments)]
    pub fn cell(
        kind: ErrorKind,
        note: impl Into<String>,
        cells: Vec<String>,
        row_number: u64,
        cell: impl Into<String>,
        field_name: impl Into<String>,
        field_number: usize,
        field_position: usize,
    ) -> Self {
        Self::build(
            kind,
            note.into(),
            ErrorDetails::Cell {
                cells,
                row_number,
                cell: cell.into(),
                field_name: field_name.into(),
                field_number,
                field_position,
            },
        )
    }

    fn build(kind: ErrorKind, note: String, details: ErrorDetails) -> Self {
        let message = render_template(kind.template(), &Self::field_map(kind, &note, &details));
        Self {
            kind,
            note,
            details,
            message,
        }
    }

    /// The error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Stable machine code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Classification tags.
    pub fn tags(&self) -> &'static [&'static str] {
        self.kind.tags()
    }

    /// Instance-specific note.
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Rendered human message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Positional details.
    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    /// Row number this error refers to, if any.
    pub fn row_number(&self) -> Option<u64> {
        match &self.details {
            ErrorDetails::Row { row_number, .. } | ErrorDetails::Cell { row_number, .. } => {
                Some(*row_number)
            }
            _ => None,
        }
    }

    /// Field number this error refers to, if any.
    pub fn field_number(&self) -> Option<usize> {
        match &self.details {
            ErrorDetails::Header { field_number, .. }
            | ErrorDetails::Cell { field_number, .. } => Some(*field_number),
            _ => None,
        }
    }

    /// Returns true when the given filter token matches code or tags.
    pub fn matches_token(&self, token: &str) -> bool {
        self.kind.matches_token(token)
    }

    /// Projects this error into a flat serializable descriptor.
    ///
    /// Key naming is camelCase and stable; downstream tooling consumes it.
    pub fn to_descriptor(&self) -> serde_json::Map<String, serde_json::Value> {
        use serde_json::{Value, json};
        let mut map = serde_json::Map::new();
        map.insert("code".into(), json!(self.code()));
        map.insert("name".into(), json!(self.kind.name()));
        map.insert("tags".into(), json!(self.tags()));
        map.insert("note".into(), json!(self.note));
        map.insert("message".into(), json!(self.message));
        map.insert("description".into(), json!(self.kind.description()));
        match &self.details {
            ErrorDetails::General => {}
            ErrorDetails::Header {
                cells,
                cell,
                field_name,
                field_number,
                field_position,
            } => {
                map.insert("cells".into(), json!(cells));
                map.insert("cell".into(), json!(cell));
                map.insert("fieldName".into(), json!(field_name));
                map.insert("fieldNumber".into(), json!(field_number));
                map.insert("fieldPosition".into(), json!(field_position));
            }
            ErrorDetails::Row { cells, row_number } => {
                map.insert("cells".into(), json!(cells));
                map.insert("rowNumber".into(), Value::from(*row_number));
            }
            ErrorDetails::Cell {
                cells,
                row_number,
                cell,
                field_name,
                field_number,
                field_position,
            } => {
                map.insert("cells".into(), json!(cells));
                map.insert("rowNumber".into(), Value::from(*row_number));
                map.insert("cell".into(), json!(cell));
                map.insert("fieldName".into(), json!(field_name));
                map.insert("fieldNumber".into(), json!(field_number));
                map.insert("fieldPosition".into(), json!(field_position));
            }
        }
        map
    }

    fn field_map(kind: ErrorKind, note: &str, details: &ErrorDetails) -> BTreeMap<&'static str, String> {
        let mut map = BTreeMap::new();
        map.insert("note", note.to_string());
        map.insert("code", kind.code().to_string());
        match details {
            ErrorDetails::General => {}
            ErrorDetails::Header {
                cell,
                field_name,
                field_number,
                field_position,
                ..
            } => {
                map.insert("cell", cell.clone());
                map.insert("fieldName", field_name.clone());
                map.insert("fieldNumber", field_number.to_string());
                map.insert("fieldPosition", field_position.to_string());
            }
            ErrorDetails::Row { row_number, .. } => {
                map.insert("rowNumber", row_number.to_string());
            }
            ErrorDetails::Cell {
                row_number,
                cell,
                field_name,
                field_number,
                field_position,
                ..
            } => {
                map.insert("rowNumber", row_number.to_string());
                map.insert("cell", cell.clone());
                map.insert("fieldName", field_name.clone());
                map.insert("fieldNumber", field_number.to_string());
                map.insert("fieldPosition", field_position.to_string());
            }
        }
        map
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let descriptor = self.to_descriptor();
        let mut map = serializer.serialize_map(Some(descriptor.len()))?;
        for (key, value) in &descriptor {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Renders a template, substituting `{key}` placeholders from the map.
/// Missing keys render as an empty string; rendering never fails.
fn render_template(template: &str, fields: &BTreeMap<&'static str, String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut chars = template.chars();
    while let Some(ch) = chars.next() {
        if ch != '{' {
            result.push(ch);
            continue;
        }
        let mut key = String::new();
        for inner in chars.by_ref() {
            if inner == '}' {
                break;
            }
            key.push(inner);
        }
        if let Some(value) = fields.get(key.as_str()) {
            result.push_str(value);
        }
    }
    result
}
