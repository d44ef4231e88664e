//! Row representation with lazy cell processing.
//!
//! A row is an explicit two-state value: the raw cells it was created with,
//! and a memoized processed state (cast values, blank/error cell bookkeeping
//! and the row's own errors). The first access to any processed accessor
//! runs casting for the entire row exactly once; every later access is free.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use tabular_core::{CellValue, EngineError, ErrorKind, Field, Schema, ValidationError};

/// Schema-derived field lookup shared read-only across all rows of one
/// resource. Never mutated after construction.
#[derive(Debug)]
pub struct FieldInfo {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl FieldInfo {
    /// Builds the shared field info for a resource.
    pub fn from_schema(schema: &Schema) -> Arc<Self> {
        let fields = schema.fields.to_vec();
        let mut index = HashMap::new();
        for (position, field) in fields.iter().enumerate() {
            // first occurrence wins for duplicated names
            index.entry(field.name.clone()).or_insert(position);
        }
        Arc::new(Self { fields, index })
    }

    /// Ordered schema fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Ordered field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Zero-based index of a field by name.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

#[derive(Debug)]
struct Processed {
    values: Vec<CellValue>,
    blank_cells: Vec<(String, CellValue)>,
    error_cells: Vec<(String, CellValue)>,
    errors: Vec<ValidationError>,
}

/// One data record of a resource.
///
/// Created per physical data row by the engine and discarded after the
/// consuming checks have read what they need.
#[derive(Debug)]
pub struct Row {
    cells: Vec<CellValue>,
    field_info: Arc<FieldInfo>,
    row_number: u64,
    original: bool,
    processed: OnceCell<Processed>,
}

impl Row {
    /// Wraps one raw cell row.
    ///
    /// `row_number` is 1-based and counts the header row when present.
    /// With `original` set, cells bypass casting and checks observe the raw
    /// values; structural errors (extra/missing cells) still apply.
    pub fn new(
        cells: Vec<CellValue>,
        field_info: Arc<FieldInfo>,
        row_number: u64,
        original: bool,
    ) -> Self {
        Self {
            cells,
            field_info,
            row_number,
            original,
            processed: OnceCell::new(),
        }
    }

    /// Raw cells as produced by the source.
    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    /// The row number (1-based, includes the header).
    pub fn row_number(&self) -> u64 {
        self.row_number
    }

    /// Ordered field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.field_info.field_names()
    }

    /// Ordered schema fields.
    pub fn fields(&self) -> &[Field] {
        self.field_info.fields()
    }

    /// The processed value of a field, triggering processing on first use.
    pub fn get(&self, name: &str) -> Option<&CellValue> {
        let position = self.field_info.position_of(name)?;
        self.processed().values.get(position)
    }

    /// Fields whose raw cell was empty and cast to no value without error.
    pub fn blank_cells(&self) -> &[(String, CellValue)] {
        &self.processed().blank_cells
    }

    /// Fields whose raw cell failed casting.
    pub fn error_cells(&self) -> &[(String, CellValue)] {
        &self.processed().error_cells
    }

    /// The row's own errors.
    pub fn errors(&self) -> &[ValidationError] {
        &self.processed().errors
    }

    /// True when the row has no errors.
    pub fn valid(&self) -> bool {
        self.processed().errors.is_empty()
    }

    /// Processed values in field order; always `fields().len()` long.
    pub fn to_list(&self) -> Vec<CellValue> {
        self.processed().values.clone()
    }

    /// Processed values as ordered (field name, value) pairs.
    pub fn to_dict(&self) -> Vec<(String, CellValue)> {
        self.field_info
            .fields()
            .iter()
            .zip(self.processed().values.iter())
            .map(|(field, value)| (field.name.clone(), value.clone()))
            .collect()
    }

    /// Builds a cell-level error for a named field of this row.
    ///
    /// Referencing a field that is not in the row is a programmer error and
    /// fails loudly instead of being collected.
    pub fn cell_error(
        &self,
        kind: ErrorKind,
        note: impl Into<String>,
        field_name: &str,
    ) -> Result<ValidationError, EngineError> {
        let position = self
            .field_info
            .position_of(field_name)
            .ok_or_else(|| EngineError::UnknownField(field_name.to_string()))?;
        let value = &self.processed().values[position];
        Ok(ValidationError::cell(
            kind,
            note,
            self.cells_as_strings(),
            self.row_number,
            value.to_string(),
            field_name,
            position + 1,
            position + 1,
        ))
    }

    fn cells_as_strings(&self) -> Vec<String> {
        self.cells.iter().map(|c| c.to_string()).collect()
    }

    fn processed(&self) -> &Processed {
        self.processed.get_or_init(|| self.process())
    }

    fn process(&self) -> Processed {
        let fields = self.field_info.fields();
        let cells_text = self.cells_as_strings();
        let mut values = Vec::with_capacity(fields.len());
        let mut blank_cells = Vec::new();
        let mut error_cells = Vec::new();
        let mut errors = Vec::new();

        // Paired portion, strictly positional
        for (index, field) in fields.iter().enumerate() {
            let field_number = index + 1;
            let Some(raw) = self.cells.get(index) else {
                values.push(CellValue::Null);
                continue;
            };

            if self.original {
                let blank = matches!(raw, CellValue::Null)
                    || raw.as_str().is_some_and(|s| s.is_empty());
                if blank {
                    blank_cells.push((field.name.clone(), raw.clone()));
                }
                values.push(raw.clone());
                continue;
            }

            let (value, mut notes) = field.read_cell(raw);
            let type_note = notes.remove("type");

            if value.is_null() && type_note.is_none() {
                blank_cells.push((field.name.clone(), raw.clone()));
            }

            if let Some(note) = type_note {
                error_cells.push((field.name.clone(), raw.clone()));
                errors.push(ValidationError::cell(
                    ErrorKind::TypeError,
                    note,
                    cells_text.clone(),
                    self.row_number,
                    raw.to_string(),
                    field.name.clone(),
                    field_number,
                    field_number,
                ));
            }

            for note in notes.into_values() {
                errors.push(ValidationError::cell(
                    ErrorKind::ConstraintError,
                    note,
                    cells_text.clone(),
                    self.row_number,
                    raw.to_string(),
                    field.name.clone(),
                    field_number,
                    field_number,
                ));
            }

            values.push(value);
        }

        // Extra cells
        for (index, cell) in self.cells.iter().enumerate().skip(fields.len()) {
            let field_number = index + 1;
            errors.push(ValidationError::cell(
                ErrorKind::ExtraCell,
                "",
                cells_text.clone(),
                self.row_number,
                cell.to_string(),
                "",
                field_number,
                field_number,
            ));
        }

        // Missing cells
        for (index, field) in fields.iter().enumerate().skip(self.cells.len()) {
            let field_number = index + 1;
            errors.push(ValidationError::cell(
                ErrorKind::MissingCell,
                "",
                cells_text.clone(),
                self.row_number,
                "",
                field.name.clone(),
                field_number,
                field_number,
            ));
        }

        // Blank row collapse
        if !fields.is_empty() && blank_cells.len() == fields.len() && errors.is_empty() {
            errors = vec![ValidationError::row(
                ErrorKind::BlankRow,
                "",
                cells_text,
                self.row_number,
            )];
        }

        Processed {
            values,
            blank_cells,
            error_cells,
            errors,
        }
    }
}
