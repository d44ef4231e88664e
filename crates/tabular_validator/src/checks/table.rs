//! Table-level checks: dimensions and checksums.

use super::{CheckInstance, TableContext, stats_errors};
use crate::row::Row;
use tabular_core::{ErrorKind, ValidationError};

/// Enforces field and row count bounds.
///
/// Field bounds are checked at start, the maximum row bound incrementally
/// while streaming, and exact/minimum row bounds at the end.
pub struct TableDimensionsCheck {
    num_rows: Option<u64>,
    min_rows: Option<u64>,
    max_rows: Option<u64>,
    num_fields: Option<usize>,
    min_fields: Option<usize>,
    max_fields: Option<usize>,
    rows_seen: u64,
    max_rows_reported: bool,
}

impl TableDimensionsCheck {
    pub fn new(
        num_rows: Option<u64>,
        min_rows: Option<u64>,
        max_rows: Option<u64>,
        num_fields: Option<usize>,
        min_fields: Option<usize>,
        max_fields: Option<usize>,
    ) -> Self {
        Self {
            num_rows,
            min_rows,
            max_rows,
            num_fields,
            min_fields,
            max_fields,
            rows_seen: 0,
            max_rows_reported: false,
        }
    }
}

impl CheckInstance for TableDimensionsCheck {
    fn code(&self) -> &'static str {
        "table-dimensions"
    }

    fn validate_start(&mut self, table: &TableContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let fields = table.schema.fields.len();

        if let Some(required) = self.num_fields {
            if fields != required {
                errors.push(dimensions_error(format!(
                    "current number of fields is {}, the required is {}",
                    fields, required
                )));
            }
        }
        if let Some(minimum) = self.min_fields {
            if fields < minimum {
                errors.push(dimensions_error(format!(
                    "current number of fields is {}, the minimum is {}",
                    fields, minimum
                )));
            }
        }
        if let Some(maximum) = self.max_fields {
            if fields > maximum {
                errors.push(dimensions_error(format!(
                    "current number of fields is {}, the maximum is {}",
                    fields, maximum
                )));
            }
        }
        errors
    }

    fn validate_row(&mut self, _row: &Row) -> Vec<ValidationError> {
        self.rows_seen += 1;
        if self.max_rows_reported {
            return Vec::new();
        }
        if let Some(maximum) = self.max_rows {
            if self.rows_seen > maximum {
                self.max_rows_reported = true;
                return vec![dimensions_error(format!(
                    "current number of rows is {}, the maximum is {}",
                    self.rows_seen, maximum
                ))];
            }
        }
        Vec::new()
    }

    fn validate_end(&mut self, _table: &TableContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Some(required) = self.num_rows {
            if self.rows_seen != required {
                errors.push(dimensions_error(format!(
                    "current number of rows is {}, the required is {}",
                    self.rows_seen, required
                )));
            }
        }
        if let Some(minimum) = self.min_rows {
            if self.rows_seen < minimum {
                errors.push(dimensions_error(format!(
                    "current number of rows is {}, the minimum is {}",
                    self.rows_seen, minimum
                )));
            }
        }
        errors
    }
}

fn dimensions_error(note: String) -> ValidationError {
    ValidationError::new(ErrorKind::TableDimensions, note)
}

/// Standalone declared-vs-actual stats comparison.
///
/// Same semantics as the baseline check's end phase, usable on its own when
/// the baseline's structural errors are filtered out.
pub struct ChecksumCheck;

impl CheckInstance for ChecksumCheck {
    fn code(&self) -> &'static str {
        "checksum"
    }

    fn validate_end(&mut self, table: &TableContext) -> Vec<ValidationError> {
        stats_errors(table.declared, &table.stats)
    }
}
