//! Check lifecycle and built-in checks.
//!
//! A check configuration ([`tabular_core::Check`]) is bound to exactly one
//! resource for the duration of one run via [`connect`], producing a fresh
//! [`CheckInstance`] with private state scoped to that run. Instances move
//! through `start -> row (N times) -> end`; no transition is skipped and
//! `end` runs at most once.

mod baseline;
mod heuristic;
mod regulation;
mod table;

pub use baseline::BaselineCheck;
pub use heuristic::{
    DeviatedCellCheck, DeviatedValueCheck, DuplicateRowCheck, OutlierValueCheck,
    TruncatedValueCheck,
};
pub use regulation::{ForbiddenValueCheck, RowConstraintCheck, SequentialValueCheck};
pub use table::{ChecksumCheck, TableDimensionsCheck};

use crate::expr::Expression;
use crate::header::Header;
use crate::row::Row;
use crate::source::Expectations;
use tabular_core::{Check, ErrorKind, Schema, ValidationError};

/// Observed stats of a table at a point in the stream.
#[derive(Debug, Clone, Default)]
pub struct ObservedStats {
    /// Bytes consumed
    pub bytes: u64,
    /// MD5 digest of the consumed bytes, hex-encoded
    pub md5: String,
    /// SHA-256 digest of the consumed bytes, hex-encoded
    pub sha256: String,
    /// Schema field count
    pub fields: usize,
    /// Data rows seen
    pub rows: u64,
}

/// The table-level facts a check phase can observe.
pub struct TableContext<'a> {
    /// Schema under validation
    pub schema: &'a Schema,
    /// Whether the resource is tabular
    pub tabular: bool,
    /// Declared content expectations
    pub declared: &'a Expectations,
    /// The validated header, if the resource was opened far enough
    pub header: Option<&'a Header>,
    /// Whether at least one data row exists
    pub has_data: bool,
    /// Stats as of this phase (zeroed at `start`, final at `end`)
    pub stats: ObservedStats,
}

/// One bound check for one resource's run.
///
/// Implementations keep private mutable state (counters, running hashes,
/// sliding statistics) owned exclusively by this instance and never shared.
pub trait CheckInstance: Send {
    /// The check code.
    fn code(&self) -> &'static str;

    /// Called once after the resource is opened.
    fn validate_start(&mut self, _table: &TableContext) -> Vec<ValidationError> {
        Vec::new()
    }

    /// Called for every row, in stream order.
    fn validate_row(&mut self, _row: &Row) -> Vec<ValidationError> {
        Vec::new()
    }

    /// Called once after the row stream ends.
    fn validate_end(&mut self, _table: &TableContext) -> Vec<ValidationError> {
        Vec::new()
    }
}

/// Binds a check configuration to a fresh per-run instance.
///
/// Statically invalid configurations are rejected with a checklist error;
/// conditions that depend on the resource (a referenced field missing from
/// the schema) are reported from `validate_start` instead.
pub fn connect(check: &Check) -> Result<Box<dyn CheckInstance>, ValidationError> {
    match check {
        Check::Baseline => Ok(Box::new(BaselineCheck)),
        Check::DuplicateRow => Ok(Box::new(DuplicateRowCheck::new())),
        Check::DeviatedValue {
            field_name,
            interval,
            average,
        } => {
            if *interval <= 0.0 {
                return Err(invalid(check, "interval must be positive"));
            }
            Ok(Box::new(DeviatedValueCheck::new(
                field_name.clone(),
                *interval,
                *average,
            )))
        }
        Check::OutlierValue {
            field_name,
            interval,
        } => {
            if *interval <= 0.0 {
                return Err(invalid(check, "interval must be positive"));
            }
            Ok(Box::new(OutlierValueCheck::new(field_name.clone(), *interval)))
        }
        Check::DeviatedCell {
            interval,
            ignore_fields,
        } => {
            if *interval <= 0.0 {
                return Err(invalid(check, "interval must be positive"));
            }
            Ok(Box::new(DeviatedCellCheck::new(
                *interval,
                ignore_fields.clone(),
            )))
        }
        Check::ForbiddenValue { field_name, values } => {
            if values.is_empty() {
                return Err(invalid(check, "at least one forbidden value is required"));
            }
            Ok(Box::new(ForbiddenValueCheck::new(
                field_name.clone(),
                values.clone(),
            )))
        }
        Check::SequentialValue { field_name } => {
            Ok(Box::new(SequentialValueCheck::new(field_name.clone())))
        }
        Check::TruncatedValue => Ok(Box::new(TruncatedValueCheck)),
        Check::RowConstraint { formula } => match Expression::parse(formula) {
            Ok(expression) => Ok(Box::new(RowConstraintCheck::new(
                formula.clone(),
                expression,
            ))),
            Err(error) => Err(invalid(check, &format!("formula is not valid: {}", error))),
        },
        Check::TableDimensions {
            num_rows,
            min_rows,
            max_rows,
            num_fields,
            min_fields,
            max_fields,
        } => {
            let bounds = [
                num_rows.map(|_| ()),
                min_rows.map(|_| ()),
                max_rows.map(|_| ()),
                num_fields.map(|_| ()),
                min_fields.map(|_| ()),
                max_fields.map(|_| ()),
            ];
            if bounds.iter().all(Option::is_none) {
                return Err(invalid(check, "at least one limit is required"));
            }
            Ok(Box::new(TableDimensionsCheck::new(
                *num_rows,
                *min_rows,
                *max_rows,
                *num_fields,
                *min_fields,
                *max_fields,
            )))
        }
        Check::Checksum => Ok(Box::new(ChecksumCheck)),
    }
}

fn invalid(check: &Check, note: &str) -> ValidationError {
    ValidationError::new(
        ErrorKind::ChecklistError,
        format!("check \"{}\" is not valid: {}", check.code(), note),
    )
}

/// Compares declared expectations against observed stats.
///
/// Shared by the baseline and checksum checks. An unsupported declared hash
/// algorithm is skipped here; the engine surfaces it as a task warning.
pub(crate) fn stats_errors(
    declared: &Expectations,
    observed: &ObservedStats,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some((algorithm, digest)) = declared.hash_parts() {
        let actual = match algorithm.as_str() {
            "md5" => Some(&observed.md5),
            "sha256" => Some(&observed.sha256),
            _ => None,
        };
        if let Some(actual) = actual {
            if *actual != digest {
                errors.push(ValidationError::new(
                    ErrorKind::HashCount,
                    format!("expected is \"{}\" and actual is \"{}\"", digest, actual),
                ));
            }
        }
    }

    if let Some(bytes) = declared.bytes {
        if bytes != observed.bytes {
            errors.push(ValidationError::new(
                ErrorKind::ByteCount,
                format!("expected is \"{}\" and actual is \"{}\"", bytes, observed.bytes),
            ));
        }
    }

    if let Some(fields) = declared.fields {
        if fields != observed.fields {
            errors.push(ValidationError::new(
                ErrorKind::FieldCount,
                format!("expected is \"{}\" and actual is \"{}\"", fields, observed.fields),
            ));
        }
    }

    if let Some(rows) = declared.rows {
        if rows != observed.rows {
            errors.push(ValidationError::new(
                ErrorKind::RowCount,
                format!("expected is \"{}\" and actual is \"{}\"", rows, observed.rows),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_connect_rejects_invalid_configs() {
        let invalid_checks = [
            Check::ForbiddenValue {
                field_name: "id".to_string(),
                values: vec![],
            },
            Check::RowConstraint {
                formula: "1 +".to_string(),
            },
            Check::DeviatedValue {
                field_name: "id".to_string(),
                interval: 0.0,
                average: Default::default(),
            },
            Check::TableDimensions {
                num_rows: None,
                min_rows: None,
                max_rows: None,
                num_fields: None,
                min_fields: None,
                max_fields: None,
            },
        ];
        for check in invalid_checks {
            let error = connect(&check).err().expect("config should be rejected");
            assert_eq!(error.code(), "checklist-error");
        }
    }

    #[test]
    fn test_connect_produces_fresh_instances() {
        let check = Check::DuplicateRow;
        let first = connect(&check).unwrap();
        let second = connect(&check).unwrap();
        assert_eq!(first.code(), "duplicate-row");
        assert_eq!(second.code(), "duplicate-row");
    }

    #[test]
    fn test_stats_errors_notes() {
        let declared = Expectations {
            bytes: Some(40),
            rows: Some(3),
            ..Default::default()
        };
        let observed = ObservedStats {
            bytes: 30,
            rows: 2,
            ..Default::default()
        };
        let errors = stats_errors(&declared, &observed);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code(), "byte-count");
        assert_eq!(errors[0].note(), "expected is \"40\" and actual is \"30\"");
        assert_eq!(errors[1].code(), "row-count");
    }

    #[test]
    fn test_stats_errors_hash_mismatch() {
        let declared = Expectations {
            hash: Some(format!("sha256:{}", "a".repeat(64))),
            ..Default::default()
        };
        let observed = ObservedStats {
            sha256: "b".repeat(64),
            ..Default::default()
        };
        let errors = stats_errors(&declared, &observed);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "hash-count");
    }

    #[test]
    fn test_stats_errors_unknown_algorithm_skipped() {
        let declared = Expectations {
            hash: Some("sha1:abc".to_string()),
            ..Default::default()
        };
        let errors = stats_errors(&declared, &ObservedStats::default());
        assert!(errors.is_empty());
    }
}
