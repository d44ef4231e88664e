//! The always-present baseline check.

use super::{CheckInstance, TableContext, stats_errors};
use crate::row::Row;
use tabular_core::{ErrorKind, ValidationError};

/// The mandatory structural and stats check every run performs.
///
/// Re-emits the header's and each row's own errors, and compares declared
/// content expectations against observed stats at the end of the stream.
pub struct BaselineCheck;

impl CheckInstance for BaselineCheck {
    fn code(&self) -> &'static str {
        "baseline"
    }

    fn validate_start(&mut self, table: &TableContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if table.tabular {
            let header_missing = table.header.map(|h| h.missing()).unwrap_or(true);
            if header_missing && !table.has_data {
                errors.push(ValidationError::new(
                    ErrorKind::SourceError,
                    "the source is empty",
                ));
            }
            if let Some(header) = table.header {
                errors.extend(header.errors().iter().cloned());
            }
        }
        errors
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        row.errors().to_vec()
    }

    fn validate_end(&mut self, table: &TableContext) -> Vec<ValidationError> {
        stats_errors(table.declared, &table.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::row::FieldInfo;
    use crate::source::Expectations;
    use pretty_assertions::assert_eq;
    use tabular_core::{CellValue, FieldBuilder, FieldType, Schema, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("name", FieldType::String).build())
            .build()
    }

    fn context<'a>(
        schema: &'a Schema,
        declared: &'a Expectations,
        header: Option<&'a Header>,
        has_data: bool,
    ) -> TableContext<'a> {
        TableContext {
            schema,
            tabular: true,
            declared,
            header,
            has_data,
            stats: Default::default(),
        }
    }

    #[test]
    fn test_empty_source_error() {
        let schema = schema();
        let declared = Expectations::default();
        let header = Header::from_schema(&schema);
        let mut check = BaselineCheck;
        let errors = check.validate_start(&context(&schema, &declared, Some(&header), false));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "source-error");
    }

    #[test]
    fn test_header_errors_are_reemitted() {
        let schema = schema();
        let declared = Expectations::default();
        let header = Header::new(
            vec!["id".to_string(), "wrong".to_string()],
            &schema,
            vec![1],
            false,
        );
        let mut check = BaselineCheck;
        let errors = check.validate_start(&context(&schema, &declared, Some(&header), true));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "incorrect-label");
    }

    #[test]
    fn test_non_tabular_resource_is_quiet_at_start() {
        let schema = schema();
        let declared = Expectations::default();
        let mut check = BaselineCheck;
        let mut context = context(&schema, &declared, None, false);
        context.tabular = false;
        assert!(check.validate_start(&context).is_empty());
    }

    #[test]
    fn test_row_errors_are_reemitted() {
        let schema = schema();
        let row = Row::new(
            vec![CellValue::from("bad")],
            FieldInfo::from_schema(&schema),
            2,
            false,
        );
        let mut check = BaselineCheck;
        let errors = check.validate_row(&row);
        let codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec!["type-error", "missing-cell"]);
    }

    #[test]
    fn test_end_compares_stats() {
        let schema = schema();
        let declared = Expectations {
            rows: Some(5),
            ..Default::default()
        };
        let header = Header::from_schema(&schema);
        let mut check = BaselineCheck;
        let mut table = context(&schema, &declared, Some(&header), true);
        table.stats.rows = 2;
        let errors = check.validate_end(&table);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "row-count");
    }
}
