//! Regulation checks: user-declared rules over cell and row values.

use super::{CheckInstance, TableContext};
use crate::expr::Expression;
use crate::row::Row;
use tabular_core::{ErrorKind, ValidationError};

/// Flags cells whose value is in a configured forbidden set.
pub struct ForbiddenValueCheck {
    field_name: String,
    values: Vec<String>,
}

impl ForbiddenValueCheck {
    pub fn new(field_name: String, values: Vec<String>) -> Self {
        Self { field_name, values }
    }
}

impl CheckInstance for ForbiddenValueCheck {
    fn code(&self) -> &'static str {
        "forbidden-value"
    }

    fn validate_start(&mut self, table: &TableContext) -> Vec<ValidationError> {
        if !table.schema.has_field(&self.field_name) {
            return vec![ValidationError::new(
                ErrorKind::CheckError,
                format!(
                    "forbidden value check requires field \"{}\" to exist",
                    self.field_name
                ),
            )];
        }
        Vec::new()
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let Some(value) = row.get(&self.field_name) else {
            return Vec::new();
        };
        if value.is_null() {
            return Vec::new();
        }
        let text = value.to_string();
        if self.values.iter().any(|forbidden| *forbidden == text) {
            let note = format!("forbidden values are \"{}\"", self.values.join(", "));
            let error = row
                .cell_error(ErrorKind::ForbiddenValue, note, &self.field_name)
                .expect("field existence was checked at start");
            return vec![error];
        }
        Vec::new()
    }
}

/// Expects cell values to increase by exactly one from the first observed
/// value; the first violation flags that row and permanently disables the
/// check for the rest of the stream.
pub struct SequentialValueCheck {
    field_name: String,
    cursor: Option<i64>,
    exited: bool,
}

impl SequentialValueCheck {
    pub fn new(field_name: String) -> Self {
        Self {
            field_name,
            cursor: None,
            exited: false,
        }
    }
}

impl CheckInstance for SequentialValueCheck {
    fn code(&self) -> &'static str {
        "sequential-value"
    }

    fn validate_start(&mut self, table: &TableContext) -> Vec<ValidationError> {
        if !table.schema.has_field(&self.field_name) {
            return vec![ValidationError::new(
                ErrorKind::CheckError,
                format!(
                    "sequential value check requires field \"{}\" to exist",
                    self.field_name
                ),
            )];
        }
        Vec::new()
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        if self.exited {
            return Vec::new();
        }
        let observed = row.get(&self.field_name).and_then(|v| v.as_integer());
        let sequential = match (observed, self.cursor) {
            (Some(value), None) => {
                self.cursor = Some(value + 1);
                true
            }
            (Some(value), Some(expected)) if value == expected => {
                self.cursor = Some(value + 1);
                true
            }
            _ => false,
        };
        if sequential {
            return Vec::new();
        }
        self.exited = true;
        let error = row
            .cell_error(
                ErrorKind::SequentialValue,
                "the value is not sequential",
                &self.field_name,
            )
            .expect("field existence was checked at start");
        vec![error]
    }
}

/// Evaluates a restricted boolean expression against the row's named values;
/// any evaluation error or falsy result flags the row.
pub struct RowConstraintCheck {
    formula: String,
    expression: Expression,
}

impl RowConstraintCheck {
    pub fn new(formula: String, expression: Expression) -> Self {
        Self {
            formula,
            expression,
        }
    }
}

impl CheckInstance for RowConstraintCheck {
    fn code(&self) -> &'static str {
        "row-constraint"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let satisfied = self
            .expression
            .evaluate_bool(&|name| row.get(name).cloned())
            .unwrap_or(false);
        if satisfied {
            return Vec::new();
        }
        vec![ValidationError::row(
            ErrorKind::RowConstraint,
            format!("the row constraint to conform is \"{}\"", self.formula),
            row.cells().iter().map(|c| c.to_string()).collect(),
            row.row_number(),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::FieldInfo;
    use crate::source::Expectations;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tabular_core::{CellValue, FieldBuilder, FieldType, Schema, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .field(FieldBuilder::new("id", FieldType::Integer).build())
            .field(FieldBuilder::new("name", FieldType::String).build())
            .build()
    }

    fn rows(schema: &Schema, data: Vec<Vec<CellValue>>) -> Vec<Row> {
        let info = FieldInfo::from_schema(schema);
        data.into_iter()
            .enumerate()
            .map(|(index, cells)| Row::new(cells, Arc::clone(&info), index as u64 + 2, false))
            .collect()
    }

    fn start_context<'a>(schema: &'a Schema, declared: &'a Expectations) -> TableContext<'a> {
        TableContext {
            schema,
            tabular: true,
            declared,
            header: None,
            has_data: true,
            stats: Default::default(),
        }
    }

    #[test]
    fn test_forbidden_value() {
        let schema = schema();
        let data = rows(
            &schema,
            vec![
                vec![CellValue::from(1i64), CellValue::from("ok")],
                vec![CellValue::from(2i64), CellValue::from("secret")],
            ],
        );
        let mut check =
            ForbiddenValueCheck::new("name".to_string(), vec!["secret".to_string()]);
        assert!(check.validate_row(&data[0]).is_empty());
        let errors = check.validate_row(&data[1]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "forbidden-value");
        assert_eq!(errors[0].note(), "forbidden values are \"secret\"");
    }

    #[test]
    fn test_forbidden_value_missing_field() {
        let schema = schema();
        let declared = Expectations::default();
        let mut check = ForbiddenValueCheck::new("ghost".to_string(), vec!["x".to_string()]);
        let errors = check.validate_start(&start_context(&schema, &declared));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "check-error");
    }

    #[test]
    fn test_sequential_value_disables_after_first_violation() {
        let schema = schema();
        let data = rows(
            &schema,
            vec![
                vec![CellValue::from(3i64), CellValue::from("a")],
                vec![CellValue::from(4i64), CellValue::from("b")],
                vec![CellValue::from(7i64), CellValue::from("c")],
                vec![CellValue::from(8i64), CellValue::from("d")],
            ],
        );
        let mut check = SequentialValueCheck::new("id".to_string());
        assert!(check.validate_row(&data[0]).is_empty());
        assert!(check.validate_row(&data[1]).is_empty());
        let errors = check.validate_row(&data[2]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "sequential-value");
        // disabled for the rest of the stream, even though 8 follows 7
        assert!(check.validate_row(&data[3]).is_empty());
    }

    #[test]
    fn test_sequential_value_non_integer_violates() {
        let schema = schema();
        let data = rows(
            &schema,
            vec![
                vec![CellValue::from(1i64), CellValue::from("a")],
                vec![CellValue::Null, CellValue::from("b")],
            ],
        );
        let mut check = SequentialValueCheck::new("id".to_string());
        assert!(check.validate_row(&data[0]).is_empty());
        assert_eq!(check.validate_row(&data[1]).len(), 1);
    }

    #[test]
    fn test_row_constraint() {
        let schema = schema();
        let data = rows(
            &schema,
            vec![
                vec![CellValue::from(5i64), CellValue::from("a")],
                vec![CellValue::from(1i64), CellValue::from("b")],
            ],
        );
        let expression = Expression::parse("id > 2").unwrap();
        let mut check = RowConstraintCheck::new("id > 2".to_string(), expression);
        assert!(check.validate_row(&data[0]).is_empty());
        let errors = check.validate_row(&data[1]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), "row-constraint");
        assert_eq!(
            errors[0].note(),
            "the row constraint to conform is \"id > 2\""
        );
    }

    #[test]
    fn test_row_constraint_eval_error_flags_row() {
        let schema = schema();
        let data = rows(&schema, vec![vec![CellValue::from(1i64), CellValue::from("a")]]);
        let expression = Expression::parse("ghost > 2").unwrap();
        let mut check = RowConstraintCheck::new("ghost > 2".to_string(), expression);
        assert_eq!(check.validate_row(&data[0]).len(), 1);
    }
}
