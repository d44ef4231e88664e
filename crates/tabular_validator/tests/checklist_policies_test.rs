//! Checklist policies: filters, limits, and package-level orchestration.

use pretty_assertions::assert_eq;
use serde_json::Value;
use tabular_core::{CellValue, Check, Checklist, FieldBuilder, FieldType, Schema, SchemaBuilder};
use tabular_validator::{Resource, TableSource, validate, validate_package};

fn schema() -> Schema {
    SchemaBuilder::new()
        .field(FieldBuilder::new("id", FieldType::Integer).build())
        .field(FieldBuilder::new("name", FieldType::String).build())
        .build()
}

fn blank_row() -> Vec<CellValue> {
    vec![CellValue::from(""), CellValue::from("")]
}

#[test]
fn test_limit_errors_truncates_and_marks_partial() {
    let rows = vec![blank_row(); 10];
    let source = TableSource::new(rows).with_labels(vec!["id", "name"]);
    let checklist = Checklist::new().with_limit_errors(3);
    let report = validate(Resource::new("table", schema(), source), &checklist);

    let task = report.task().unwrap();
    assert!(task.partial);
    assert_eq!(task.errors.len(), 3);
    assert_eq!(task.warnings, vec!["reached error limit: 3"]);
    // streaming stopped at the third bad row
    assert_eq!(task.stats.rows, Some(3));
    assert!(task.to_summary().contains("(partial)"));
}

#[test]
fn test_limit_memory_stops_early() {
    // any real process exceeds one megabyte; the first sample trips the limit
    let rows = vec![vec![CellValue::from(1i64), CellValue::from("a")]; 1500];
    let source = TableSource::new(rows).with_labels(vec!["id", "name"]);
    let checklist = Checklist::new().with_limit_memory(1);
    let report = validate(Resource::new("table", schema(), source), &checklist);

    let task = report.task().unwrap();
    assert!(task.partial);
    assert_eq!(task.stats.rows, Some(1000));
    let flat = report.flatten(&["code", "note"]);
    assert_eq!(
        flat,
        vec![vec![
            Value::from("task-error"),
            Value::from("exceeded memory limit \"1MB\""),
        ]]
    );
}

#[test]
fn test_skip_errors() {
    let source = TableSource::new(vec![blank_row()]).with_labels(vec!["id", "name"]);
    let checklist = Checklist::new().with_skip_errors(vec!["blank-row".to_string()]);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    assert!(report.valid);
}

#[test]
fn test_pick_errors_by_tag() {
    let source = TableSource::new(vec![
        blank_row(),
        vec![CellValue::from("bad"), CellValue::from("x")],
    ])
    .with_labels(vec!["id", "wrong"]);
    let checklist = Checklist::new().with_pick_errors(vec!["#head".to_string()]);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    let flat = report.flatten(&["code"]);
    assert_eq!(flat, vec![vec![Value::from("incorrect-label")]]);
}

#[test]
fn test_skip_wins_over_pick() {
    // a skipped code is never reintroduced by pick
    let source = TableSource::new(vec![
        blank_row(),
        vec![
            CellValue::from(1i64),
            CellValue::from("a"),
            CellValue::from("extra"),
        ],
    ])
    .with_labels(vec!["id", "name"]);
    let checklist = Checklist::new()
        .with_skip_errors(vec!["blank-row".to_string()])
        .with_pick_errors(vec!["blank-row".to_string(), "extra-cell".to_string()]);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    let flat = report.flatten(&["code"]);
    assert_eq!(flat, vec![vec![Value::from("extra-cell")]]);
    // the scope reflects the effective filters
    let scope = &report.task().unwrap().scope;
    assert!(!scope.contains(&"blank-row".to_string()));
    assert!(scope.contains(&"extra-cell".to_string()));
}

#[test]
fn test_original_keeps_raw_values() {
    let source = TableSource::new(vec![vec![CellValue::from("bad"), CellValue::from("x")]])
        .with_labels(vec!["id", "name"]);
    let checklist = Checklist::new().with_original(true);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    assert!(report.valid);
}

#[test]
fn test_package_preserves_resource_order() {
    let names = ["alpha", "beta", "gamma", "delta"];
    let build = |name: &str| {
        let source = TableSource::new(vec![vec![CellValue::from(1i64), CellValue::from(name)]])
            .with_labels(vec!["id", "name"]);
        Resource::new(name, schema(), source)
    };

    for parallel in [false, true] {
        let resources: Vec<Resource> = names.iter().map(|name| build(name)).collect();
        let checklist = Checklist::new().with_parallel(parallel);
        let report = validate_package(resources, &checklist);
        assert_eq!(report.stats.tasks, 4);
        let observed: Vec<&str> = report.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(observed, names);
        assert!(report.valid);
    }
}

#[test]
fn test_package_merges_errors() {
    let good = {
        let source = TableSource::new(vec![vec![CellValue::from(1i64), CellValue::from("a")]])
            .with_labels(vec!["id", "name"]);
        Resource::new("good", schema(), source)
    };
    let bad = {
        let source = TableSource::new(vec![blank_row()]).with_labels(vec!["id", "name"]);
        Resource::new("bad", schema(), source)
    };
    let report = validate_package(vec![good, bad], &Checklist::new());
    assert!(!report.valid);
    assert_eq!(report.stats.errors, 1);
    let flat = report.flatten(&["taskNumber", "code"]);
    assert_eq!(flat, vec![vec![Value::from(2), Value::from("blank-row")]]);
}

#[test]
fn test_checks_from_parsed_checklist() {
    let yaml = r#"
checks:
  - type: sequential-value
    fieldName: id
  - type: forbidden-value
    fieldName: name
    values: [forbidden]
"#;
    let checklist = tabular_parser::parse_checklist_yaml(yaml).unwrap();
    let source = TableSource::new(vec![
        vec![CellValue::from(1i64), CellValue::from("ok")],
        vec![CellValue::from(3i64), CellValue::from("forbidden")],
    ])
    .with_labels(vec!["id", "name"]);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    let flat = report.flatten(&["rowNumber", "code"]);
    assert_eq!(
        flat,
        vec![
            vec![Value::from(3), Value::from("sequential-value")],
            vec![Value::from(3), Value::from("forbidden-value")],
        ]
    );
}

#[test]
fn test_row_constraint_over_stream() {
    let checklist = Checklist::new().with_check(Check::RowConstraint {
        formula: "id > 0 and name != ''".to_string(),
    });
    let source = TableSource::new(vec![
        vec![CellValue::from(1i64), CellValue::from("a")],
        vec![CellValue::from(-2i64), CellValue::from("b")],
    ])
    .with_labels(vec!["id", "name"]);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    let flat = report.flatten(&["rowNumber", "code"]);
    assert_eq!(
        flat,
        vec![vec![Value::from(3), Value::from("row-constraint")]]
    );
}

#[test]
fn test_table_dimensions_over_stream() {
    let checklist = Checklist::new().with_check(Check::TableDimensions {
        num_rows: None,
        min_rows: Some(5),
        max_rows: None,
        num_fields: None,
        min_fields: None,
        max_fields: Some(1),
    });
    let source = TableSource::new(vec![vec![CellValue::from(1i64), CellValue::from("a")]])
        .with_labels(vec!["id", "name"]);
    let report = validate(Resource::new("table", schema(), source), &checklist);
    let flat = report.flatten(&["code"]);
    assert_eq!(
        flat,
        vec![
            vec![Value::from("table-dimensions")],
            vec![Value::from("table-dimensions")],
        ]
    );
}

#[test]
fn test_checksum_check_standalone() {
    use tabular_validator::Expectations;
    // baseline stats errors are skipped; the checksum check still reports
    let source = TableSource::new(vec![vec![CellValue::from(1i64), CellValue::from("a")]])
        .with_labels(vec!["id", "name"]);
    let resource = Resource::new("table", schema(), source).with_declared(Expectations {
        rows: Some(9),
        ..Default::default()
    });
    let checklist = Checklist::new().with_check(Check::Checksum);
    let report = validate(resource, &checklist);
    let flat = report.flatten(&["code"]);
    // both the baseline and the checksum check compare stats
    assert_eq!(
        flat,
        vec![vec![Value::from("row-count")], vec![Value::from("row-count")]]
    );
}
