//! End-to-end validation scenarios over in-memory tables.

use pretty_assertions::assert_eq;
use serde_json::Value;
use tabular_core::{CellValue, Checklist, FieldBuilder, FieldType, Schema, SchemaBuilder};
use tabular_validator::{Expectations, Resource, TableSource, validate};

fn two_column_schema() -> Schema {
    SchemaBuilder::new()
        .field(FieldBuilder::new("id", FieldType::Integer).build())
        .field(FieldBuilder::new("name", FieldType::String).build())
        .build()
}

fn two_column_source() -> TableSource {
    TableSource::new(vec![
        vec![CellValue::from(1i64), CellValue::from("english")],
        vec![CellValue::from(2i64), CellValue::from("中国人")],
    ])
    .with_labels(vec!["id", "name"])
}

#[test]
fn test_declared_stats_match() {
    // id,name + (1, english) + (2, 中国人) serializes to 30 bytes
    let resource = Resource::new("table", two_column_schema(), two_column_source())
        .with_declared(Expectations {
            bytes: Some(30),
            rows: Some(2),
            ..Default::default()
        });
    let report = validate(resource, &Checklist::new());
    assert!(
        report.valid,
        "unexpected errors: {:?}",
        report.flatten(&["code", "note"])
    );
    let task = report.task().unwrap();
    assert_eq!(task.stats.rows, Some(2));
    assert_eq!(task.stats.bytes, Some(30));
}

#[test]
fn test_declared_byte_count_mismatch() {
    let resource = Resource::new("table", two_column_schema(), two_column_source())
        .with_declared(Expectations {
            bytes: Some(40),
            ..Default::default()
        });
    let report = validate(resource, &Checklist::new());
    assert!(!report.valid);
    assert_eq!(
        report.flatten(&["code", "note"]),
        vec![vec![
            Value::from("byte-count"),
            Value::from("expected is \"40\" and actual is \"30\""),
        ]]
    );
}

#[test]
fn test_declared_hash_match() {
    // first run collects the actual digest, second run declares it
    let probe = Resource::new("table", two_column_schema(), two_column_source());
    let probe_report = validate(probe, &Checklist::new());
    let md5 = probe_report.task().unwrap().stats.md5.clone().unwrap();

    let resource = Resource::new("table", two_column_schema(), two_column_source())
        .with_declared(Expectations {
            hash: Some(format!("md5:{}", md5)),
            ..Default::default()
        });
    let report = validate(resource, &Checklist::new());
    assert!(report.valid);
}

#[test]
fn test_declared_hash_mismatch() {
    let resource = Resource::new("table", two_column_schema(), two_column_source())
        .with_declared(Expectations {
            hash: Some(format!("sha256:{}", "0".repeat(64))),
            ..Default::default()
        });
    let report = validate(resource, &Checklist::new());
    let flat = report.flatten(&["code"]);
    assert_eq!(flat, vec![vec![Value::from("hash-count")]]);
}

#[test]
fn test_unsupported_hash_algorithm_is_a_warning() {
    let resource = Resource::new("table", two_column_schema(), two_column_source())
        .with_declared(Expectations {
            hash: Some("sha1:abc".to_string()),
            ..Default::default()
        });
    let report = validate(resource, &Checklist::new());
    assert!(report.valid);
    let task = report.task().unwrap();
    assert_eq!(
        task.warnings,
        vec!["hash is ignored; supported algorithms: md5/sha256"]
    );
}

#[test]
fn test_mixed_structural_problems() {
    // four fields; a blank third label, a duplicate fourth label, two short
    // rows, a fully blank row, and one extra cell on the last row
    let schema = SchemaBuilder::new()
        .field(FieldBuilder::new("id", FieldType::Integer).build())
        .field(FieldBuilder::new("name", FieldType::String).build())
        .field(FieldBuilder::new("", FieldType::String).build())
        .field(FieldBuilder::new("name", FieldType::String).build())
        .build();
    let source = TableSource::new(vec![
        vec![CellValue::from(1i64), CellValue::from("english")],
        vec![CellValue::from(2i64), CellValue::from("中国人")],
        vec![
            CellValue::from(""),
            CellValue::from(""),
            CellValue::from(""),
            CellValue::from(""),
        ],
        vec![
            CellValue::from(1i64),
            CellValue::from("english"),
            CellValue::from(""),
            CellValue::from(""),
            CellValue::from(""),
        ],
    ])
    .with_labels(vec!["id", "name", "", "name"]);

    let report = validate(Resource::new("table", schema, source), &Checklist::new());
    let flat = report.flatten(&["rowNumber", "fieldNumber", "code"]);
    let expected: Vec<Vec<Value>> = vec![
        vec![Value::Null, Value::from(3), Value::from("blank-label")],
        vec![Value::Null, Value::from(4), Value::from("duplicate-label")],
        vec![Value::from(2), Value::from(3), Value::from("missing-cell")],
        vec![Value::from(2), Value::from(4), Value::from("missing-cell")],
        vec![Value::from(3), Value::from(3), Value::from("missing-cell")],
        vec![Value::from(3), Value::from(4), Value::from("missing-cell")],
        vec![Value::from(4), Value::Null, Value::from("blank-row")],
        vec![Value::from(5), Value::from(5), Value::from("extra-cell")],
    ];
    assert_eq!(flat, expected);
}

#[test]
fn test_duplicate_row_check() {
    use tabular_core::Check;
    let source = TableSource::new(vec![
        vec![CellValue::from(1i64), CellValue::from("a")],
        vec![CellValue::from(2i64), CellValue::from("b")],
        vec![CellValue::from(1i64), CellValue::from("a")],
    ]);
    let checklist = Checklist::new().with_check(Check::DuplicateRow);
    let report = validate(
        Resource::new("table", two_column_schema(), source),
        &checklist,
    );
    let flat = report.flatten(&["rowNumber", "code", "note"]);
    assert_eq!(
        flat,
        vec![vec![
            Value::from(3),
            Value::from("duplicate-row"),
            Value::from("the same as row at position \"1\""),
        ]]
    );
}

#[test]
fn test_type_and_constraint_errors() {
    let schema = SchemaBuilder::new()
        .field(FieldBuilder::new("id", FieldType::Integer).build())
        .field(
            FieldBuilder::new("name", FieldType::String)
                .min_length(3)
                .build(),
        )
        .build();
    let source = TableSource::new(vec![
        vec![CellValue::from("bad"), CellValue::from("english")],
        vec![CellValue::from(2i64), CellValue::from("ab")],
    ])
    .with_labels(vec!["id", "name"]);
    let report = validate(Resource::new("table", schema, source), &Checklist::new());
    let flat = report.flatten(&["rowNumber", "code"]);
    assert_eq!(
        flat,
        vec![
            vec![Value::from(2), Value::from("type-error")],
            vec![Value::from(3), Value::from("constraint-error")],
        ]
    );
}

#[test]
fn test_report_summary_rendering() {
    let source = TableSource::new(vec![
        vec![CellValue::from(1i64), CellValue::from("a")],
        vec![CellValue::from(""), CellValue::from("")],
    ])
    .with_labels(vec!["id", "name"]);
    let report = validate(
        Resource::new("table", two_column_schema(), source).with_place("data/table.csv"),
        &Checklist::new(),
    );
    let summary = report.to_summary();
    assert!(summary.contains("# invalid: data/table.csv"));
    assert!(summary.contains("File Place"));
    assert!(summary.contains("Blank Row"));
    assert!(!summary.contains("(partial)"));
}

#[test]
fn test_report_descriptor_is_stable() {
    let resource = Resource::new("table", two_column_schema(), two_column_source());
    let report = validate(resource, &Checklist::new());
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["valid"], true);
    assert_eq!(value["stats"]["tasks"], 1);
    assert_eq!(value["tasks"][0]["name"], "table");
    assert_eq!(value["tasks"][0]["place"], "<memory>");
    assert!(value["tasks"][0]["scope"]
        .as_array()
        .unwrap()
        .contains(&Value::from("blank-row")));
}

#[test]
fn test_ignore_case_header() {
    let source = TableSource::new(vec![vec![CellValue::from(1i64), CellValue::from("a")]])
        .with_labels(vec!["ID", "Name"]);
    let strict = validate(
        Resource::new("table", two_column_schema(), source),
        &Checklist::new(),
    );
    assert_eq!(strict.stats.errors, 2);

    let source = TableSource::new(vec![vec![CellValue::from(1i64), CellValue::from("a")]])
        .with_labels(vec!["ID", "Name"]);
    let folded = validate(
        Resource::new("table", two_column_schema(), source).with_ignore_case(true),
        &Checklist::new(),
    );
    assert!(folded.valid);
}
