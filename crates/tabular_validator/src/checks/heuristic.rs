//! Heuristic checks: probably wrong, not certainly.

use super::{CheckInstance, TableContext};
use crate::row::Row;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tabular_core::{Average, CellValue, ErrorKind, FieldType, ValidationError};

const DEVIATED_CELL_THRESHOLD: f64 = 5000.0;

const TRUNCATED_STRING_LENGTHS: [usize; 1] = [255];

const TRUNCATED_INTEGER_VALUES: [i64; 6] = [
    // BigInt
    9223372036854775807,
    // Int
    4294967295,
    2147483647,
    // SummedInt
    2097152,
    // SmallInt
    65535,
    32767,
];

// Beyond i64; only observable through a textual cell
const TRUNCATED_INTEGER_STRINGS: [&str; 1] = ["18446744073709551616"];

/// Reports rows whose stringified values repeat a previous row exactly.
pub struct DuplicateRowCheck {
    memory: HashMap<String, u64>,
}

impl DuplicateRowCheck {
    pub fn new() -> Self {
        Self {
            memory: HashMap::new(),
        }
    }
}

impl Default for DuplicateRowCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckInstance for DuplicateRowCheck {
    fn code(&self) -> &'static str {
        "duplicate-row"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let text = row
            .to_list()
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let hash = hex::encode(Sha256::digest(text.as_bytes()));
        if let Some(first) = self.memory.get(&hash) {
            let note = format!("the same as row at position \"{}\"", first);
            return vec![ValidationError::row(
                ErrorKind::DuplicateRow,
                note,
                row.cells().iter().map(|c| c.to_string()).collect(),
                row.row_number(),
            )];
        }
        self.memory.insert(hash, row.row_number());
        Vec::new()
    }
}

/// Reports numeric values outside a statistical acceptance interval.
pub struct DeviatedValueCheck {
    field_name: String,
    interval: f64,
    average: Average,
    cells: Vec<f64>,
    row_numbers: Vec<u64>,
}

impl DeviatedValueCheck {
    pub fn new(field_name: String, interval: f64, average: Average) -> Self {
        Self {
            field_name,
            interval,
            average,
            cells: Vec::new(),
            row_numbers: Vec::new(),
        }
    }
}

impl CheckInstance for DeviatedValueCheck {
    fn code(&self) -> &'static str {
        "deviated-value"
    }

    fn validate_start(&mut self, table: &TableContext) -> Vec<ValidationError> {
        match table.schema.get_field(&self.field_name) {
            None => vec![ValidationError::new(
                ErrorKind::CheckError,
                format!(
                    "deviated value check requires field \"{}\" to exist",
                    self.field_name
                ),
            )],
            Some(field) if !field.field_type.is_numeric() => vec![ValidationError::new(
                ErrorKind::CheckError,
                format!(
                    "deviated value check requires field \"{}\" to be numeric",
                    self.field_name
                ),
            )],
            Some(_) => Vec::new(),
        }
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        if let Some(number) = row.get(&self.field_name).and_then(|v| v.as_number()) {
            self.cells.push(number);
            self.row_numbers.push(row.row_number());
        }
        Vec::new()
    }

    fn validate_end(&mut self, _table: &TableContext) -> Vec<ValidationError> {
        if self.cells.len() < 2 {
            return Vec::new();
        }
        let stdev = sample_stdev(&self.cells);
        let center = match self.average {
            Average::Mean => mean(&self.cells),
            Average::Median => median(&self.cells),
            Average::Mode => mode(&self.cells),
        };
        let minimum = center - stdev * self.interval;
        let maximum = center + stdev * self.interval;
        let mut errors = Vec::new();
        for (row_number, cell) in self.row_numbers.iter().zip(self.cells.iter()) {
            if *cell < minimum || *cell > maximum {
                errors.push(ValidationError::new(
                    ErrorKind::DeviatedValue,
                    format!(
                        "value \"{}\" in row at position \"{}\" and field \"{}\" is deviated \"[{:.2}, {:.2}]\"",
                        cell, row_number, self.field_name, minimum, maximum
                    ),
                ));
            }
        }
        errors
    }
}

/// Reports string values whose length is an outlier.
///
/// Unlike the deviated-value check this one is median-centered; the two
/// variants keep their historical formulas on purpose.
pub struct OutlierValueCheck {
    field_name: String,
    interval: f64,
    lengths: Vec<f64>,
    row_numbers: Vec<u64>,
}

impl OutlierValueCheck {
    pub fn new(field_name: String, interval: f64) -> Self {
        Self {
            field_name,
            interval,
            lengths: Vec::new(),
            row_numbers: Vec::new(),
        }
    }
}

impl CheckInstance for OutlierValueCheck {
    fn code(&self) -> &'static str {
        "outlier-value"
    }

    fn validate_start(&mut self, table: &TableContext) -> Vec<ValidationError> {
        match table.schema.get_field(&self.field_name) {
            None => vec![ValidationError::new(
                ErrorKind::CheckError,
                format!(
                    "outlier value check requires field \"{}\" to exist",
                    self.field_name
                ),
            )],
            Some(field) if field.field_type != FieldType::String => {
                vec![ValidationError::new(
                    ErrorKind::CheckError,
                    format!(
                        "outlier value check requires field \"{}\" to be a string",
                        self.field_name
                    ),
                )]
            }
            Some(_) => Vec::new(),
        }
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        if let Some(text) = row.get(&self.field_name).and_then(|v| v.as_str()) {
            self.lengths.push(text.chars().count() as f64);
            self.row_numbers.push(row.row_number());
        }
        Vec::new()
    }

    fn validate_end(&mut self, _table: &TableContext) -> Vec<ValidationError> {
        if self.lengths.len() < 2 {
            return Vec::new();
        }
        let stdev = sample_stdev(&self.lengths);
        let center = median(&self.lengths);
        let minimum = center - stdev * self.interval;
        let maximum = center + stdev * self.interval;
        let mut errors = Vec::new();
        for (row_number, length) in self.row_numbers.iter().zip(self.lengths.iter()) {
            if *length < minimum || *length > maximum {
                errors.push(ValidationError::new(
                    ErrorKind::OutlierValue,
                    format!(
                        "value length \"{}\" in row at position \"{}\" and field \"{}\" is an outlier \"[{:.2}, {:.2}]\"",
                        length, row_number, self.field_name, minimum, maximum
                    ),
                ));
            }
        }
        errors
    }
}

/// Reports cells whose size deviates, across all string fields at once.
pub struct DeviatedCellCheck {
    interval: f64,
    ignore_fields: Vec<String>,
    sizes: HashMap<usize, Vec<(u64, f64)>>,
    names: HashMap<usize, String>,
}

impl DeviatedCellCheck {
    pub fn new(interval: f64, ignore_fields: Vec<String>) -> Self {
        Self {
            interval,
            ignore_fields,
            sizes: HashMap::new(),
            names: HashMap::new(),
        }
    }
}

impl CheckInstance for DeviatedCellCheck {
    fn code(&self) -> &'static str {
        "deviated-cell"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let values = row.to_list();
        for (index, (field, value)) in row.fields().iter().zip(values.iter()).enumerate() {
            if self.ignore_fields.contains(&field.name) {
                continue;
            }
            if let Some(text) = value.as_str() {
                if text.is_empty() {
                    continue;
                }
                self.sizes
                    .entry(index)
                    .or_default()
                    .push((row.row_number(), text.chars().count() as f64));
                self.names.entry(index).or_insert_with(|| field.name.clone());
            }
        }
        Vec::new()
    }

    fn validate_end(&mut self, _table: &TableContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut indexes: Vec<_> = self.sizes.keys().copied().collect();
        indexes.sort_unstable();
        for index in indexes {
            let sizes = &self.sizes[&index];
            if sizes.len() < 2 {
                continue;
            }
            let lengths: Vec<f64> = sizes.iter().map(|(_, size)| *size).collect();
            let stdev = sample_stdev(&lengths);
            let maximum = median(&lengths) + stdev * self.interval;
            // use the fixed threshold or the computed maximum, whichever is higher
            let threshold = DEVIATED_CELL_THRESHOLD.max(maximum);
            for (row_number, size) in sizes {
                if *size > threshold {
                    errors.push(ValidationError::new(
                        ErrorKind::DeviatedCell,
                        format!(
                            "cell at row \"{}\" and field \"{}\" has deviated size",
                            row_number, self.names[&index]
                        ),
                    ));
                }
            }
        }
        errors
    }
}

/// Reports values at known driver truncation boundaries.
pub struct TruncatedValueCheck;

impl CheckInstance for TruncatedValueCheck {
    fn code(&self) -> &'static str {
        "truncated-value"
    }

    fn validate_row(&mut self, row: &Row) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (name, value) in row.to_dict() {
            let truncated = match &value {
                CellValue::String(text) => {
                    TRUNCATED_STRING_LENGTHS.contains(&text.chars().count())
                        || TRUNCATED_INTEGER_STRINGS.contains(&text.as_str())
                }
                CellValue::Integer(integer) => TRUNCATED_INTEGER_VALUES.contains(integer),
                _ => false,
            };
            if truncated {
                let error = row
                    .cell_error(
                        ErrorKind::TruncatedValue,
                        "value is probably truncated",
                        &name,
                    )
                    .expect("field name comes from the row");
                errors.push(error);
            }
        }
        errors
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}

fn mode(values: &[f64]) -> f64 {
    let mut counts: HashMap<u64, usize> = HashMap::new();
    let mut best = values[0];
    let mut best_count = 0;
    for value in values {
        let count = counts.entry(value.to_bits()).or_insert(0);
        *count += 1;
        if *count > best_count {
            best_count = *count;
            best = *value;
        }
    }
    best
}

fn sample_stdev(values: &[f64]) -> f64 {
    let center = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - center).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}
