//! Header validation.
//!
//! A header pairs the observed label row with the schema's field list and
//! computes all header-level errors in a single deterministic pass at
//! construction time. The header length always equals the field count; label
//! and field count mismatches become errors, not structural differences.

use tabular_core::{ErrorKind, Field, Schema, ValidationError};

/// The validated label row of one resource.
///
/// Constructed exactly once per resource open, from the first non-skipped
/// row(s); immutable afterward.
#[derive(Debug, Clone)]
pub struct Header {
    labels: Vec<String>,
    fields: Vec<Field>,
    row_numbers: Vec<u64>,
    missing: bool,
    errors: Vec<ValidationError>,
}

impl Header {
    /// Builds a header from observed labels and the schema's field list.
    ///
    /// `row_numbers` are the physical source rows that produced the labels
    /// (more than one for joined multi-row headers). `ignore_case` makes the
    /// label/field-name comparison case-insensitive.
    pub fn new(
        labels: Vec<String>,
        schema: &Schema,
        row_numbers: Vec<u64>,
        ignore_case: bool,
    ) -> Self {
        let fields: Vec<Field> = schema.fields.to_vec();
        let mut errors = Vec::new();

        if labels.is_empty() {
            errors.push(ValidationError::new(
                ErrorKind::BlankHeader,
                "header is completely blank",
            ));
            return Self {
                labels,
                fields,
                row_numbers,
                missing: true,
                errors,
            };
        }

        // Extra labels
        for (index, label) in labels.iter().enumerate().skip(fields.len()) {
            let field_number = index + 1;
            errors.push(ValidationError::header(
                ErrorKind::ExtraLabel,
                "",
                labels.clone(),
                label.clone(),
                "",
                field_number,
                field_number,
            ));
        }

        // Missing labels
        for (index, field) in fields.iter().enumerate().skip(labels.len()) {
            let field_number = index + 1;
            errors.push(ValidationError::header(
                ErrorKind::MissingLabel,
                "",
                labels.clone(),
                "",
                field.name.clone(),
                field_number,
                field_number,
            ));
        }

        // Paired positions
        for (index, (field, label)) in fields.iter().zip(labels.iter()).enumerate() {
            let field_number = index + 1;

            // Blank label
            if label.trim().is_empty() {
                errors.push(ValidationError::header(
                    ErrorKind::BlankLabel,
                    "",
                    labels.clone(),
                    "",
                    field.name.clone(),
                    field_number,
                    field_number,
                ));
                continue;
            }

            // Duplicate label: the earliest occurrence is the original and
            // every later occurrence is flagged
            let duplicate_positions: Vec<String> = labels[..index]
                .iter()
                .enumerate()
                .filter(|(_, seen)| !seen.trim().is_empty() && *seen == label)
                .map(|(position, _)| (position + 1).to_string())
                .collect();
            if !duplicate_positions.is_empty() {
                errors.push(ValidationError::header(
                    ErrorKind::DuplicateLabel,
                    format!("at position \"{}\"", duplicate_positions.join(", ")),
                    labels.clone(),
                    label.clone(),
                    field.name.clone(),
                    field_number,
                    field_number,
                ));
                continue;
            }

            // Incorrect label
            if !labels_match(label, &field.name, ignore_case) {
                errors.push(ValidationError::header(
                    ErrorKind::IncorrectLabel,
                    "",
                    labels.clone(),
                    label.clone(),
                    field.name.clone(),
                    field_number,
                    field_number,
                ));
            }
        }

        Self {
            labels,
            fields,
            row_numbers,
            missing: false,
            errors,
        }
    }

    /// Builds the missing header of a headerless resource: no labels were
    /// present in the source and no header errors apply.
    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            labels: Vec::new(),
            fields: schema.fields.to_vec(),
            row_numbers: Vec::new(),
            missing: true,
            errors: Vec::new(),
        }
    }

    /// Raw observed labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Schema fields this header was built from, order-preserving.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Ordered field names.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Physical source rows that produced the labels.
    pub fn row_numbers(&self) -> &[u64] {
        &self.row_numbers
    }

    /// True when there were no labels at all (headerless or empty source).
    pub fn missing(&self) -> bool {
        self.missing
    }

    /// Header-level errors, computed once at construction.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// True when the header has no errors.
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// The header as a field name → label mapping.
    pub fn to_dict(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .zip(self.labels.iter())
            .map(|(field, label)| (field.name.clone(), label.clone()))
            .collect()
    }

    /// The header as a label list.
    pub fn to_list(&self) -> Vec<String> {
        self.labels.clone()
    }
}

fn labels_match(label: &str, field_name: &str, ignore_case: bool) -> bool {
    let normalize = |text: &str| -> String {
        let joined = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if ignore_case {
            joined.to_lowercase()
        } else {
            joined
        }
    };
    normalize(label) == normalize(field_name)
}
