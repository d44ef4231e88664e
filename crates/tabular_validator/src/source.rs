//! Row-stream source boundary.
//!
//! Format-specific loaders (CSV/Excel/SQL readers) live outside the engine;
//! they are consumed through the [`RowSource`] trait which produces, in
//! order, an optional label row and a sequence of raw cell rows, while
//! maintaining running content stats (bytes, md5, sha256).
//!
//! [`TableSource`] is the in-memory implementation used by the engine's own
//! tests and by callers validating already-loaded data.

use md5::Md5;
use sha2::{Digest, Sha256};
use tabular_core::{CellValue, Schema, ValidationError};

/// Running content stats of a source, as of the last emitted row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceStats {
    /// Bytes consumed so far
    pub bytes: u64,
    /// MD5 digest of the consumed bytes, hex-encoded
    pub md5: String,
    /// SHA-256 digest of the consumed bytes, hex-encoded
    pub sha256: String,
}

/// A source of raw label/cell rows with scoped open/close semantics.
///
/// The engine guarantees `close` is called on every exit path, including
/// early validation stops.
pub trait RowSource: Send {
    /// Opens the source. Called exactly once before any read.
    fn open(&mut self) -> Result<(), ValidationError>;

    /// The label row, if the source carries one. Called once after `open`.
    fn labels(&mut self) -> Option<Vec<String>>;

    /// The next raw cell row, or `None` at end of stream.
    fn next_row(&mut self) -> Option<Vec<CellValue>>;

    /// Content stats covering everything emitted so far.
    fn stats(&self) -> SourceStats;

    /// Releases the source. Idempotent.
    fn close(&mut self);
}

#[derive(Clone)]
struct ContentDigest {
    bytes: u64,
    md5: Md5,
    sha256: Sha256,
}

impl ContentDigest {
    fn new() -> Self {
        Self {
            bytes: 0,
            md5: Md5::new(),
            sha256: Sha256::new(),
        }
    }

    fn update_line(&mut self, cells: &[String]) {
        let line = format!("{}\n", cells.join(","));
        self.bytes += line.len() as u64;
        self.md5.update(line.as_bytes());
        self.sha256.update(line.as_bytes());
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            bytes: self.bytes,
            md5: hex::encode(self.md5.clone().finalize()),
            sha256: hex::encode(self.sha256.clone().finalize()),
        }
    }
}

/// In-memory row source.
///
/// Rows are serialized as comma-joined UTF-8 lines for the purpose of byte
/// counting and hashing, so declared byte/hash expectations behave as they
/// would for a flat file with the same content.
pub struct TableSource {
    labels: Option<Vec<String>>,
    rows: std::collections::VecDeque<Vec<CellValue>>,
    digest: ContentDigest,
    open: bool,
}

impl TableSource {
    /// Creates a headerless source from raw cell rows.
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            labels: None,
            rows: rows.into(),
            digest: ContentDigest::new(),
            open: false,
        }
    }

    /// Attaches a label row.
    pub fn with_labels(mut self, labels: Vec<impl Into<String>>) -> Self {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }
}

impl RowSource for TableSource {
    fn open(&mut self) -> Result<(), ValidationError> {
        self.open = true;
        Ok(())
    }

    fn labels(&mut self) -> Option<Vec<String>> {
        let labels = self.labels.clone();
        if let Some(labels) = &labels {
            self.digest.update_line(labels);
        }
        labels
    }

    fn next_row(&mut self) -> Option<Vec<CellValue>> {
        let row = self.rows.pop_front()?;
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        self.digest.update_line(&cells);
        Some(row)
    }

    fn stats(&self) -> SourceStats {
        self.digest.stats()
    }

    fn close(&mut self) {
        self.open = false;
        self.rows.clear();
    }
}

/// Declared expectations about a resource's content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations {
    /// Expected content hash, either `algorithm:digest` or a bare digest
    /// (the algorithm is then inferred from the digest length)
    pub hash: Option<String>,
    /// Expected byte count
    pub bytes: Option<u64>,
    /// Expected field count
    pub fields: Option<usize>,
    /// Expected data row count
    pub rows: Option<u64>,
}

impl Expectations {
    /// Splits the declared hash into algorithm and digest.
    ///
    /// A bare 32-character digest is treated as md5 and a 64-character one
    /// as sha256; anything else is reported under algorithm `"unknown"`.
    pub fn hash_parts(&self) -> Option<(String, String)> {
        let hash = self.hash.as_deref()?;
        if let Some((algorithm, digest)) = hash.split_once(':') {
            return Some((algorithm.to_string(), digest.to_string()));
        }
        let algorithm = match hash.len() {
            32 => "md5",
            64 => "sha256",
            _ => "unknown",
        };
        Some((algorithm.to_string(), hash.to_string()))
    }
}

/// One tabular data source under validation: a row source coupled with its
/// schema, identity, and declared expectations.
pub struct Resource {
    /// Resource name used in reports
    pub name: String,
    /// Human-readable location (path, URI, or `<memory>`)
    pub place: String,
    /// Whether the resource is tabular
    pub tabular: bool,
    /// Compare header labels and field names case-insensitively
    pub ignore_case: bool,
    /// Schema the data is validated against
    pub schema: Schema,
    /// Declared content expectations
    pub declared: Expectations,
    pub(crate) source: Box<dyn RowSource>,
}

impl Resource {
    /// Creates a resource over the given source.
    pub fn new(
        name: impl Into<String>,
        schema: Schema,
        source: impl RowSource + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            place: "<memory>".to_string(),
            tabular: true,
            ignore_case: false,
            schema,
            declared: Expectations::default(),
            source: Box::new(source),
        }
    }

    /// Sets the human-readable place.
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    /// Marks the resource as non-tabular.
    pub fn with_tabular(mut self, tabular: bool) -> Self {
        self.tabular = tabular;
        self
    }

    /// Compares header labels and field names case-insensitively.
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    /// Sets the declared expectations.
    pub fn with_declared(mut self, declared: Expectations) -> Self {
        self.declared = declared;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_source_streams_rows() {
        let mut source = TableSource::new(vec![
            vec![CellValue::from(1i64), CellValue::from("english")],
            vec![CellValue::from(2i64), CellValue::from("中国人")],
        ])
        .with_labels(vec!["id", "name"]);

        source.open().unwrap();
        assert_eq!(source.labels(), Some(vec!["id".to_string(), "name".to_string()]));
        assert_eq!(
            source.next_row(),
            Some(vec![CellValue::Integer(1), CellValue::String("english".into())])
        );
        assert!(source.next_row().is_some());
        assert_eq!(source.next_row(), None);
    }

    #[test]
    fn test_table_source_byte_count() {
        // "id,name\n" + "1,english\n" + "2,中国人\n" = 8 + 10 + 12 bytes
        let mut source = TableSource::new(vec![
            vec![CellValue::from(1i64), CellValue::from("english")],
            vec![CellValue::from(2i64), CellValue::from("中国人")],
        ])
        .with_labels(vec!["id", "name"]);

        source.open().unwrap();
        source.labels();
        while source.next_row().is_some() {}
        assert_eq!(source.stats().bytes, 30);
    }

    #[test]
    fn test_table_source_hashes_are_stable() {
        let build = || {
            TableSource::new(vec![vec![CellValue::from(1i64)]]).with_labels(vec!["id"])
        };
        let mut first = build();
        let mut second = build();
        for source in [&mut first, &mut second] {
            source.open().unwrap();
            source.labels();
            while source.next_row().is_some() {}
        }
        assert_eq!(first.stats().md5, second.stats().md5);
        assert_eq!(first.stats().sha256, second.stats().sha256);
        assert_eq!(first.stats().md5.len(), 32);
        assert_eq!(first.stats().sha256.len(), 64);
    }

    #[test]
    fn test_hash_parts() {
        let declared = Expectations {
            hash: Some("sha256:abcdef".to_string()),
            ..Default::default()
        };
        assert_eq!(
            declared.hash_parts(),
            Some(("sha256".to_string(), "abcdef".to_string()))
        );

        let declared = Expectations {
            hash: Some("d".repeat(32)),
            ..Default::default()
        };
        assert_eq!(declared.hash_parts().unwrap().0, "md5");

        let declared = Expectations {
            hash: Some("bad".to_string()),
            ..Default::default()
        };
        assert_eq!(declared.hash_parts().unwrap().0, "unknown");

        assert_eq!(Expectations::default().hash_parts(), None);
    }
}
