//! Checklist descriptors: check configurations and run-wide policies.
//!
//! A [`Checklist`] is the configured set of validation rules for a run plus
//! the policies applied to every produced error (pick/skip filters, error
//! and memory limits). The validator crate binds these configurations to
//! per-run check instances.

use crate::error::{ErrorKind, ValidationError};
use serde::{Deserialize, Serialize};

/// Default maximum number of collected errors per run.
pub const DEFAULT_LIMIT_ERRORS: usize = 1000;

/// Default memory limit in megabytes.
pub const DEFAULT_LIMIT_MEMORY: usize = 1000;

/// Average function used by the deviated-value check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Average {
    /// Arithmetic mean
    #[default]
    Mean,
    /// Median
    Median,
    /// Most frequent value
    Mode,
}

impl Average {
    /// Returns the average function name as used in descriptors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Average::Mean => "mean",
            Average::Median => "median",
            Average::Mode => "mode",
        }
    }
}

fn default_interval() -> f64 {
    3.0
}

/// Configuration of a single check, tagged by its code.
///
/// The set is closed: adding a check is a compile-time-checked addition to
/// this enum and to the validator's dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Check {
    /// The always-present structural and stats check
    Baseline,

    /// Report rows whose values repeat a previous row exactly
    DuplicateRow,

    /// Report numeric values outside a statistical interval
    DeviatedValue {
        /// Field to analyze
        field_name: String,
        /// Number of standard deviations away from the average
        #[serde(default = "default_interval")]
        interval: f64,
        /// Average function used as the interval center
        #[serde(default)]
        average: Average,
    },

    /// Report string values whose length is a statistical outlier
    OutlierValue {
        /// Field to analyze
        field_name: String,
        /// Number of standard deviations away from the median
        #[serde(default = "default_interval")]
        interval: f64,
    },

    /// Report cells whose size deviates across all string fields
    DeviatedCell {
        /// Number of standard deviations away from the median
        #[serde(default = "default_interval")]
        interval: f64,
        /// Fields excluded from the analysis
        #[serde(default)]
        ignore_fields: Vec<String>,
    },

    /// Report values from a forbidden set
    ForbiddenValue {
        /// Field to check
        field_name: String,
        /// Forbidden values, compared by textual form
        values: Vec<String>,
    },

    /// Report values that do not increase by exactly one
    SequentialValue {
        /// Field to check
        field_name: String,
    },

    /// Report values at known driver truncation boundaries
    TruncatedValue,

    /// Evaluate a boolean expression against each row's named values
    RowConstraint {
        /// Expression over the row's own values
        formula: String,
    },

    /// Enforce table dimension bounds
    TableDimensions {
        /// Exact number of rows
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_rows: Option<u64>,
        /// Minimum number of rows
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_rows: Option<u64>,
        /// Maximum number of rows
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_rows: Option<u64>,
        /// Exact number of fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        num_fields: Option<usize>,
        /// Minimum number of fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_fields: Option<usize>,
        /// Maximum number of fields
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_fields: Option<usize>,
    },

    /// Compare declared hash/bytes/fields/rows against observed stats
    Checksum,
}

impl Check {
    /// The check code, matching the descriptor tag.
    pub fn code(&self) -> &'static str {
        match self {
            Check::Baseline => "baseline",
            Check::DuplicateRow => "duplicate-row",
            Check::DeviatedValue { .. } => "deviated-value",
            Check::OutlierValue { .. } => "outlier-value",
            Check::DeviatedCell { .. } => "deviated-cell",
            Check::ForbiddenValue { .. } => "forbidden-value",
            Check::SequentialValue { .. } => "sequential-value",
            Check::TruncatedValue => "truncated-value",
            Check::RowConstraint { .. } => "row-constraint",
            Check::TableDimensions { .. } => "table-dimensions",
            Check::Checksum => "checksum",
        }
    }

    /// Error kinds this check may raise.
    pub fn error_kinds(&self) -> &'static [ErrorKind] {
        match self {
            Check::Baseline => &[
                ErrorKind::SourceError,
                ErrorKind::BlankHeader,
                ErrorKind::ExtraLabel,
                ErrorKind::MissingLabel,
                ErrorKind::BlankLabel,
                ErrorKind::DuplicateLabel,
                ErrorKind::IncorrectLabel,
                ErrorKind::ExtraCell,
                ErrorKind::MissingCell,
                ErrorKind::BlankRow,
                ErrorKind::TypeError,
                ErrorKind::ConstraintError,
                ErrorKind::HashCount,
                ErrorKind::ByteCount,
                ErrorKind::FieldCount,
                ErrorKind::RowCount,
            ],
            Check::DuplicateRow => &[ErrorKind::DuplicateRow],
            Check::DeviatedValue { .. } => &[ErrorKind::DeviatedValue],
            Check::OutlierValue { .. } => &[ErrorKind::OutlierValue],
            Check::DeviatedCell { .. } => &[ErrorKind::DeviatedCell],
            Check::ForbiddenValue { .. } => &[ErrorKind::ForbiddenValue],
            Check::SequentialValue { .. } => &[ErrorKind::SequentialValue],
            Check::TruncatedValue => &[ErrorKind::TruncatedValue],
            Check::RowConstraint { .. } => &[ErrorKind::RowConstraint],
            Check::TableDimensions { .. } => &[ErrorKind::TableDimensions],
            Check::Checksum => &[
                ErrorKind::HashCount,
                ErrorKind::ByteCount,
                ErrorKind::FieldCount,
                ErrorKind::RowCount,
            ],
        }
    }
}

/// The configured set of checks plus run-wide policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Checklist {
    /// Configured checks; the baseline check is always prepended at run time
    pub checks: Vec<Check>,

    /// Error codes or tags to keep; when non-empty, everything else is dropped
    pub pick_errors: Vec<String>,

    /// Error codes or tags to drop; skip always wins over pick
    pub skip_errors: Vec<String>,

    /// Stop collecting once this many errors are recorded for the run
    pub limit_errors: usize,

    /// Stop once the process uses this much memory, in megabytes
    pub limit_memory: usize,

    /// Bypass cell normalization: checks observe raw cell values
    pub original: bool,

    /// Validate a package's resources concurrently
    pub parallel: bool,
}

impl Default for Checklist {
    fn default() -> Self {
        Self {
            checks: Vec::new(),
            pick_errors: Vec::new(),
            skip_errors: Vec::new(),
            limit_errors: DEFAULT_LIMIT_ERRORS,
            limit_memory: DEFAULT_LIMIT_MEMORY,
            original: false,
            parallel: false,
        }
    }
}

impl Checklist {
    /// Creates a checklist with default policies and no extra checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a check.
    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Sets the pick filter.
    pub fn with_pick_errors(mut self, tokens: Vec<String>) -> Self {
        self.pick_errors = tokens;
        self
    }

    /// Sets the skip filter.
    pub fn with_skip_errors(mut self, tokens: Vec<String>) -> Self {
        self.skip_errors = tokens;
        self
    }

    /// Sets the error limit.
    pub fn with_limit_errors(mut self, limit: usize) -> Self {
        self.limit_errors = limit;
        self
    }

    /// Sets the memory limit in megabytes.
    pub fn with_limit_memory(mut self, limit: usize) -> Self {
        self.limit_memory = limit;
        self
    }

    /// Keeps original cell values (no normalization before checks run).
    pub fn with_original(mut self, original: bool) -> Self {
        self.original = original;
        self
    }

    /// Enables concurrent multi-resource validation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Returns true when the error passes the skip/pick filters.
    ///
    /// Skip is applied first and always wins; a non-empty pick list then
    /// narrows to matching codes/tags.
    pub fn matches(&self, error: &ValidationError) -> bool {
        if self.skip_errors.iter().any(|t| error.matches_token(t)) {
            return false;
        }
        if !self.pick_errors.is_empty()
            && !self.pick_errors.iter().any(|t| error.matches_token(t))
        {
            return false;
        }
        true
    }

    /// The error codes in effect for a run under the current filters.
    ///
    /// Covers the baseline check plus every configured check, in order.
    pub fn scope(&self) -> Vec<&'static str> {
        let mut scope: Vec<&'static str> = Vec::new();
        let baseline = Check::Baseline;
        let checks = std::iter::once(&baseline).chain(self.checks.iter());
        for check in checks {
            for kind in check.error_kinds() {
                if self.skip_errors.iter().any(|t| kind.matches_token(t)) {
                    continue;
                }
                if !self.pick_errors.is_empty()
                    && !self.pick_errors.iter().any(|t| kind.matches_token(t))
                {
                    continue;
                }
                if !scope.contains(&kind.code()) {
                    scope.push(kind.code());
                }
            }
        }
        scope
    }
}
