//! Report and ReportTask aggregation.
//!
//! A [`ReportTask`] captures the outcome of validating exactly one resource;
//! a [`Report`] is the full outcome of a validation run, one task per
//! resource plus any top-level errors. Both are immutable once built and
//! serialize to stable camelCase descriptors.

use serde::Serialize;
use serde_json::Value;
use tabular_core::ValidationError;

/// Per-task stats: error count plus the last-known read progress at the
/// point validation stopped.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Number of collected errors
    pub errors: usize,
    /// Bytes consumed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    /// Schema field count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<usize>,
    /// Data rows checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    /// MD5 digest of the consumed bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    /// SHA-256 digest of the consumed bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// The outcome of validating one resource.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTask {
    /// Resource name
    pub name: String,
    /// Human-readable resource location
    pub place: String,
    /// Whether the resource was tabular
    pub tabular: bool,
    /// Elapsed seconds
    pub time: f64,
    /// Error codes that were in effect for the run
    pub scope: Vec<String>,
    /// True when the run stopped early due to a limit
    pub partial: bool,
    /// Collected errors, in discovery order
    pub errors: Vec<ValidationError>,
    /// Non-fatal advisories
    pub warnings: Vec<String>,
    /// Task stats
    pub stats: TaskStats,
    /// True when no errors were collected
    pub valid: bool,
}

impl ReportTask {
    /// Renders a fixed-width summary of this task.
    pub fn to_summary(&self) -> String {
        let mut output = String::new();
        for warning in &self.warnings {
            output.push_str(&format!("> {}\n\n", warning));
        }

        let mut rows_checked = self
            .stats
            .rows
            .map(|rows| rows.to_string())
            .unwrap_or_else(|| "-".to_string());
        if self.partial {
            rows_checked.push_str(" (partial)");
        }
        let mut content: Vec<(String, String)> = vec![
            ("File Place".to_string(), self.place.clone()),
            (
                "File Size".to_string(),
                self.stats
                    .bytes
                    .map(|bytes| format!("{} Bytes", bytes))
                    .unwrap_or_else(|| "(not available)".to_string()),
            ),
            ("Total Time".to_string(), format!("{:.3} Seconds", self.time)),
            ("Rows Checked".to_string(), rows_checked),
        ];
        if !self.errors.is_empty() {
            content.push(("Total Errors".to_string(), self.errors.len().to_string()));
            for (name, count) in error_histogram(&self.errors) {
                content.push((name, count.to_string()));
            }
        }
        output.push_str(&name_value_table(&content));
        output
    }
}

/// Run-wide stats.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportStats {
    /// Total errors across tasks and the report itself
    pub errors: usize,
    /// Number of tasks
    pub tasks: usize,
}

/// The full outcome of a validation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Engine version that produced the report
    pub version: String,
    /// Elapsed seconds
    pub time: f64,
    /// True when no task or top-level errors exist
    pub valid: bool,
    /// Run-wide stats
    pub stats: ReportStats,
    /// Errors not tied to any one resource
    pub errors: Vec<ValidationError>,
    /// One task per validated resource, input order preserved
    pub tasks: Vec<ReportTask>,
}

impl Report {
    /// Assembles a report from finished tasks and top-level errors.
    pub fn from_validation(
        time: f64,
        tasks: Vec<ReportTask>,
        errors: Vec<ValidationError>,
    ) -> Self {
        let error_count = errors.len() + tasks.iter().map(|t| t.stats.errors).sum::<usize>();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            time,
            valid: error_count == 0,
            stats: ReportStats {
                errors: error_count,
                tasks: tasks.len(),
            },
            errors,
            tasks,
        }
    }

    /// Merges several reports into one, preserving task order.
    pub fn from_validation_reports(time: f64, reports: Vec<Report>) -> Self {
        let mut tasks = Vec::new();
        let mut errors = Vec::new();
        for report in reports {
            tasks.extend(report.tasks);
            errors.extend(report.errors);
        }
        Self::from_validation(time, tasks, errors)
    }

    /// The single task of a one-resource report.
    pub fn task(&self) -> Option<&ReportTask> {
        match self.tasks.as_slice() {
            [task] => Some(task),
            _ => None,
        }
    }

    /// Projects every error into tuples of the requested descriptor fields.
    ///
    /// Top-level errors come first, then tasks in task order, then each
    /// task's errors in discovery order. Missing fields project as `Null`.
    pub fn flatten(&self, spec: &[&str]) -> Vec<Vec<Value>> {
        let mut result = Vec::new();
        for error in &self.errors {
            let descriptor = error.to_descriptor();
            result.push(
                spec.iter()
                    .map(|prop| descriptor.get(*prop).cloned().unwrap_or(Value::Null))
                    .collect(),
            );
        }
        for (number, task) in self.tasks.iter().enumerate() {
            for error in &task.errors {
                let mut descriptor = error.to_descriptor();
                descriptor.insert("taskNumber".to_string(), Value::from(number + 1));
                result.push(
                    spec.iter()
                        .map(|prop| descriptor.get(*prop).cloned().unwrap_or(Value::Null))
                        .collect(),
                );
            }
        }
        result
    }

    /// Renders a fixed-width text summary of the whole report.
    pub fn to_summary(&self) -> String {
        let mut output = String::new();
        for task in &self.tasks {
            let prefix = if task.valid { "valid" } else { "invalid" };
            let suffix = if task.tabular { "" } else { " (non-tabular)" };
            output.push_str(&format!("# {}\n", "-".repeat(prefix.len())));
            output.push_str(&format!("# {}: {}{}\n", prefix, task.place, suffix));
            output.push_str(&format!("# {}\n\n", "-".repeat(prefix.len())));
            output.push_str(&task.to_summary());
            output.push('\n');
        }
        output
    }
}

fn error_histogram(errors: &[ValidationError]) -> Vec<(String, usize)> {
    let mut histogram: Vec<(String, usize)> = Vec::new();
    for error in errors {
        let name = error.kind().name().to_string();
        match histogram.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, count)) => *count += 1,
            None => histogram.push((name, 1)),
        }
    }
    histogram
}

fn name_value_table(rows: &[(String, String)]) -> String {
    let name_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0);
    let separator = format!(
        "+{}+{}+\n",
        "-".repeat(name_width + 2),
        "-".repeat(value_width + 2)
    );
    let mut output = separator.clone();
    for (name, value) in rows {
        output.push_str(&format!(
            "| {:<name_width$} | {:<value_width$} |\n",
            name, value
        ));
        output.push_str(&separator);
    }
    output
}
