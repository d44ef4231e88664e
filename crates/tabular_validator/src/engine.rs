//! Validation engine.
//!
//! Drives one resource's row stream through the connected checks under the
//! checklist's policies, and fans out independent resources for package
//! validation. The entry points never return `Err`: fatal input problems
//! become reports with top-level errors.

use crate::checks::{self, BaselineCheck, CheckInstance, ObservedStats, TableContext};
use crate::header::Header;
use crate::report::{Report, ReportTask, TaskStats};
use crate::row::{FieldInfo, Row};
use crate::source::Resource;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tabular_core::{Check, Checklist, ErrorKind, ValidationError};
use tracing::{debug, warn};

// Memory is sampled every this many rows, not per-row, to bound overhead
const MEMORY_SAMPLE_INTERVAL: u64 = 1000;

/// Validates a single resource against a checklist.
///
/// Always produces a report; a fatal input problem yields a report whose
/// task carries the error.
pub fn validate(resource: Resource, checklist: &Checklist) -> Report {
    let started = Instant::now();
    let task = validate_resource_task(resource, checklist);
    Report::from_validation(round3(started.elapsed().as_secs_f64()), vec![task], Vec::new())
}

/// Validates a package of resources against one checklist.
///
/// With `checklist.parallel` set, resources are validated concurrently as
/// independent sequential pipelines; the report's task order always matches
/// the input resource order.
pub fn validate_package(resources: Vec<Resource>, checklist: &Checklist) -> Report {
    let started = Instant::now();
    let tasks: Vec<ReportTask> = if checklist.parallel {
        resources
            .into_par_iter()
            .map(|resource| validate_resource_task(resource, checklist))
            .collect()
    } else {
        resources
            .into_iter()
            .map(|resource| validate_resource_task(resource, checklist))
            .collect()
    };
    Report::from_validation(round3(started.elapsed().as_secs_f64()), tasks, Vec::new())
}

fn validate_resource_task(mut resource: Resource, checklist: &Checklist) -> ReportTask {
    let started = Instant::now();
    debug!(resource = %resource.name, "validating resource");

    let scope: Vec<String> = checklist.scope().iter().map(|s| s.to_string()).collect();
    let mut sink = ErrorSink::new(checklist);
    let mut warnings: Vec<String> = Vec::new();
    let mut partial = false;

    if let Some((algorithm, _)) = resource.declared.hash_parts() {
        if algorithm != "md5" && algorithm != "sha256" {
            warnings.push("hash is ignored; supported algorithms: md5/sha256".to_string());
        }
    }

    // Bind checks: baseline first, unconditionally; invalid configurations
    // are dropped and surfaced, not silently ignored
    let mut checks: Vec<Box<dyn CheckInstance>> = vec![Box::new(BaselineCheck)];
    for check in &checklist.checks {
        if matches!(check, Check::Baseline) {
            continue;
        }
        match checks::connect(check) {
            Ok(instance) => checks.push(instance),
            Err(error) => sink.push(error),
        }
    }

    if let Err(error) = resource.source.open() {
        sink.push_forced(error);
        resource.source.close();
        let errors = sink.into_errors();
        return ReportTask {
            name: resource.name,
            place: resource.place,
            tabular: resource.tabular,
            time: round3(started.elapsed().as_secs_f64()),
            scope,
            partial,
            valid: errors.is_empty(),
            stats: TaskStats {
                errors: errors.len(),
                ..Default::default()
            },
            errors,
            warnings,
        };
    }

    let header = match resource.source.labels() {
        Some(labels) => Header::new(labels, &resource.schema, vec![1], resource.ignore_case),
        None => Header::from_schema(&resource.schema),
    };

    // Peek the first data row so the start phase knows whether data exists
    let mut pending = resource.source.next_row();
    let has_data = pending.is_some();

    let start_context = TableContext {
        schema: &resource.schema,
        tabular: resource.tabular,
        declared: &resource.declared,
        header: Some(&header),
        has_data,
        stats: ObservedStats::default(),
    };
    run_phase(&mut checks, &mut sink, "start", |check| {
        check.validate_start(&start_context)
    });

    let field_info = FieldInfo::from_schema(&resource.schema);
    let header_present = !header.missing();
    let mut rows_seen: u64 = 0;

    while let Some(cells) = pending.take().or_else(|| resource.source.next_row()) {
        rows_seen += 1;
        let row_number = if header_present { rows_seen + 1 } else { rows_seen };
        let row = Row::new(cells, Arc::clone(&field_info), row_number, checklist.original);

        run_phase(&mut checks, &mut sink, "row", |check| check.validate_row(&row));

        if sink.at_limit() {
            warnings.push(format!("reached error limit: {}", checklist.limit_errors));
            partial = true;
            break;
        }

        if checklist.limit_memory > 0 && rows_seen % MEMORY_SAMPLE_INTERVAL == 0 {
            if let Some(usage) = memory_stats::memory_stats() {
                let megabytes = usage.physical_mem / (1024 * 1024);
                if megabytes > checklist.limit_memory {
                    warn!(
                        megabytes,
                        limit = checklist.limit_memory,
                        "memory limit exceeded"
                    );
                    sink.push_forced(ValidationError::new(
                        ErrorKind::TaskError,
                        format!("exceeded memory limit \"{}MB\"", checklist.limit_memory),
                    ));
                    warnings.push(format!(
                        "reached memory limit: {}MB",
                        checklist.limit_memory
                    ));
                    partial = true;
                    break;
                }
            }
        }
    }

    let source_stats = resource.source.stats();
    let observed = ObservedStats {
        bytes: source_stats.bytes,
        md5: source_stats.md5,
        sha256: source_stats.sha256,
        fields: resource.schema.fields.len(),
        rows: rows_seen,
    };

    // The end phase only runs on complete streams; stats of a truncated
    // stream would produce misleading count errors
    if !partial {
        let end_context = TableContext {
            schema: &resource.schema,
            tabular: resource.tabular,
            declared: &resource.declared,
            header: Some(&header),
            has_data,
            stats: observed.clone(),
        };
        run_phase(&mut checks, &mut sink, "end", |check| {
            check.validate_end(&end_context)
        });
    }

    resource.source.close();

    let errors = sink.into_errors();
    ReportTask {
        name: resource.name,
        place: resource.place,
        tabular: resource.tabular,
        time: round3(started.elapsed().as_secs_f64()),
        scope,
        partial,
        valid: errors.is_empty(),
        stats: TaskStats {
            errors: errors.len(),
            bytes: Some(observed.bytes),
            fields: Some(observed.fields),
            rows: Some(observed.rows),
            md5: Some(observed.md5).filter(|digest| !digest.is_empty()),
            sha256: Some(observed.sha256).filter(|digest| !digest.is_empty()),
        },
        errors,
        warnings,
    }
}

/// Runs one lifecycle phase over every connected check.
///
/// A check that reports its own misconfiguration (a check error) or panics
/// aborts only its own contribution: it is dropped from the remaining
/// phases while all sibling checks continue.
fn run_phase(
    checks: &mut Vec<Box<dyn CheckInstance>>,
    sink: &mut ErrorSink,
    phase: &str,
    mut call: impl FnMut(&mut Box<dyn CheckInstance>) -> Vec<ValidationError>,
) {
    let mut index = 0;
    while index < checks.len() {
        let code = checks[index].code();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| call(&mut checks[index])));
        match outcome {
            Ok(errors) => {
                let broken = errors.iter().any(|e| e.kind() == ErrorKind::CheckError);
                for error in errors {
                    sink.push(error);
                }
                if broken {
                    checks.remove(index);
                    continue;
                }
                index += 1;
            }
            Err(payload) => {
                let note = panic_note(payload.as_ref());
                sink.push(ValidationError::new(
                    ErrorKind::CheckError,
                    format!("check \"{}\" failed in the {} phase: {}", code, phase, note),
                ));
                checks.remove(index);
            }
        }
    }
}

fn panic_note(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    "unexpected panic".to_string()
}

/// Collects errors for one run, applying the checklist's skip/pick filters
/// and capping at the error limit.
struct ErrorSink<'a> {
    checklist: &'a Checklist,
    errors: Vec<ValidationError>,
}

impl<'a> ErrorSink<'a> {
    fn new(checklist: &'a Checklist) -> Self {
        Self {
            checklist,
            errors: Vec::new(),
        }
    }

    fn push(&mut self, error: ValidationError) {
        if self.at_limit() {
            return;
        }
        if self.checklist.matches(&error) {
            self.errors.push(error);
        }
    }

    // Fatal task conditions bypass the filters but still respect the cap
    fn push_forced(&mut self, error: ValidationError) {
        if self.at_limit() {
            return;
        }
        self.errors.push(error);
    }

    fn at_limit(&self) -> bool {
        self.checklist.limit_errors > 0 && self.errors.len() >= self.checklist.limit_errors
    }

    fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

fn round3(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
