//! Custom-validation pass: enum membership and author-supplied predicates.
//!
//! Absent values are skipped — required-ness is the previous pass's job.
//! Array handling differs by how the path reaches the array: a plain array
//! path is validated as a whole, a wildcard-reached position per element.

use crate::path::{Path, PathSegment};
use crate::schema::{CompiledSchema, PathSpec};
use log::trace;
use serde_json::Value;

use super::error::{ErrorReport, FieldError};
use super::projection::ResolvedProjection;

pub(crate) fn run_validation(
    document: &Value,
    schema: &CompiledSchema,
    projection: &ResolvedProjection,
) -> ErrorReport {
    let mut report = ErrorReport::new();
    for (path, spec) in schema.paths() {
        if spec.validate.is_none() && spec.allowed.is_none() {
            continue;
        }
        if projection.skips(path) {
            continue;
        }
        trace!("validation at \"{}\"", path);

        let mut positions = Vec::new();
        collect_positions(document, path.segments(), Path::root(), &mut positions);

        for (real, value) in positions {
            if value.is_null() {
                continue;
            }
            if let Some(allowed) = &spec.allowed {
                check_allowed(value, allowed, &real, &mut report);
            }
            if let Some(validate) = &spec.validate {
                run_validator(value, spec, document, &real, validate, &mut report);
            }
        }
    }
    report
}

fn check_allowed(value: &Value, allowed: &[Value], real: &Path, report: &mut ErrorReport) {
    match value {
        // Array positions check membership per element.
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if !allowed.contains(item) {
                    report.mark(real.index(index), enum_failure(item, allowed));
                }
            }
        }
        _ => {
            if !allowed.contains(value) {
                report.mark(real.clone(), enum_failure(value, allowed));
            }
        }
    }
}

fn enum_failure(value: &Value, allowed: &[Value]) -> FieldError {
    FieldError::Enum {
        value: value.to_string(),
        allowed: Value::Array(allowed.to_vec()).to_string(),
    }
}

fn run_validator(
    value: &Value,
    spec: &PathSpec,
    document: &Value,
    real: &Path,
    validate: &crate::schema::ValidateFn,
    report: &mut ErrorReport,
) {
    if let Err(message) = validate(value, spec, document) {
        report.mark(real.clone(), FieldError::Validation(message));
    }
}

/// Resolves a schema path to its concrete positions: one per fanned-out
/// array element for wildcard segments, with real indexed paths.
fn collect_positions<'a>(
    current: &'a Value,
    segments: &[PathSegment],
    real: Path,
    out: &mut Vec<(Path, &'a Value)>,
) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push((real, current));
        return;
    };
    match segment {
        PathSegment::Field(name) => {
            if let Value::Object(map) = current {
                if let Some(child) = map.get(name) {
                    collect_positions(child, rest, real.child(name), out);
                }
            }
        }
        PathSegment::Wildcard => {
            if let Value::Array(items) = current {
                for (index, item) in items.iter().enumerate() {
                    collect_positions(item, rest, real.index(index), out);
                }
            }
        }
        PathSegment::Index(i) => {
            if let Value::Array(items) = current {
                if let Some(item) = items.get(*i) {
                    collect_positions(item, rest, real.index(*i), out);
                }
            }
        }
    }
}
