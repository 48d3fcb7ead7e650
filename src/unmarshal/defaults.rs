//! Defaulting pass: fills absent positions before any casting runs.
//!
//! Targets are collected with an immutable walk first, then filled one at a
//! time so computed defaults observe the document as it stands when each
//! fill happens. Filling creates missing intermediate objects down a chain
//! of named fields; absent arrays are never invented, so defaults on
//! wildcard paths only fill elements of arrays the input supplied.

use crate::path::{set_path, Path, PathSegment};
use crate::schema::CompiledSchema;
use log::trace;
use serde_json::Value;

use super::projection::ResolvedProjection;

/// Applies every projected-in default in declaration order.
pub(crate) fn apply_defaults(
    document: &mut Value,
    schema: &CompiledSchema,
    projection: &ResolvedProjection,
) {
    if projection.suppress_defaults {
        return;
    }
    for (path, spec) in schema.paths() {
        let Some(rule) = &spec.default else {
            continue;
        };
        if projection.skips(path) {
            continue;
        }
        let mut targets = Vec::new();
        collect_targets(document, path.segments(), Path::root(), &mut targets);
        for target in targets {
            trace!("default fill at \"{}\"", target);
            let value = rule.produce(document);
            set_path(document, &target, value);
        }
    }
}

/// Collects real paths whose current value is absent or null. A wildcard
/// fans out per element; a path resolving to an array marks its null
/// elements individually.
fn collect_targets(current: &Value, segments: &[PathSegment], real: Path, out: &mut Vec<Path>) {
    let Some((segment, rest)) = segments.split_first() else {
        match current {
            Value::Null => out.push(real),
            // Array paths fill individual absent elements.
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_null() {
                        out.push(real.index(index));
                    }
                }
            }
            _ => {}
        }
        return;
    };

    match segment {
        PathSegment::Field(name) => {
            if let Value::Object(map) = current {
                match map.get(name) {
                    // An absent or null parent is created on fill, but only
                    // down a chain of named fields; arrays are not invented.
                    Some(Value::Null) | None if !rest.is_empty() => {
                        if rest.iter().all(|seg| matches!(seg, PathSegment::Field(_))) {
                            let mut target = real.child(name);
                            for seg in rest {
                                if let PathSegment::Field(next) = seg {
                                    target = target.child(next);
                                }
                            }
                            out.push(target);
                        }
                    }
                    Some(child) => collect_targets(child, rest, real.child(name), out),
                    None => out.push(real.child(name)),
                }
            }
        }
        PathSegment::Wildcard => {
            if let Value::Array(items) = current {
                for (index, item) in items.iter().enumerate() {
                    collect_targets(item, rest, real.index(index), out);
                }
            }
        }
        PathSegment::Index(i) => {
            if let Value::Array(items) = current {
                if let Some(item) = items.get(*i) {
                    collect_targets(item, rest, real.index(*i), out);
                }
            }
        }
    }
}
