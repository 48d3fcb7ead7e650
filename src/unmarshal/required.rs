//! Required-checking pass.
//!
//! Runs over the path table after casting, so values supplied by defaulting
//! or successfully cast count as present. Wildcard paths are checked with
//! per-element absence detection: each absent element reports at its real
//! indexed path, while an unreachable container reports once at the schema
//! path.

use crate::path::{Path, PathSegment};
use crate::schema::CompiledSchema;
use log::trace;
use serde_json::Value;

use super::error::{ErrorReport, FieldError};
use super::projection::ResolvedProjection;

pub(crate) fn check_required(
    document: &Value,
    schema: &CompiledSchema,
    projection: &ResolvedProjection,
) -> ErrorReport {
    let mut report = ErrorReport::new();
    if projection.suppress_required {
        return report;
    }
    for (path, spec) in schema.paths() {
        let Some(rule) = &spec.required else {
            continue;
        };
        if projection.skips(path) {
            continue;
        }
        if !rule.evaluate(document) {
            continue;
        }
        trace!("required check at \"{}\"", path);
        check_at(document, path.segments(), Path::root(), path, &mut report);
    }
    report
}

fn check_at(
    current: &Value,
    segments: &[PathSegment],
    real: Path,
    schema_path: &Path,
    report: &mut ErrorReport,
) {
    let Some((segment, rest)) = segments.split_first() else {
        match current {
            Value::Null => mark_missing(report, real),
            // An array path is absent if any element is.
            Value::Array(items) if items.iter().any(Value::is_null) => {
                mark_missing(report, real)
            }
            _ => {}
        }
        return;
    };

    match segment {
        PathSegment::Field(name) => match current {
            Value::Object(map) => match map.get(name) {
                Some(child) => check_at(child, rest, real.child(name), schema_path, report),
                None => mark_missing(report, schema_path.clone()),
            },
            // Container unreachable; report once at the schema path.
            _ => mark_missing(report, schema_path.clone()),
        },
        PathSegment::Wildcard => match current {
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    check_at(item, rest, real.index(index), schema_path, report);
                }
            }
            _ => mark_missing(report, schema_path.clone()),
        },
        PathSegment::Index(i) => match current {
            Value::Array(items) => match items.get(*i) {
                Some(item) => check_at(item, rest, real.index(*i), schema_path, report),
                None => mark_missing(report, schema_path.clone()),
            },
            _ => mark_missing(report, schema_path.clone()),
        },
    }
}

fn mark_missing(report: &mut ErrorReport, at: Path) {
    let message = at.to_string();
    report.mark(at, FieldError::Required(message));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{declaration, CompiledSchema, FieldKind, FieldSpec, SchemaNode};
    use serde_json::json;

    fn check(schema: &CompiledSchema, doc: Value) -> ErrorReport {
        let projection = ResolvedProjection::resolve(None).unwrap();
        check_required(&doc, schema, &projection)
    }

    #[test]
    fn test_missing_required_field() {
        let schema = CompiledSchema::compile(declaration([(
            "name",
            SchemaNode::field(FieldSpec::of(FieldKind::String).required()),
        )]))
        .unwrap();
        let report = check(&schema, json!({}));
        assert!(matches!(report.get("name"), Some(FieldError::Required(_))));
        assert!(check(&schema, json!({ "name": "x" })).is_empty());
    }

    #[test]
    fn test_null_counts_as_absent() {
        let schema = CompiledSchema::compile(declaration([(
            "name",
            SchemaNode::field(FieldSpec::of(FieldKind::String).required()),
        )]))
        .unwrap();
        assert!(check(&schema, json!({ "name": null })).has_error());
    }

    #[test]
    fn test_array_element_required_reports_per_element() {
        let schema = CompiledSchema::compile(declaration([(
            "names",
            SchemaNode::array_of(SchemaNode::field(
                FieldSpec::of(FieldKind::String).required(),
            )),
        )]))
        .unwrap();
        let report = check(&schema, json!({ "names": ["a", null] }));
        assert_eq!(report.len(), 1);
        assert!(matches!(report.get("names.1"), Some(FieldError::Required(_))));
    }

    #[test]
    fn test_required_function_of_document() {
        let schema = CompiledSchema::compile(declaration([
            ("kind", SchemaNode::string()),
            (
                "detail",
                SchemaNode::field(FieldSpec::of(FieldKind::String).required_when(|doc| {
                    doc.get("kind").and_then(|v| v.as_str()) == Some("full")
                })),
            ),
        ]))
        .unwrap();
        assert!(check(&schema, json!({ "kind": "full" })).has_error());
        assert!(check(&schema, json!({ "kind": "lite" })).is_empty());
    }

    #[test]
    fn test_suppressed_by_projection_flag() {
        let schema = CompiledSchema::compile(declaration([(
            "name",
            SchemaNode::field(FieldSpec::of(FieldKind::String).required()),
        )]))
        .unwrap();
        let projection = ResolvedProjection::resolve(Some(
            &crate::unmarshal::Projection::new().without_required(),
        ))
        .unwrap();
        assert!(check_required(&json!({}), &schema, &projection).is_empty());
    }

    #[test]
    fn test_required_array_with_null_element() {
        let schema = CompiledSchema::compile(declaration([(
            "tags",
            SchemaNode::field(
                FieldSpec::of(FieldKind::Array(Some(Box::new(SchemaNode::string()))))
                    .required(),
            ),
        )]))
        .unwrap();
        // Required on the array itself: any null element makes it absent.
        let report = check(&schema, json!({ "tags": ["a", null] }));
        assert!(matches!(report.get("tags"), Some(FieldError::Required(_))));
        assert!(check(&schema, json!({ "tags": ["a"] })).is_empty());
    }
}
