//! Recursive cast-and-prune pass.
//!
//! Walks the document and the path table together, carrying two addresses
//! per position: the real path (concrete indices, used for error reporting)
//! and its schema form (wildcards, used for table lookups). Undeclared and
//! projected-out keys are deleted; scalar leaves are cast in place; failures
//! are recorded and the walk continues.

use crate::path::Path;
use crate::schema::{CompiledSchema, TypeKind};
use log::trace;
use serde_json::Value;

use super::cast::cast_value;
use super::error::{ErrorReport, FieldError};
use super::projection::ResolvedProjection;

/// Runs the cast-and-prune walk from the document root.
pub(crate) fn cast_document(
    document: &mut Value,
    schema: &CompiledSchema,
    projection: &ResolvedProjection,
    report: &mut ErrorReport,
) {
    visit_object(document, schema, projection, &Path::root(), report);
}

fn visit_object(
    value: &mut Value,
    schema: &CompiledSchema,
    projection: &ResolvedProjection,
    real_path: &Path,
    report: &mut ErrorReport,
) {
    trace!("visit object at \"{}\"", real_path);
    if !value.is_object() {
        // Arrays are a cast failure at an object position too.
        report.mark(
            real_path.clone(),
            FieldError::Structure {
                value: value.to_string(),
            },
        );
        return;
    }

    let schema_path = real_path.to_schema_path();
    if !schema_path.is_root() {
        match schema.spec_at(&schema_path) {
            // Typed object leaf: the schema holds no open schema here, so
            // the value passes through without pruning.
            Some(spec) if spec.schema.is_none() => return,
            Some(_) => {}
            None => return,
        }
    }

    let Some(map) = value.as_object_mut() else {
        return;
    };
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        let child_schema_path = schema_path.child(&key);
        let Some(child_spec) = schema.spec_at(&child_schema_path) else {
            trace!("prune undeclared \"{}\"", child_schema_path);
            map.remove(&key);
            continue;
        };
        if projection.skips(&child_schema_path) {
            trace!("prune projected-out \"{}\"", child_schema_path);
            map.remove(&key);
            continue;
        }
        let Some(kind) = &child_spec.kind else {
            // Typeless descriptor: no casting, value left untouched.
            continue;
        };

        let real_child = real_path.child(&key);
        match kind {
            TypeKind::Array => {
                if let Some(child) = map.get_mut(&key) {
                    visit_array(child, schema, projection, &real_child, report);
                }
            }
            TypeKind::Object => {
                // An explicit null object is treated as absent.
                if matches!(map.get(&key), Some(Value::Null)) {
                    map.remove(&key);
                    continue;
                }
                if let Some(child) = map.get_mut(&key) {
                    visit_object(child, schema, projection, &real_child, report);
                }
            }
            kind => {
                if let Some(child) = map.get_mut(&key) {
                    match cast_value(child, kind) {
                        Ok(cast) => *child = cast,
                        Err(error) => report.mark(real_child, error),
                    }
                }
            }
        }
    }
}

fn visit_array(
    value: &mut Value,
    schema: &CompiledSchema,
    projection: &ResolvedProjection,
    real_path: &Path,
    report: &mut ErrorReport,
) {
    trace!("visit array at \"{}\"", real_path);
    let element_path = real_path.to_schema_path().wildcard();
    let element_kind = match schema.spec_at(&element_path) {
        Some(spec) => match &spec.kind {
            Some(kind) => kind.clone(),
            // Untyped elements: no casting.
            None => return,
        },
        None => return,
    };

    if value.is_null() {
        return;
    }
    if !value.is_array() {
        // A lone value is accepted wherever an array was declared.
        *value = Value::Array(vec![value.take()]);
    }
    let Some(items) = value.as_array_mut() else {
        return;
    };

    for (index, item) in items.iter_mut().enumerate() {
        let real_element = real_path.index(index);
        match &element_kind {
            TypeKind::Array => {
                visit_array(item, schema, projection, &real_element, report);
            }
            TypeKind::Object => {
                // Null elements pass through at object positions; the
                // required pass decides whether that is acceptable.
                if item.is_null() {
                    continue;
                }
                visit_object(item, schema, projection, &real_element, report);
            }
            kind => match cast_value(item, kind) {
                Ok(cast) => *item = cast,
                Err(error) => report.mark(real_element, error),
            },
        }
    }
}
