//! Schema compiler: flattens a nested declaration into the path table.
//!
//! Depth-first walk. Object nodes record an `Object` descriptor carrying
//! their raw child declaration and recurse per field; array nodes record an
//! `Array` descriptor and recurse on the element node under a wildcard
//! segment; terminal fields record their descriptor directly. The document
//! root itself gets no entry.

use crate::path::Path;
use log::trace;
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{
    Declaration, DefaultRule, FieldKind, FieldSpec, PathSpec, PathTable, SchemaNode, TypeKind,
};

/// Flattens `declaration` into a path table keyed by schema path.
pub(crate) fn compile_paths(declaration: &Declaration) -> SchemaResult<PathTable> {
    let mut table = PathTable::new();
    visit_group(declaration, &Path::root(), &mut table)?;
    Ok(table)
}

fn visit_group(group: &Declaration, path: &Path, table: &mut PathTable) -> SchemaResult<()> {
    if !path.is_root() {
        let mut spec = PathSpec::of(TypeKind::Object);
        spec.schema = Some(group.clone());
        table.insert(path.clone(), spec);
    }
    for (key, node) in group {
        visit_node(node, &path.child(key), table)?;
    }
    Ok(())
}

fn visit_node(node: &SchemaNode, path: &Path, table: &mut PathTable) -> SchemaResult<()> {
    trace!("compile visit {}", path);
    match node {
        SchemaNode::Group(group) => visit_group(group, path, table),
        SchemaNode::Array(element) => visit_array(element.as_deref(), path, table),
        SchemaNode::Field(spec) => visit_field(spec, path, table),
    }
}

fn visit_array(
    element: Option<&SchemaNode>,
    path: &Path,
    table: &mut PathTable,
) -> SchemaResult<()> {
    table.insert(path.clone(), PathSpec::of(TypeKind::Array));
    visit_element(element, &path.wildcard(), table)
}

fn visit_element(
    element: Option<&SchemaNode>,
    path: &Path,
    table: &mut PathTable,
) -> SchemaResult<()> {
    match element {
        None => {
            table.insert(path.clone(), PathSpec::of(TypeKind::Any));
            Ok(())
        }
        Some(SchemaNode::Array(inner)) => visit_array(inner.as_deref(), path, table),
        Some(SchemaNode::Group(group)) => visit_group(group, path, table),
        Some(SchemaNode::Field(spec)) => visit_field(spec, path, table),
    }
}

fn visit_field(spec: &FieldSpec, path: &Path, table: &mut PathTable) -> SchemaResult<()> {
    check_default(spec, path)?;
    match &spec.kind {
        // Inline "array of X": the descriptor's modifiers attach to the
        // array as a whole, the element compiles under the wildcard.
        Some(FieldKind::Array(element)) => {
            table.insert(path.clone(), terminal_spec(spec, TypeKind::Array));
            visit_element(element.as_deref(), &path.wildcard(), table)
        }
        Some(kind) => {
            let tag = scalar_kind(kind);
            table.insert(path.clone(), terminal_spec(spec, tag));
            Ok(())
        }
        None => {
            table.insert(
                path.clone(),
                PathSpec {
                    kind: None,
                    schema: None,
                    required: spec.required.clone(),
                    default: spec.default.clone(),
                    validate: spec.validate.clone(),
                    allowed: spec.allowed.clone(),
                    metadata: spec.metadata.clone(),
                },
            );
            Ok(())
        }
    }
}

fn terminal_spec(spec: &FieldSpec, kind: TypeKind) -> PathSpec {
    PathSpec {
        kind: Some(kind),
        schema: None,
        required: spec.required.clone(),
        default: spec.default.clone(),
        validate: spec.validate.clone(),
        allowed: spec.allowed.clone(),
        metadata: spec.metadata.clone(),
    }
}

fn scalar_kind(kind: &FieldKind) -> TypeKind {
    match kind {
        FieldKind::Number => TypeKind::Number,
        FieldKind::String => TypeKind::String,
        FieldKind::Boolean => TypeKind::Boolean,
        FieldKind::Object => TypeKind::Object,
        FieldKind::Any => TypeKind::Any,
        FieldKind::Custom(t) => TypeKind::Custom(t.clone()),
        // Dispatched before this point.
        FieldKind::Array(_) => TypeKind::Array,
    }
}

/// Rejects non-empty composite literals used as defaults. A shared mutable
/// composite would alias across independently unmarshalled documents; only
/// empty composites and computed defaults are accepted.
fn check_default(spec: &FieldSpec, path: &Path) -> SchemaResult<()> {
    let Some(DefaultRule::Literal(value)) = &spec.default else {
        return Ok(());
    };
    match value {
        Value::Object(map) if !map.is_empty() => Err(SchemaError::MutableDefault {
            path: path.to_string(),
            found: "object",
        }),
        Value::Array(items) if !items.is_empty() => Err(SchemaError::MutableDefault {
            path: path.to_string(),
            found: "array",
        }),
        _ => Ok(()),
    }
}
