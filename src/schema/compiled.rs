//! Compiled schema: the declaration plus its flattened path table.
//!
//! Algebra operations (`with_path`, `omit`, `pick`, `transform`) always edit
//! the declaration tree and recompile. The flat table is never patched in
//! place, so the two representations cannot diverge.

use crate::path::{Path, PathSegment};
use crate::unmarshal::{self, Projection, UnmarshalError};
use serde_json::Value;

use super::compiler::compile_paths;
use super::errors::{SchemaError, SchemaResult};
use super::types::{Declaration, FieldSpec, PathSpec, PathTable, SchemaNode};

/// A schema declaration flattened into a path table, ready to unmarshal
/// documents. Read-only once built; every rewrite produces a new instance.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    declaration: Declaration,
    paths: PathTable,
}

impl CompiledSchema {
    /// Compiles a declaration. Fails only when a default is a non-empty
    /// composite literal.
    pub fn compile(
        declaration: impl IntoIterator<Item = (impl Into<String>, SchemaNode)>,
    ) -> SchemaResult<Self> {
        let declaration: Declaration = declaration
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        let paths = compile_paths(&declaration)?;
        Ok(CompiledSchema { declaration, paths })
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    /// Iterates compiled descriptors in declaration order.
    pub fn paths(&self) -> impl Iterator<Item = (&Path, &PathSpec)> {
        self.paths.iter()
    }

    /// Looks up the compiled descriptor for a dotted path.
    pub fn path_spec(&self, path: &str) -> Option<&PathSpec> {
        self.spec_at(&Path::parse(path))
    }

    /// Segment-level lookup for paths [`Path::parse`] cannot express,
    /// such as a field literally named `"$"`.
    pub fn spec_at(&self, path: &Path) -> Option<&PathSpec> {
        self.paths.get(path)
    }

    /// Casts and validates `document` against this schema.
    pub fn unmarshal(
        &self,
        document: &Value,
        projection: Option<&Projection>,
    ) -> Result<Value, UnmarshalError> {
        unmarshal::unmarshal(document, self, projection)
    }

    /// Returns a new schema with `node` written at `path` in the
    /// declaration, creating intermediate groups as needed, then recompiled.
    pub fn with_path(&self, path: &str, node: SchemaNode) -> SchemaResult<Self> {
        let parsed = Path::parse(path);
        let names = field_names(&parsed)?;
        let Some((last, ancestors)) = names.split_last() else {
            return Err(SchemaError::UnknownPath(path.to_string()));
        };

        let mut declaration = self.declaration.clone();
        let mut cursor = &mut declaration;
        for name in ancestors {
            let entry = cursor
                .entry((*name).to_string())
                .or_insert_with(|| SchemaNode::Group(Declaration::new()));
            match entry {
                SchemaNode::Group(group) => cursor = group,
                _ => return Err(SchemaError::UnknownPath(path.to_string())),
            }
        }
        cursor.insert((*last).to_string(), node);
        CompiledSchema::compile(declaration)
    }

    /// Returns a new schema with the named field paths removed. Paths that
    /// do not resolve are ignored.
    pub fn omit<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> SchemaResult<Self> {
        let mut declaration = self.declaration.clone();
        for path in paths {
            remove_at(&mut declaration, &Path::parse(path));
        }
        CompiledSchema::compile(declaration)
    }

    /// Returns a new schema restricted to the named field paths. Paths that
    /// do not resolve are ignored.
    pub fn pick<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> SchemaResult<Self> {
        let mut declaration = Declaration::new();
        for path in paths {
            let parsed = Path::parse(path);
            if let Some(node) = node_at(&self.declaration, &parsed) {
                insert_at(&mut declaration, &parsed, node.clone())?;
            }
        }
        CompiledSchema::compile(declaration)
    }

    /// Rewrites every terminal descriptor top-down and recompiles. Descent
    /// stops at terminal descriptors; group and array structure is kept.
    pub fn transform(
        &self,
        f: impl Fn(&Path, &FieldSpec) -> FieldSpec,
    ) -> SchemaResult<Self> {
        let declaration = transform_group(&self.declaration, &Path::root(), &f);
        CompiledSchema::compile(declaration)
    }

    /// Visits every declared node depth-first in declaration order.
    pub fn each_path(&self, mut f: impl FnMut(&Path, &SchemaNode)) {
        each_in_group(&self.declaration, &Path::root(), &mut f);
    }
}

/// Declaration navigation uses named fields only; array elements have no
/// stable address in the declaration tree.
fn field_names(path: &Path) -> SchemaResult<Vec<&str>> {
    path.segments()
        .iter()
        .map(|seg| match seg {
            PathSegment::Field(name) => Ok(name.as_str()),
            _ => Err(SchemaError::UnknownPath(path.to_string())),
        })
        .collect()
}

fn node_at<'a>(declaration: &'a Declaration, path: &Path) -> Option<&'a SchemaNode> {
    let names = field_names(path).ok()?;
    let (first, rest) = names.split_first()?;
    let mut node = declaration.get(*first)?;
    for name in rest {
        match node {
            SchemaNode::Group(group) => node = group.get(*name)?,
            _ => return None,
        }
    }
    Some(node)
}

fn remove_at(declaration: &mut Declaration, path: &Path) {
    let Ok(names) = field_names(path) else {
        return;
    };
    let Some((last, ancestors)) = names.split_last() else {
        return;
    };
    let mut cursor = declaration;
    for name in ancestors {
        match cursor.get_mut(*name) {
            Some(SchemaNode::Group(group)) => cursor = group,
            _ => return,
        }
    }
    cursor.shift_remove(*last);
}

fn insert_at(declaration: &mut Declaration, path: &Path, node: SchemaNode) -> SchemaResult<()> {
    let names = field_names(path)?;
    let Some((last, ancestors)) = names.split_last() else {
        return Err(SchemaError::UnknownPath(path.to_string()));
    };
    let mut cursor = declaration;
    for name in ancestors {
        let entry = cursor
            .entry((*name).to_string())
            .or_insert_with(|| SchemaNode::Group(Declaration::new()));
        match entry {
            SchemaNode::Group(group) => cursor = group,
            _ => return Err(SchemaError::UnknownPath(path.to_string())),
        }
    }
    cursor.insert((*last).to_string(), node);
    Ok(())
}

fn transform_group(
    group: &Declaration,
    path: &Path,
    f: &impl Fn(&Path, &FieldSpec) -> FieldSpec,
) -> Declaration {
    group
        .iter()
        .map(|(key, node)| (key.clone(), transform_node(node, &path.child(key), f)))
        .collect()
}

fn transform_node(
    node: &SchemaNode,
    path: &Path,
    f: &impl Fn(&Path, &FieldSpec) -> FieldSpec,
) -> SchemaNode {
    match node {
        SchemaNode::Field(spec) => SchemaNode::Field(f(path, spec)),
        SchemaNode::Group(group) => SchemaNode::Group(transform_group(group, path, f)),
        SchemaNode::Array(element) => SchemaNode::Array(
            element
                .as_deref()
                .map(|elem| Box::new(transform_node(elem, &path.wildcard(), f))),
        ),
    }
}

fn each_in_group(group: &Declaration, path: &Path, f: &mut impl FnMut(&Path, &SchemaNode)) {
    for (key, node) in group {
        each_node(node, &path.child(key), f);
    }
}

fn each_node(node: &SchemaNode, path: &Path, f: &mut impl FnMut(&Path, &SchemaNode)) {
    f(path, node);
    match node {
        SchemaNode::Field(_) => {}
        SchemaNode::Group(group) => each_in_group(group, path, f),
        SchemaNode::Array(element) => {
            if let Some(elem) = element.as_deref() {
                each_node(elem, &path.wildcard(), f);
            }
        }
    }
}
