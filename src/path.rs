//! Dotted-path addressing for documents and schemas.
//!
//! Paths are sequences of explicit segments rather than joined strings, so a
//! field literally named `"$"` can never collide with the array wildcard.
//! Schema paths use [`PathSegment::Wildcard`] for "any array element"; real
//! paths (the addresses errors are reported at) use concrete
//! [`PathSegment::Index`] positions instead.

use serde_json::Value;
use std::fmt;

/// One step in a dotted path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Named object member.
    Field(String),
    /// Concrete array position (real paths only).
    Index(usize),
    /// Any array element (schema paths only).
    Wildcard,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{}", name),
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Wildcard => write!(f, "$"),
        }
    }
}

/// A dotted address identifying a position in a document or schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path addressing the document root.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Parses a dotted path string. `$` segments become wildcards and
    /// digit-only segments become concrete indices, so parsing cannot
    /// express a field literally named `"$"` or `"7"`; build those paths
    /// with [`Path::child`] instead.
    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Path::root();
        }
        let segments = path
            .split('.')
            .map(|part| {
                if part == "$" {
                    PathSegment::Wildcard
                } else if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) {
                    PathSegment::Index(part.parse().unwrap_or(0))
                } else {
                    PathSegment::Field(part.to_string())
                }
            })
            .collect();
        Path(segments)
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Path(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns this path extended by a named field segment.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Path(segments)
    }

    /// Returns this path extended by a concrete array index.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(i));
        Path(segments)
    }

    /// Returns this path extended by the array wildcard.
    pub fn wildcard(&self) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Wildcard);
        Path(segments)
    }

    /// Returns the path without its final segment, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Path(self.0[..self.0.len() - 1].to_vec()).into()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// True if `prefix` is a leading subsequence of this path.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Converts a real path into its schema form: every concrete index
    /// becomes the wildcard segment.
    pub fn to_schema_path(&self) -> Self {
        Path(
            self.0
                .iter()
                .map(|seg| match seg {
                    PathSegment::Index(_) => PathSegment::Wildcard,
                    other => other.clone(),
                })
                .collect(),
        )
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Path::parse(path)
    }
}

/// Result of resolving a path against a document. Wildcard segments fan out
/// over array elements, so one path may address many positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    /// No value at this path.
    Missing,
    /// A single addressed value.
    One(&'a Value),
    /// One entry per fanned-out array element; `None` marks elements where
    /// resolution fell short of the full path.
    Many(Vec<Option<&'a Value>>),
}

/// Resolves `path` against `doc`. A wildcard segment maps over the elements
/// of the array at that position; a field segment over an array likewise
/// fans out, mirroring how dotted lookups behave on arrays of documents.
pub fn get_path<'a>(doc: &'a Value, path: &Path) -> Resolved<'a> {
    walk(doc, path.segments())
}

fn walk<'a>(cur: &'a Value, segs: &[PathSegment]) -> Resolved<'a> {
    let Some((seg, rest)) = segs.split_first() else {
        return Resolved::One(cur);
    };
    match seg {
        PathSegment::Field(name) => match cur {
            Value::Object(map) => match map.get(name) {
                Some(v) => walk(v, rest),
                None => Resolved::Missing,
            },
            Value::Array(items) => fan_out(items.iter().map(|item| walk(item, segs))),
            _ => Resolved::Missing,
        },
        PathSegment::Index(i) => match cur {
            Value::Array(items) => match items.get(*i) {
                Some(v) => walk(v, rest),
                None => Resolved::Missing,
            },
            _ => Resolved::Missing,
        },
        PathSegment::Wildcard => match cur {
            Value::Array(items) => fan_out(items.iter().map(|item| walk(item, rest))),
            _ => Resolved::Missing,
        },
    }
}

fn fan_out<'a>(results: impl Iterator<Item = Resolved<'a>>) -> Resolved<'a> {
    let mut out = Vec::new();
    for res in results {
        match res {
            Resolved::Missing => out.push(None),
            Resolved::One(v) => out.push(Some(v)),
            Resolved::Many(vs) => out.extend(vs),
        }
    }
    Resolved::Many(out)
}

/// Deep-sets `value` at `path`, creating missing intermediate objects for
/// field segments. Index segments require the array and position to already
/// exist; out-of-range sets are ignored.
pub fn set_path(doc: &mut Value, path: &Path, value: Value) {
    set_walk(doc, path.segments(), value);
}

fn set_walk(cur: &mut Value, segs: &[PathSegment], value: Value) {
    let Some((seg, rest)) = segs.split_first() else {
        *cur = value;
        return;
    };
    match seg {
        PathSegment::Field(name) => {
            if !cur.is_object() {
                if cur.is_null() {
                    *cur = Value::Object(serde_json::Map::new());
                } else {
                    return;
                }
            }
            let map = match cur.as_object_mut() {
                Some(map) => map,
                None => return,
            };
            let slot = map.entry(name.clone()).or_insert(Value::Null);
            if rest.is_empty() {
                *slot = value;
            } else {
                set_walk(slot, rest, value);
            }
        }
        PathSegment::Index(i) => {
            if let Value::Array(items) = cur {
                if let Some(slot) = items.get_mut(*i) {
                    set_walk(slot, rest, value);
                }
            }
        }
        PathSegment::Wildcard => {
            if let Value::Array(items) = cur {
                for slot in items.iter_mut() {
                    set_walk(slot, rest, value.clone());
                }
            }
        }
    }
}
