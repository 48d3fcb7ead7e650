//! Aggregated unmarshal errors.
//!
//! Per-path failures are collected across all four passes and surfaced as a
//! single report; the pipeline never stops at the first bad field.

use crate::path::Path;
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// A single path-scoped failure.
#[derive(Debug, Clone, Error)]
pub enum FieldError {
    /// Value cannot be coerced to the declared scalar type.
    #[error("could not cast {value} to {target}")]
    Cast { value: String, target: String },

    /// Non-object value where the schema expects an object.
    #[error("could not cast {value} to object")]
    Structure { value: String },

    /// Declared-required path resolved to absent after casting/defaulting.
    #[error("path \"{0}\" is required")]
    Required(String),

    /// Value not in the declared allowed set.
    #[error("value {value} invalid, allowed values are {allowed}")]
    Enum { value: String, allowed: String },

    /// Author-supplied validator rejected the value.
    #[error("{0}")]
    Validation(String),
}

/// Ordered collection of per-path failures from one unmarshal call.
///
/// The first error recorded at a path wins; errors at distinct paths always
/// accumulate. Array element failures are keyed with real numeric indices.
#[derive(Debug, Clone, Default)]
pub struct ErrorReport {
    errors: IndexMap<Path, FieldError>,
}

impl ErrorReport {
    pub fn new() -> Self {
        ErrorReport::default()
    }

    /// Records `error` at `path` unless the path already has one.
    pub fn mark(&mut self, path: Path, error: FieldError) {
        self.errors.entry(path).or_insert(error);
    }

    /// Folds another report into this one, keeping existing entries.
    pub fn merge(&mut self, other: ErrorReport) {
        for (path, error) in other.errors {
            self.mark(path, error);
        }
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Looks up the failure recorded at a dotted path.
    pub fn get(&self, path: &str) -> Option<&FieldError> {
        self.errors.get(&Path::parse(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &FieldError)> {
        self.errors.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.errors.keys()
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, error) in &self.errors {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", path, error)?;
            first = false;
        }
        Ok(())
    }
}

/// Failure modes of one unmarshal call.
#[derive(Debug, Clone, Error)]
pub enum UnmarshalError {
    /// A null/absent top-level document is a hard failure, not a per-field
    /// one.
    #[error("cannot unmarshal a null document")]
    NullDocument,

    /// A projection carried both inclusion and exclusion markers.
    #[error("cannot mix inclusive and exclusive paths in a projection")]
    MixedProjection,

    /// One or more fields failed casting, required-checking, or validation.
    #[error("{0}")]
    Invalid(ErrorReport),
}

impl UnmarshalError {
    /// The per-path report, when this is an aggregated failure.
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            UnmarshalError::Invalid(report) => Some(report),
            _ => None,
        }
    }
}
