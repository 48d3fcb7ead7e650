//! Schema compile-time errors.
//!
//! These indicate schema-authoring bugs, not bad input documents, so they
//! surface immediately instead of being aggregated per path.

use thiserror::Error;

/// Result type for schema compilation and algebra.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while compiling or rewriting a schema declaration.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// A non-empty object or array used directly as a default. Every
    /// unmarshalled document would alias the same composite; the default
    /// must be a function that returns a fresh value.
    #[error("default for \"{path}\" is a non-empty {found} literal; use a computed default that returns a fresh value")]
    MutableDefault { path: String, found: &'static str },

    /// A schema-algebra operation addressed a path the declaration cannot
    /// reach by named fields.
    #[error("no declared path \"{0}\"")]
    UnknownPath(String),
}
