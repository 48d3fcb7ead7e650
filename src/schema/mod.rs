//! Schema subsystem: declaration types, the compiler that flattens a
//! declaration into a path table, and the compiled schema with its algebra.
//!
//! # Design principles
//!
//! - Declarations are explicitly tagged trees; nothing is inferred from
//!   marker keys.
//! - Compilation happens once; the flat path table is read-only afterwards.
//! - Every algebra operation rewrites the declaration and recompiles, so
//!   the tree and the table never diverge.
//! - Mutable composite defaults are rejected at compile time.

mod compiled;
mod compiler;
mod errors;
mod types;

pub use compiled::CompiledSchema;
pub use errors::{SchemaError, SchemaResult};
pub use types::{
    declaration, CastType, Declaration, DefaultRule, FieldKind, FieldSpec, PathSpec, PathTable,
    RequiredRule, SchemaNode, TypeKind, ValidateFn,
};
