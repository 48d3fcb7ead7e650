//! schemacast - a strict, schema-driven document caster and validator
//!
//! A nested schema declaration is compiled into a flat path table; an
//! arbitrary input document is then unmarshalled against it: fields are
//! coerced to their declared types, filled with defaults, checked for
//! required-ness, validated against custom predicates and enumerations, and
//! filtered by a projection — or the call fails with one aggregated,
//! per-path error report.
//!
//! Everything runs in memory, synchronously, on one document at a time. A
//! compiled schema is read-only and safe to share across threads; every
//! unmarshal call works on its own clone of the input.
//!
//! ```
//! use schemacast::{declaration, CompiledSchema, FieldKind, FieldSpec, SchemaNode};
//! use serde_json::json;
//!
//! let schema = CompiledSchema::compile(declaration([
//!     ("name", SchemaNode::field(FieldSpec::of(FieldKind::String).required())),
//!     ("age", SchemaNode::number()),
//!     ("tags", SchemaNode::array_of(SchemaNode::string())),
//! ]))
//! .unwrap();
//!
//! let doc = schema
//!     .unmarshal(&json!({ "name": "ann", "age": "42", "junk": true }), None)
//!     .unwrap();
//! assert_eq!(doc, json!({ "name": "ann", "age": 42 }));
//! ```

pub mod path;
pub mod schema;
pub mod unmarshal;

pub use path::{get_path, set_path, Path, PathSegment, Resolved};
pub use schema::{
    declaration, CastType, CompiledSchema, Declaration, DefaultRule, FieldKind, FieldSpec,
    PathSpec, PathTable, RequiredRule, SchemaError, SchemaNode, SchemaResult, TypeKind,
    ValidateFn,
};
pub use unmarshal::{unmarshal, ErrorReport, FieldError, Projection, UnmarshalError};
