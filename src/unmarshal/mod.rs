//! Unmarshal pipeline: projection resolution, defaulting, recursive
//! cast-and-prune, required checking, and custom validation, in that fixed
//! order. Later passes observe the document state left by earlier ones.
//!
//! Errors from all passes are merged into one report keyed by path and
//! surfaced together; the pipeline never stops at the first bad field. The
//! caller's document is cloned on entry and never mutated.

mod cast;
mod defaults;
mod error;
mod projection;
mod required;
mod validate;
mod visit;

pub use cast::cast_value;
pub use error::{ErrorReport, FieldError, UnmarshalError};
pub use projection::Projection;

pub(crate) use projection::ResolvedProjection;

use crate::schema::CompiledSchema;
use log::debug;
use serde_json::Value;

/// Casts and validates `document` against `schema`, returning the new cast
/// document or the aggregated per-path error report.
pub fn unmarshal(
    document: &Value,
    schema: &CompiledSchema,
    projection: Option<&Projection>,
) -> Result<Value, UnmarshalError> {
    let projection = ResolvedProjection::resolve(projection)?;
    if document.is_null() {
        return Err(UnmarshalError::NullDocument);
    }
    let mut document = document.clone();

    debug!("unmarshal: defaulting");
    defaults::apply_defaults(&mut document, schema, &projection);

    debug!("unmarshal: cast and prune");
    let mut report = ErrorReport::new();
    visit::cast_document(&mut document, schema, &projection, &mut report);

    debug!("unmarshal: required check");
    report.merge(required::check_required(&document, schema, &projection));

    debug!("unmarshal: custom validation");
    report.merge(validate::run_validation(&document, schema, &projection));

    if report.has_error() {
        debug!("unmarshal failed: {}", report);
        return Err(UnmarshalError::Invalid(report));
    }
    Ok(document)
}
