//! Unmarshal Invariant Tests
//!
//! End-to-end properties of the four-pass pipeline:
//! - Idempotence on valid input
//! - Pruning of undeclared paths
//! - Singleton wrapping at array positions
//! - Defaults fill only absent values, before the required check
//! - Per-element required and enum errors with real indices
//! - Projection exclusivity and mode semantics
//! - One aggregated report per call

use schemacast::{
    declaration, CompiledSchema, FieldError, FieldKind, FieldSpec, Projection, SchemaNode,
    UnmarshalError,
};
use serde_json::json;
use std::sync::Once;

// =============================================================================
// Helper Functions
// =============================================================================

static INIT: Once = Once::new();

/// Set RUST_LOG=trace to watch the pipeline passes while debugging a test.
fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

fn person_schema() -> CompiledSchema {
    init_logging();
    CompiledSchema::compile(declaration([
        ("id", SchemaNode::number()),
        (
            "name",
            SchemaNode::group([
                ("first", SchemaNode::string()),
                ("last", SchemaNode::string()),
            ]),
        ),
        ("tags", SchemaNode::array_of(SchemaNode::string())),
    ]))
    .unwrap()
}

fn report_of(err: UnmarshalError) -> schemacast::ErrorReport {
    match err {
        UnmarshalError::Invalid(report) => report,
        other => panic!("expected aggregated report, got {:?}", other),
    }
}

// =============================================================================
// Idempotence and Pruning
// =============================================================================

/// Unmarshalling an already-cast document yields a deep-equal value.
#[test]
fn test_idempotent_on_valid_input() {
    let schema = person_schema();
    let input = json!({
        "id": "7",
        "name": { "first": "ann", "last": "lee" },
        "tags": ["a", "b"]
    });

    let once = schema.unmarshal(&input, None).unwrap();
    let twice = schema.unmarshal(&once, None).unwrap();
    assert_eq!(once, twice);
}

/// Every key in the output corresponds to a declared path.
#[test]
fn test_undeclared_paths_pruned() {
    let schema = person_schema();
    let doc = schema
        .unmarshal(
            &json!({
                "id": 1,
                "name": { "first": "a", "middle": "x" },
                "color": "red"
            }),
            None,
        )
        .unwrap();

    assert_eq!(doc, json!({ "id": 1, "name": { "first": "a" } }));
}

/// The caller's document is never mutated.
#[test]
fn test_input_document_untouched() {
    let schema = person_schema();
    let input = json!({ "id": "7", "junk": true });
    let snapshot = input.clone();
    let _ = schema.unmarshal(&input, None).unwrap();
    assert_eq!(input, snapshot);
}

/// A null top-level document is a hard failure, not a per-field one.
#[test]
fn test_null_document_hard_failure() {
    let schema = person_schema();
    let err = schema.unmarshal(&json!(null), None).unwrap_err();
    assert!(matches!(err, UnmarshalError::NullDocument));
}

// =============================================================================
// Array Semantics
// =============================================================================

/// A scalar supplied where an array is declared is wrapped as a singleton.
#[test]
fn test_scalar_wrapped_as_singleton_array() {
    let schema =
        CompiledSchema::compile(declaration([("test", SchemaNode::array_any())])).unwrap();
    let doc = schema.unmarshal(&json!({ "test": true }), None).unwrap();
    assert_eq!(doc, json!({ "test": [true] }));
}

/// Element cast failures report at real indices and leave siblings cast.
#[test]
fn test_array_cast_errors_by_index() {
    let schema = CompiledSchema::compile(declaration([(
        "ages",
        SchemaNode::array_of(SchemaNode::number()),
    )]))
    .unwrap();

    let report = report_of(
        schema
            .unmarshal(&json!({ "ages": ["1", "abc", "3"] }), None)
            .unwrap_err(),
    );
    assert_eq!(report.len(), 1);
    assert!(matches!(report.get("ages.1"), Some(FieldError::Cast { .. })));
}

/// Required on array elements flags exactly the absent elements.
#[test]
fn test_array_element_required() {
    let schema = CompiledSchema::compile(declaration([(
        "names",
        SchemaNode::array_of(SchemaNode::field(
            FieldSpec::of(FieldKind::String).required(),
        )),
    )]))
    .unwrap();

    let report = report_of(
        schema
            .unmarshal(&json!({ "names": ["a", null] }), None)
            .unwrap_err(),
    );
    assert_eq!(report.len(), 1);
    assert!(matches!(report.get("names.1"), Some(FieldError::Required(_))));
}

// =============================================================================
// Defaults
// =============================================================================

/// Defaults fill only absent values.
#[test]
fn test_defaults_fill_only_absent() {
    let schema = CompiledSchema::compile(declaration([(
        "name",
        SchemaNode::field(FieldSpec::of(FieldKind::String).default_value("bacon")),
    )]))
    .unwrap();

    assert_eq!(
        schema.unmarshal(&json!({}), None).unwrap(),
        json!({ "name": "bacon" })
    );
    assert_eq!(
        schema.unmarshal(&json!({ "name": "eggs" }), None).unwrap(),
        json!({ "name": "eggs" })
    );
}

/// Defaults reach leaves whose parent objects are absent from the input:
/// the missing containers are created on the way down.
#[test]
fn test_deep_default_fills_absent_parent() {
    let schema = CompiledSchema::compile(declaration([
        (
            "name",
            SchemaNode::group([
                (
                    "first",
                    SchemaNode::field(FieldSpec::of(FieldKind::String).default_value("test")),
                ),
                ("last", SchemaNode::string()),
            ]),
        ),
        (
            "multiple",
            SchemaNode::group([
                (
                    "a",
                    SchemaNode::field(FieldSpec::of(FieldKind::String).default_value("hi")),
                ),
                ("b", SchemaNode::string()),
            ]),
        ),
    ]))
    .unwrap();

    let doc = schema
        .unmarshal(&json!({ "multiple": { "b": "foo" } }), None)
        .unwrap();
    assert_eq!(
        doc,
        json!({
            "name": { "first": "test" },
            "multiple": { "a": "hi", "b": "foo" }
        })
    );
}

/// An empty composite literal default produces a fresh value per call.
#[test]
fn test_empty_composite_default_fresh_per_call() {
    let schema = CompiledSchema::compile(declaration([(
        "tags",
        SchemaNode::field(FieldSpec::of(FieldKind::Any).default_value(json!([]))),
    )]))
    .unwrap();

    let mut first = schema.unmarshal(&json!({}), None).unwrap();
    let second = schema.unmarshal(&json!({}), None).unwrap();
    first["tags"].as_array_mut().unwrap().push(json!("leak"));
    assert_eq!(second, json!({ "tags": [] }));
}

/// A non-empty composite literal default fails at compile time.
#[test]
fn test_mutable_default_literal_rejected_at_compile() {
    let result = CompiledSchema::compile(declaration([(
        "tags",
        SchemaNode::field(FieldSpec::of(FieldKind::Any).default_value(json!(["x"]))),
    )]));
    assert!(result.is_err());
}

/// A field both required and defaulted never raises: defaulting runs first.
#[test]
fn test_required_after_defaulting() {
    let schema = CompiledSchema::compile(declaration([(
        "name",
        SchemaNode::field(
            FieldSpec::of(FieldKind::String)
                .required()
                .default_value("bacon"),
        ),
    )]))
    .unwrap();

    let doc = schema.unmarshal(&json!({}), None).unwrap();
    assert_eq!(doc, json!({ "name": "bacon" }));
}

/// A defaulted value is cast like any other.
#[test]
fn test_default_then_cast() {
    let schema = CompiledSchema::compile(declaration([(
        "age",
        SchemaNode::field(FieldSpec::of(FieldKind::Number).default_value("18")),
    )]))
    .unwrap();
    assert_eq!(schema.unmarshal(&json!({}), None).unwrap(), json!({ "age": 18 }));
}

// =============================================================================
// Enum and Custom Validation
// =============================================================================

#[test]
fn test_enum_rejects_and_names_values() {
    let schema = CompiledSchema::compile(declaration([(
        "kind",
        SchemaNode::field(FieldSpec::of(FieldKind::String).allowed(["x", "y"])),
    )]))
    .unwrap();

    assert!(schema.unmarshal(&json!({ "kind": "x" }), None).is_ok());

    let report = report_of(schema.unmarshal(&json!({ "kind": "z" }), None).unwrap_err());
    let message = report.get("kind").unwrap().to_string();
    assert!(message.contains("\"z\""));
    assert!(message.contains("\"x\""));
}

#[test]
fn test_validation_skips_absent_optional_fields() {
    let schema = CompiledSchema::compile(declaration([(
        "kind",
        SchemaNode::field(
            FieldSpec::of(FieldKind::String)
                .allowed(["x"])
                .validate(|_, _, _| Err("never reached".to_string())),
        ),
    )]))
    .unwrap();
    assert!(schema.unmarshal(&json!({}), None).is_ok());
}

/// All four passes contribute to one aggregated report.
#[test]
fn test_errors_aggregate_across_passes() {
    let schema = CompiledSchema::compile(declaration([
        ("age", SchemaNode::number()),
        (
            "name",
            SchemaNode::field(FieldSpec::of(FieldKind::String).required()),
        ),
        (
            "kind",
            SchemaNode::field(FieldSpec::of(FieldKind::String).allowed(["x"])),
        ),
    ]))
    .unwrap();

    let report = report_of(
        schema
            .unmarshal(&json!({ "age": "abc", "kind": "z" }), None)
            .unwrap_err(),
    );
    assert_eq!(report.len(), 3);
    assert!(matches!(report.get("age"), Some(FieldError::Cast { .. })));
    assert!(matches!(report.get("name"), Some(FieldError::Required(_))));
    assert!(matches!(report.get("kind"), Some(FieldError::Enum { .. })));

    // The report's string form joins "path: message" pairs.
    let display = report.to_string();
    assert!(display.contains("age: "));
    assert!(display.contains(", "));
}

// =============================================================================
// Projections
// =============================================================================

/// Mixing inclusion and exclusion markers fails before any casting.
#[test]
fn test_projection_exclusivity() {
    let schema = person_schema();
    let projection = Projection::new().mark("id", true).mark("tags", false);
    let err = schema
        .unmarshal(&json!({ "id": "not-a-number" }), Some(&projection))
        .unwrap_err();
    assert!(matches!(err, UnmarshalError::MixedProjection));
}

/// An inclusive projection keeps only the named paths.
#[test]
fn test_inclusive_projection() {
    let schema = person_schema();
    let doc = schema
        .unmarshal(
            &json!({
                "id": 1,
                "name": { "first": "ann", "last": "lee" },
                "tags": ["a"]
            }),
            Some(&Projection::include(["name.first"])),
        )
        .unwrap();
    assert_eq!(doc, json!({ "name": { "first": "ann" } }));
}

/// An exclusive projection drops the named paths and their descendants.
#[test]
fn test_exclusive_projection() {
    let schema = person_schema();
    let doc = schema
        .unmarshal(
            &json!({
                "id": 1,
                "name": { "first": "ann", "last": "lee" },
                "tags": ["a"]
            }),
            Some(&Projection::exclude(["name"])),
        )
        .unwrap();
    assert_eq!(doc, json!({ "id": 1, "tags": ["a"] }));
}

/// A projected-out required field raises no error.
#[test]
fn test_projection_shields_required() {
    let schema = CompiledSchema::compile(declaration([
        ("id", SchemaNode::number()),
        (
            "name",
            SchemaNode::field(FieldSpec::of(FieldKind::String).required()),
        ),
    ]))
    .unwrap();

    let doc = schema
        .unmarshal(&json!({ "id": 1 }), Some(&Projection::include(["id"])))
        .unwrap();
    assert_eq!(doc, json!({ "id": 1 }));
}

/// Suppression flags gate whole passes without touching the rest.
#[test]
fn test_suppression_flags() {
    let schema = CompiledSchema::compile(declaration([(
        "name",
        SchemaNode::field(
            FieldSpec::of(FieldKind::String)
                .required()
                .default_value("bacon"),
        ),
    )]))
    .unwrap();

    // Without defaults the required check fires.
    let err = schema
        .unmarshal(&json!({}), Some(&Projection::new().without_defaults()))
        .unwrap_err();
    assert!(report_of(err).get("name").is_some());

    // Without both, the empty document passes untouched.
    let doc = schema
        .unmarshal(
            &json!({}),
            Some(&Projection::new().without_defaults().without_required()),
        )
        .unwrap();
    assert_eq!(doc, json!({}));
}

// =============================================================================
// Typeless Descriptors and Deep Nesting
// =============================================================================

/// A descriptor with no declared type neither casts nor deletes.
#[test]
fn test_typeless_descriptor_passthrough() {
    let schema = CompiledSchema::compile(declaration([(
        "raw",
        SchemaNode::field(FieldSpec::untyped()),
    )]))
    .unwrap();
    let doc = schema
        .unmarshal(&json!({ "raw": { "free": ["form", 1] } }), None)
        .unwrap();
    assert_eq!(doc, json!({ "raw": { "free": ["form", 1] } }));
}

/// Casting recurses through arrays of documents.
#[test]
fn test_nested_document_array_cast() {
    let schema = CompiledSchema::compile(declaration([(
        "members",
        SchemaNode::array_of(SchemaNode::group([
            ("id", SchemaNode::number()),
            ("active", SchemaNode::boolean()),
        ])),
    )]))
    .unwrap();

    let doc = schema
        .unmarshal(
            &json!({ "members": [{ "id": "1", "active": "yes" }, { "id": 2, "active": false }] }),
            None,
        )
        .unwrap();
    assert_eq!(
        doc,
        json!({ "members": [{ "id": 1, "active": true }, { "id": 2, "active": false }] })
    );
}

/// Same compiled schema across threads: each call owns its document.
#[test]
fn test_concurrent_unmarshal_same_schema() {
    use std::sync::Arc;

    let schema = Arc::new(person_schema());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                let doc = schema
                    .unmarshal(&json!({ "id": i.to_string(), "junk": true }), None)
                    .unwrap();
                assert_eq!(doc, json!({ "id": i }));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
