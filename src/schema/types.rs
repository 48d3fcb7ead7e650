//! Schema declaration and descriptor types.
//!
//! A declaration is an ordered tree of [`SchemaNode`]s. Every node is
//! explicitly tagged: a terminal [`FieldSpec`], a nested [`SchemaNode::Group`],
//! or a homogeneous [`SchemaNode::Array`]. There is no marker-key inference —
//! field names like `"$lt"` are ordinary fields.

use crate::path::Path;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Ordered top-level declaration: field name to node.
pub type Declaration = IndexMap<String, SchemaNode>;

/// Flattened compile output: schema path to descriptor.
pub type PathTable = IndexMap<Path, PathSpec>;

/// A user-defined constructible type: a value either already is an instance
/// or gets built from the raw value.
pub trait CastType: Send + Sync {
    /// Type name used in error messages.
    fn name(&self) -> &str;

    /// True if `value` already is an instance and should pass through.
    fn is_instance(&self, value: &Value) -> bool;

    /// Builds an instance from a raw value.
    fn construct(&self, value: Value) -> Result<Value, String>;
}

/// Custom validation hook: receives the resolved value, its compiled
/// descriptor, and the whole document.
pub type ValidateFn =
    Arc<dyn Fn(&Value, &PathSpec, &Value) -> Result<(), String> + Send + Sync>;

/// Whether a path must resolve to a present value.
#[derive(Clone)]
pub enum RequiredRule {
    Always,
    Never,
    /// Decided per unmarshal call against the whole input document.
    When(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
}

impl RequiredRule {
    pub fn evaluate(&self, document: &Value) -> bool {
        match self {
            RequiredRule::Always => true,
            RequiredRule::Never => false,
            RequiredRule::When(f) => f(document),
        }
    }
}

impl fmt::Debug for RequiredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequiredRule::Always => write!(f, "Always"),
            RequiredRule::Never => write!(f, "Never"),
            RequiredRule::When(_) => write!(f, "When(..)"),
        }
    }
}

/// Value supplied for absent positions during the defaulting pass.
#[derive(Clone)]
pub enum DefaultRule {
    /// A constant. Non-empty object/array literals are rejected at compile
    /// time; independently unmarshalled documents must never alias one
    /// shared composite.
    Literal(Value),
    /// Produced fresh per fill from the whole document.
    Computed(Arc<dyn Fn(&Value) -> Value + Send + Sync>),
}

impl DefaultRule {
    pub fn produce(&self, document: &Value) -> Value {
        match self {
            DefaultRule::Literal(v) => v.clone(),
            DefaultRule::Computed(f) => f(document),
        }
    }
}

impl fmt::Debug for DefaultRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultRule::Literal(v) => write!(f, "Literal({})", v),
            DefaultRule::Computed(_) => write!(f, "Computed(..)"),
        }
    }
}

/// Declared type of a terminal field.
#[derive(Clone)]
pub enum FieldKind {
    Number,
    String,
    Boolean,
    /// Typed object leaf with no open schema; values pass through un-pruned.
    Object,
    /// Accepts any value, performs no casting.
    Any,
    /// Inline "array of X" sugar. The descriptor's other modifiers apply to
    /// the array as a whole; the element compiles under a wildcard segment.
    Array(Option<Box<SchemaNode>>),
    Custom(Arc<dyn CastType>),
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Number => write!(f, "Number"),
            FieldKind::String => write!(f, "String"),
            FieldKind::Boolean => write!(f, "Boolean"),
            FieldKind::Object => write!(f, "Object"),
            FieldKind::Any => write!(f, "Any"),
            FieldKind::Array(elem) => write!(f, "Array({:?})", elem),
            FieldKind::Custom(t) => write!(f, "Custom({})", t.name()),
        }
    }
}

/// Compiled type tag consulted by the unmarshal walk.
#[derive(Clone)]
pub enum TypeKind {
    Number,
    String,
    Boolean,
    Object,
    Array,
    Any,
    Custom(Arc<dyn CastType>),
}

impl TypeKind {
    /// Type name used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            TypeKind::Number => "number",
            TypeKind::String => "string",
            TypeKind::Boolean => "boolean",
            TypeKind::Object => "object",
            TypeKind::Array => "array",
            TypeKind::Any => "any",
            TypeKind::Custom(t) => t.name(),
        }
    }
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Terminal descriptor in a declaration.
#[derive(Clone, Default)]
pub struct FieldSpec {
    /// `None` means inert passthrough: no casting, no pruning of the value,
    /// still subject to required/validate.
    pub kind: Option<FieldKind>,
    pub required: Option<RequiredRule>,
    pub default: Option<DefaultRule>,
    pub validate: Option<ValidateFn>,
    /// Allowed value set (enum membership check).
    pub allowed: Option<Vec<Value>>,
    /// Passthrough modifiers carried verbatim into the compiled descriptor.
    pub metadata: serde_json::Map<String, Value>,
}

impl FieldSpec {
    pub fn of(kind: FieldKind) -> Self {
        FieldSpec {
            kind: Some(kind),
            ..FieldSpec::default()
        }
    }

    /// A descriptor with no declared type.
    pub fn untyped() -> Self {
        FieldSpec::default()
    }

    pub fn required(mut self) -> Self {
        self.required = Some(RequiredRule::Always);
        self
    }

    pub fn required_when(
        mut self,
        f: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.required = Some(RequiredRule::When(Arc::new(f)));
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultRule::Literal(value.into()));
        self
    }

    pub fn default_with(
        mut self,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultRule::Computed(Arc::new(f)));
        self
    }

    pub fn validate(
        mut self,
        f: impl Fn(&Value, &PathSpec, &Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(f));
        self
    }

    pub fn allowed(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("default", &self.default)
            .field("validate", &self.validate.as_ref().map(|_| ".."))
            .field("allowed", &self.allowed)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// One node of a schema declaration.
#[derive(Clone, Debug)]
pub enum SchemaNode {
    /// Terminal descriptor.
    Field(FieldSpec),
    /// Nested object: further declared fields in declaration order.
    Group(Declaration),
    /// Homogeneous array; `None` declares an "any" element type.
    Array(Option<Box<SchemaNode>>),
}

impl SchemaNode {
    pub fn number() -> Self {
        SchemaNode::Field(FieldSpec::of(FieldKind::Number))
    }

    pub fn string() -> Self {
        SchemaNode::Field(FieldSpec::of(FieldKind::String))
    }

    pub fn boolean() -> Self {
        SchemaNode::Field(FieldSpec::of(FieldKind::Boolean))
    }

    pub fn any() -> Self {
        SchemaNode::Field(FieldSpec::of(FieldKind::Any))
    }

    /// Typed object leaf: values must be objects but are not pruned or
    /// descended into.
    pub fn object() -> Self {
        SchemaNode::Field(FieldSpec::of(FieldKind::Object))
    }

    pub fn custom(cast_type: Arc<dyn CastType>) -> Self {
        SchemaNode::Field(FieldSpec::of(FieldKind::Custom(cast_type)))
    }

    pub fn field(spec: FieldSpec) -> Self {
        SchemaNode::Field(spec)
    }

    pub fn group(
        entries: impl IntoIterator<Item = (impl Into<String>, SchemaNode)>,
    ) -> Self {
        SchemaNode::Group(declaration(entries))
    }

    pub fn array_of(element: SchemaNode) -> Self {
        SchemaNode::Array(Some(Box::new(element)))
    }

    /// An array accepting elements of any type.
    pub fn array_any() -> Self {
        SchemaNode::Array(None)
    }
}

/// Builds an ordered declaration from `(name, node)` pairs.
pub fn declaration(
    entries: impl IntoIterator<Item = (impl Into<String>, SchemaNode)>,
) -> Declaration {
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Compiled per-path descriptor: the sole runtime artifact the unmarshal
/// pipeline consults.
#[derive(Clone, Default)]
pub struct PathSpec {
    /// `None` means inert passthrough.
    pub kind: Option<TypeKind>,
    /// Open nested schema; present only for object nodes compiled from a
    /// [`SchemaNode::Group`].
    pub schema: Option<Declaration>,
    pub required: Option<RequiredRule>,
    pub default: Option<DefaultRule>,
    pub validate: Option<ValidateFn>,
    pub allowed: Option<Vec<Value>>,
    pub metadata: serde_json::Map<String, Value>,
}

impl PathSpec {
    pub(crate) fn of(kind: TypeKind) -> Self {
        PathSpec {
            kind: Some(kind),
            ..PathSpec::default()
        }
    }
}

impl fmt::Debug for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSpec")
            .field("kind", &self.kind)
            .field(
                "schema",
                &self.schema.as_ref().map(|s| s.keys().collect::<Vec<_>>()),
            )
            .field("required", &self.required)
            .field("default", &self.default)
            .field("validate", &self.validate.as_ref().map(|_| ".."))
            .field("allowed", &self.allowed)
            .finish()
    }
}
