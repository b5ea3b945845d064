//! Schema type definitions
//!
//! The core never interprets rule options beyond the `type` discriminator
//! and the reserved `strict` / `instanceOf` keys; everything else is an
//! opaque option bag handed to the engine at compile time. Composite
//! structure (nested props, array items, multi rules, custom checks) is
//! carried in typed slots next to the option bag so it can hold things a
//! JSON value cannot (other fragments, closures).

use std::fmt;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable identifier of a registered class.
///
/// This is the runtime identity used for validator lookup. Instances carry
/// it; the metadata store is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(String);

impl ClassId {
    /// Creates a class id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the class name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unknown-field policy for an object schema.
///
/// Serialized form matches the reserved `$$strict` flag: `false`, `true`,
/// or the string `"remove"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrictMode {
    /// Undeclared fields pass through untouched.
    #[default]
    Lax,
    /// Undeclared fields fail validation with `objectStrict`.
    Strict,
    /// Undeclared fields are deleted from the instance in place.
    Remove,
}

impl StrictMode {
    /// Renders the flag in its wire form.
    pub fn to_value(self) -> Value {
        match self {
            StrictMode::Lax => Value::Bool(false),
            StrictMode::Strict => Value::Bool(true),
            StrictMode::Remove => Value::String("remove".to_string()),
        }
    }

    /// Parses the wire form. Anything unrecognized reads as `Lax`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => StrictMode::Strict,
            Value::String(s) if s == "remove" => StrictMode::Remove,
            _ => StrictMode::Lax,
        }
    }
}

/// One error pushed by a custom check.
///
/// The engine fills in the field path and resolves the message template
/// afterward; checks only name the error kind (and optionally override the
/// message or record the offending value).
#[derive(Debug, Clone, PartialEq)]
pub struct CheckError {
    /// Error kind, used as the message-template key.
    pub kind: String,
    /// Explicit message, overriding template resolution.
    pub message: Option<String>,
    /// Offending value as seen by the check.
    pub actual: Option<Value>,
}

impl CheckError {
    /// Creates a check error carrying only a kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            actual: None,
        }
    }
}

/// Shared error accumulator handed to asynchronous custom checks.
///
/// Cheap to clone; every clone pushes into the same ordered sequence.
#[derive(Clone, Default)]
pub struct CheckErrors(Arc<Mutex<Vec<CheckError>>>);

impl CheckErrors {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes an error identified only by kind.
    pub fn push(&self, kind: impl Into<String>) {
        self.push_error(CheckError::new(kind));
    }

    /// Pushes a fully specified error.
    pub fn push_error(&self, error: CheckError) {
        if let Ok(mut errors) = self.0.lock() {
            errors.push(error);
        }
    }

    /// Drains the accumulated errors in push order.
    pub fn take(&self) -> Vec<CheckError> {
        match self.0.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(_) => Vec::new(),
        }
    }
}

/// Synchronous custom check: receives the field value and the shared error
/// accumulator, returns the sanitized value that replaces the original.
pub type SyncCheck = dyn Fn(&Value, &mut Vec<CheckError>) -> Value + Send + Sync;

/// Asynchronous custom check: same contract, with the accumulator passed as
/// a clonable handle so it can cross await points.
pub type AsyncCheck = dyn Fn(Value, CheckErrors) -> BoxFuture<'static, Value> + Send + Sync;

/// Caller-supplied check logic attached to a `custom` rule.
#[derive(Clone)]
pub enum CheckFn {
    /// Runs inline during validation.
    Sync(Arc<SyncCheck>),
    /// Forces the schema into async mode; awaited by the deferred validator.
    Async(Arc<AsyncCheck>),
}

impl CheckFn {
    /// Whether this check requires a deferred validator.
    pub fn is_async(&self) -> bool {
        matches!(self, CheckFn::Async(_))
    }
}

impl fmt::Debug for CheckFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckFn::Sync(_) => f.write_str("CheckFn::Sync(..)"),
            CheckFn::Async(_) => f.write_str("CheckFn::Async(..)"),
        }
    }
}

/// Mapping from field name to rule fragment, insertion order preserved.
pub type FieldSchema = IndexMap<String, RuleFragment>;

/// One field's validation rule: an opaque option bag with a `type`
/// discriminator plus the composite slots the core itself understands.
#[derive(Debug, Clone, Default)]
pub struct RuleFragment {
    /// Option bag passed through to the engine. Always contains `type`.
    pub options: Map<String, Value>,
    /// Nested object fields (`type: "object"`).
    pub props: Option<FieldSchema>,
    /// Element rule (`type: "array"`).
    pub items: Option<Box<RuleFragment>>,
    /// Ordered alternatives (`type: "multi"`).
    pub rules: Option<Vec<RuleFragment>>,
    /// Caller-supplied check (`type: "custom"`).
    pub check: Option<CheckFn>,
}

impl RuleFragment {
    /// Creates a fragment from a bare option bag.
    pub fn from_options(options: Map<String, Value>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Returns the `type` discriminator, if present.
    pub fn kind(&self) -> Option<&str> {
        self.options.get("type").and_then(Value::as_str)
    }

    /// Returns one option by name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Renders the fragment as a plain JSON value for snapshots and
    /// engine-facing copies. Checks are not renderable and are omitted;
    /// their presence is already visible through `type: "custom"`.
    pub fn to_value(&self) -> Value {
        let mut out = self.options.clone();
        if let Some(props) = &self.props {
            let mut rendered = Map::new();
            for (name, fragment) in props {
                rendered.insert(name.clone(), fragment.to_value());
            }
            out.insert("props".to_string(), Value::Object(rendered));
        }
        if let Some(items) = &self.items {
            out.insert("items".to_string(), items.to_value());
        }
        if let Some(rules) = &self.rules {
            let rendered = rules.iter().map(RuleFragment::to_value).collect();
            out.insert("rules".to_string(), Value::Array(rendered));
        }
        Value::Object(out)
    }
}

/// A class's schema: its field map plus the two reserved flags.
///
/// Both the per-class fragment in the metadata store (the "own schema") and
/// the chain-flattened result (the "resolved schema") use this shape; the
/// flags stay `None` until something sets them explicitly, because their
/// mere presence is a signal (`async_mode` in particular).
#[derive(Debug, Clone, Default)]
pub struct ClassSchema {
    /// Field name to rule fragment, declaration order preserved.
    pub fields: FieldSchema,
    /// Unknown-field policy (`$$strict`); `None` until sealed.
    pub strict: Option<StrictMode>,
    /// Deferred-validation flag (`$$async`); `None` unless explicitly set.
    pub async_mode: Option<bool>,
}

impl ClassSchema {
    /// Renders the schema in its wire form, reserved flags included.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        for (name, fragment) in &self.fields {
            out.insert(name.clone(), fragment.to_value());
        }
        if let Some(strict) = self.strict {
            out.insert("$$strict".to_string(), strict.to_value());
        }
        if let Some(async_mode) = self.async_mode {
            out.insert("$$async".to_string(), Value::Bool(async_mode));
        }
        Value::Object(out)
    }
}
