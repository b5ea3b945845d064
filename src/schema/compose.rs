//! Nested / array-of-object composition
//!
//! Splices a referenced class's resolved schema into a parent field's rule.
//! The referenced schema is resolved at declaration time and copied in
//! whole: later edits to the referenced class do not propagate, two parents
//! nesting the same class never observe each other's overrides, and the
//! referenced class's own schema is never mutated.
//!
//! Strictness is special-cased: the referenced schema's `$$strict` (default
//! lax) is lifted into the object rule's local `strict` option. `$$async`
//! is dropped unconditionally: a nested object never carries async
//! semantics of its own; the sealing parent's flag governs.

use serde_json::{Map, Value};

use super::types::{ClassSchema, RuleFragment};

/// Builds an `object` rule fragment from a referenced class's resolved
/// schema, merged over the caller's options.
pub fn nested_fragment(referenced: ClassSchema, caller: Map<String, Value>) -> RuleFragment {
    let strict = referenced.strict.unwrap_or_default();

    let mut options = caller;
    options.insert("type".to_string(), Value::String("object".to_string()));
    options.insert("strict".to_string(), strict.to_value());

    RuleFragment {
        options,
        props: Some(referenced.fields),
        ..RuleFragment::default()
    }
}

/// Builds an `array` rule fragment whose `items` is the referenced class's
/// object fragment. The caller's options apply to the array itself; the
/// nested object carries none of them.
pub fn nested_array_fragment(
    referenced: ClassSchema,
    caller: Map<String, Value>,
) -> RuleFragment {
    let inner = nested_fragment(referenced, Map::new());

    let mut options = caller;
    options.insert("type".to_string(), Value::String("array".to_string()));

    RuleFragment {
        options,
        items: Some(Box::new(inner)),
        ..RuleFragment::default()
    }
}
