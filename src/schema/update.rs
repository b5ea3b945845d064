//! Schema accumulator
//!
//! The single mutation primitive for a class's own schema. Field
//! declarations funnel through here one fragment at a time; a repeat
//! declaration for the same field upgrades the entry to a tagged multi-rule
//! instead of overwriting it, preserving declaration order.

use serde_json::{Map, Value};

use super::store::{MetaKey, MetaValue, MetadataStore};
use super::types::{ClassId, ClassSchema, RuleFragment};

/// Merges one new rule fragment for one field into the class's own schema.
///
/// - no existing entry: the fragment is stored as-is;
/// - existing plain fragment: replaced by a multi-rule of `[existing, new]`;
/// - existing multi-rule: the fragment is appended to its `rules` in place.
///
/// A field is therefore a multi-rule exactly when two or more declarations
/// targeted it.
pub fn update_schema(
    store: &mut MetadataStore,
    class: &ClassId,
    field: &str,
    fragment: RuleFragment,
) {
    let mut own = store.own_schema(class).cloned().unwrap_or_default();
    merge_field(&mut own, field, fragment);
    store.set(class, MetaKey::Schema, MetaValue::Schema(own));
}

/// Accumulation step shared with callers that already hold the own schema.
pub(crate) fn merge_field(own: &mut ClassSchema, field: &str, fragment: RuleFragment) {
    match own.fields.get_mut(field) {
        None => {
            own.fields.insert(field.to_string(), fragment);
        }
        Some(existing) if existing.rules.is_some() => {
            // Already a multi-rule: append, never nest.
            if let Some(rules) = existing.rules.as_mut() {
                rules.push(fragment);
            }
        }
        Some(existing) => {
            let previous = std::mem::take(existing);
            *existing = multi_of(vec![previous, fragment]);
        }
    }
}

fn multi_of(rules: Vec<RuleFragment>) -> RuleFragment {
    let mut options = Map::new();
    options.insert("type".to_string(), Value::String("multi".to_string()));
    RuleFragment {
        options,
        rules: Some(rules),
        ..RuleFragment::default()
    }
}
