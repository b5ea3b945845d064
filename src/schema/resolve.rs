//! Schema resolver
//!
//! Flattens a class's full ancestor chain of own schemas into one resolved
//! schema. Merge precedence is base-to-derived: a subclass's field of the
//! same name overrides the base's (keeping the base's position in the field
//! order), and the reserved flags take the most-derived explicit value,
//! inheriting when unset. Fields declared only on a base class survive into
//! every subclass's resolved schema.

use super::chain::{chain_of, ExtendsLinks};
use super::store::MetadataStore;
use super::types::{ClassId, ClassSchema};

/// Resolves the full schema for `class` by walking its ancestor chain.
///
/// Returns a fresh value each call; callers own the copy and the stored own
/// schemas remain untouched.
pub fn resolve_schema(
    store: &MetadataStore,
    links: &ExtendsLinks,
    class: &ClassId,
) -> ClassSchema {
    let mut resolved = ClassSchema::default();

    // The walker yields most-derived first; merge base-first so each more
    // derived own schema overwrites what it redeclares.
    for ancestor in chain_of(links, class).iter().rev() {
        let Some(own) = store.own_schema(ancestor) else {
            continue;
        };
        for (name, fragment) in &own.fields {
            resolved.fields.insert(name.clone(), fragment.clone());
        }
        if let Some(strict) = own.strict {
            resolved.strict = Some(strict);
        }
        if let Some(async_mode) = own.async_mode {
            resolved.async_mode = Some(async_mode);
        }
    }

    resolved
}
