//! Metadata side-table
//!
//! Process-wide associative store keyed by `(class, key)` pairs. Lookups
//! have own-metadata semantics: asking for a subclass's slot never falls
//! through to an ancestor's slot. The resolver alone walks ancestors, and
//! it does so explicitly; conflating the two silently duplicates or loses
//! base-class fields.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::{ClassId, ClassSchema};
use crate::engine::CompiledValidator;

/// Slot selector within a class's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    /// The class's own (un-flattened) schema fragment.
    Schema,
    /// The compiled validator produced at seal time.
    Compiled,
}

/// One stored metadata value.
#[derive(Debug, Clone)]
pub enum MetaValue {
    /// Own schema fragment.
    Schema(ClassSchema),
    /// Compiled validator, shared by all instances of the class.
    Compiled(Arc<CompiledValidator>),
}

/// In-memory metadata store. Owned by the registry; classes and instances
/// hold no private schema copies.
#[derive(Debug, Default)]
pub struct MetadataStore {
    slots: HashMap<(ClassId, MetaKey), MetaValue>,
}

impl MetadataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Own-metadata lookup; never follows the ancestor chain.
    pub fn get(&self, class: &ClassId, key: MetaKey) -> Option<&MetaValue> {
        self.slots.get(&(class.clone(), key))
    }

    /// Stores a value, replacing any previous entry for the same slot.
    pub fn set(&mut self, class: &ClassId, key: MetaKey, value: MetaValue) {
        self.slots.insert((class.clone(), key), value);
    }

    /// Convenience accessor for the own-schema slot.
    pub fn own_schema(&self, class: &ClassId) -> Option<&ClassSchema> {
        match self.get(class, MetaKey::Schema) {
            Some(MetaValue::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Convenience accessor for the compiled-validator slot.
    pub fn compiled(&self, class: &ClassId) -> Option<Arc<CompiledValidator>> {
        match self.get(class, MetaKey::Compiled) {
            Some(MetaValue::Compiled(compiled)) => Some(Arc::clone(compiled)),
            _ => None,
        }
    }
}
