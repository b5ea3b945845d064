//! Class registry
//!
//! The process-wide side-table behind the declaration API. A class is
//! declared by name, optionally extends an already declared class, collects
//! field rule declarations through the schema accumulator, and is finally
//! sealed: its ancestor chain is flattened, the engine compiles the result,
//! and the compiled validator is stored keyed by the class itself.
//!
//! Declaration and sealing are initialization steps: single-writer, run to
//! completion before instances are validated. The write lock is never held
//! across the engine-compile call, because the engine re-enters the
//! registry through [`SchemaLookup`] to resolve structural class
//! references.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::engine::{CompiledValidator, SchemaLookup, Validator, ValidatorOptions};
use crate::rules::options_map;
use crate::schema::chain::{chain_of, ExtendsLinks};
use crate::schema::compose::{nested_array_fragment, nested_fragment};
use crate::schema::resolve::resolve_schema;
use crate::schema::store::{MetaKey, MetaValue, MetadataStore};
use crate::schema::update;
use crate::schema::{
    ClassId, ClassSchema, RuleFragment, SchemaError, SchemaResult, StrictMode,
};

/// Top-level options applied at seal time.
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Unknown-field policy; always set explicitly on the own schema,
    /// defaulting to lax.
    pub strict: StrictMode,
    /// Deferred-validation flag; recorded only when supplied, because the
    /// key's presence is itself a signal.
    pub async_mode: Option<bool>,
    /// Extra field fragments declared at seal time; run through the
    /// accumulator like any other declaration.
    pub extra: Vec<(String, RuleFragment)>,
}

impl SchemaOptions {
    /// Lax schema with no flags; same as `Default`.
    pub fn lax() -> Self {
        Self::default()
    }

    /// Sets the unknown-field policy.
    pub fn strict(mode: StrictMode) -> Self {
        Self {
            strict: mode,
            ..Self::default()
        }
    }

    /// Marks the schema asynchronous.
    pub fn asynchronous(mut self) -> Self {
        self.async_mode = Some(true);
        self
    }
}

/// Handle to a declared class. Cheap to clone; identity is the class id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRef {
    id: ClassId,
}

impl ClassRef {
    /// The class's identity.
    pub fn id(&self) -> &ClassId {
        &self.id
    }

    /// Creates an empty instance of this class.
    pub fn instance(&self) -> crate::instance::Instance {
        crate::instance::Instance::new(self.id.clone())
    }
}

#[derive(Default)]
struct Inner {
    links: ExtendsLinks,
    store: MetadataStore,
}

/// Process-wide class registry: inheritance links, the metadata store, and
/// the compiled-validator slots.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a new class and returns its builder.
    ///
    /// Names are unique per registry; redeclaring is an error.
    pub fn declare(&self, name: &str) -> SchemaResult<ClassBuilder<'_>> {
        let id = ClassId::new(name);
        let mut inner = self.write();
        if inner.links.contains_key(&id) {
            return Err(SchemaError::DuplicateClass(id));
        }
        inner.links.insert(id.clone(), None);
        log::debug!("declared class '{id}'");
        Ok(ClassBuilder {
            registry: self,
            class: ClassRef { id },
        })
    }

    /// Merges one rule fragment for one field into the class's own schema.
    ///
    /// This is the raw accumulation primitive behind `ClassBuilder::field`;
    /// repeat declarations for the same field build a tagged multi-rule.
    pub fn update_schema(&self, class: &ClassRef, field: &str, fragment: RuleFragment) {
        let mut inner = self.write();
        update::update_schema(&mut inner.store, &class.id, field, fragment);
    }

    /// Resolves the class's full schema across its ancestor chain.
    ///
    /// Returns a fresh copy each call; the stored own schemas are never
    /// handed out by reference.
    pub fn resolved_schema(&self, class: &ClassRef) -> ClassSchema {
        let inner = self.read();
        resolve_schema(&inner.store, &inner.links, &class.id)
    }

    /// Finds the compiled validator for a class, walking the ancestor chain
    /// so never-sealed subclasses share the nearest sealed ancestor's
    /// validator.
    pub fn compiled(&self, class: &ClassId) -> Option<Arc<CompiledValidator>> {
        let inner = self.read();
        chain_of(&inner.links, class)
            .iter()
            .find_map(|ancestor| inner.store.compiled(ancestor))
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SchemaLookup for Registry {
    fn resolved_schema(&self, class: &ClassId) -> Option<ClassSchema> {
        let inner = self.read();
        if !inner.links.contains_key(class) {
            return None;
        }
        Some(resolve_schema(&inner.store, &inner.links, class))
    }
}

/// Builder for one class's declarations, produced by `Registry::declare`
/// and consumed by `seal`.
pub struct ClassBuilder<'r> {
    registry: &'r Registry,
    class: ClassRef,
}

impl<'r> ClassBuilder<'r> {
    /// The class being built.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Records the inheritance link to an already declared parent.
    pub fn extends(self, parent: &ClassRef) -> SchemaResult<Self> {
        let mut inner = self.registry.write();
        if !inner.links.contains_key(&parent.id) {
            return Err(SchemaError::UnknownClass(parent.id.clone()));
        }
        inner.links.insert(self.class.id.clone(), Some(parent.id.clone()));
        drop(inner);
        Ok(self)
    }

    /// Declares one field rule. Call order is the authoritative declaration
    /// order: repeat calls for the same field accumulate into a multi-rule,
    /// first call first.
    pub fn field(self, name: &str, fragment: RuleFragment) -> Self {
        self.registry.update_schema(&self.class, name, fragment);
        self
    }

    /// Declares a nested-object field from another class's schema.
    ///
    /// The referenced schema is resolved and copied now; later edits to the
    /// referenced class do not propagate.
    pub fn nested(self, name: &str, referenced: &ClassRef, options: Value) -> Self {
        let resolved = self.registry.resolved_schema(referenced);
        let fragment = nested_fragment(resolved, options_map(options));
        self.registry.update_schema(&self.class, name, fragment);
        self
    }

    /// Declares an array-of-objects field from another class's schema.
    pub fn nested_array(self, name: &str, referenced: &ClassRef, options: Value) -> Self {
        let resolved = self.registry.resolved_schema(referenced);
        let fragment = nested_array_fragment(resolved, options_map(options));
        self.registry.update_schema(&self.class, name, fragment);
        self
    }

    /// Seals the class with default engine options.
    pub fn seal(self, options: SchemaOptions) -> SchemaResult<ClassRef> {
        self.seal_with(options, ValidatorOptions::default())
    }

    /// Seals the class: applies top-level options to the own schema,
    /// resolves the ancestor chain, compiles the result, and stores the
    /// compiled validator keyed by the class.
    pub fn seal_with(
        self,
        options: SchemaOptions,
        engine: ValidatorOptions,
    ) -> SchemaResult<ClassRef> {
        {
            let mut inner = self.registry.write();
            let mut own = inner
                .store
                .own_schema(&self.class.id)
                .cloned()
                .unwrap_or_default();
            own.strict = Some(options.strict);
            if let Some(async_mode) = options.async_mode {
                own.async_mode = Some(async_mode);
            }
            for (field, fragment) in options.extra {
                update::merge_field(&mut own, &field, fragment);
            }
            inner
                .store
                .set(&self.class.id, MetaKey::Schema, MetaValue::Schema(own));
        }

        // Resolve and compile without holding the lock: the engine may call
        // back into the registry for structural class references.
        let resolved = self.registry.resolved_schema(&self.class);
        let field_count = resolved.fields.len();
        let compiled = Validator::new(engine).compile(resolved, self.registry)?;

        let mut inner = self.registry.write();
        inner.store.set(
            &self.class.id,
            MetaKey::Compiled,
            MetaValue::Compiled(Arc::new(compiled)),
        );
        drop(inner);

        log::debug!("sealed class '{}' ({field_count} fields)", self.class.id);
        Ok(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;
    use serde_json::json;

    #[test]
    fn declaring_the_same_name_twice_fails() {
        let registry = Registry::new();
        let _ = registry.declare("Test").unwrap();
        assert!(matches!(
            registry.declare("Test"),
            Err(SchemaError::DuplicateClass(_))
        ));
    }

    #[test]
    fn extends_requires_a_declared_parent() {
        let registry = Registry::new();
        let ghost = ClassRef {
            id: ClassId::new("Ghost"),
        };
        let result = registry.declare("Child").unwrap().extends(&ghost);
        assert!(matches!(result, Err(SchemaError::UnknownClass(_))));
    }

    #[test]
    fn seal_sets_strict_explicitly_and_async_only_when_supplied() {
        let registry = Registry::new();
        let test = registry
            .declare("Test")
            .unwrap()
            .seal(SchemaOptions::default())
            .unwrap();

        let resolved = registry.resolved_schema(&test);
        assert_eq!(resolved.to_value(), json!({ "$$strict": false }));
    }

    #[test]
    fn seal_time_extra_fields_go_through_the_accumulator() {
        let registry = Registry::new();
        let test = registry
            .declare("Test")
            .unwrap()
            .field("prop", rules::string(json!({})))
            .seal(SchemaOptions {
                extra: vec![("prop".to_string(), rules::number(json!({})))],
                ..SchemaOptions::default()
            })
            .unwrap();

        let resolved = registry.resolved_schema(&test);
        assert_eq!(resolved.fields["prop"].kind(), Some("multi"));
    }

    #[test]
    fn compiled_lookup_walks_the_chain() {
        let registry = Registry::new();
        let parent = registry
            .declare("Parent")
            .unwrap()
            .field("a", rules::string(json!({})))
            .seal(SchemaOptions::default())
            .unwrap();

        // The child is declared but never sealed.
        let builder = registry.declare("Child").unwrap().extends(&parent).unwrap();
        let child = builder.class().clone();

        let compiled = registry.compiled(child.id());
        assert!(compiled.is_some());
    }
}
