//! Ancestor chain walker
//!
//! Classes record an explicit `extends` link at declaration time; the walker
//! turns those links into an ordered chain, most-derived first. The chain is
//! finite by construction: a parent must already be registered when a child
//! declares it, and class names are unique, so links cannot form a cycle.

use std::collections::HashMap;

use super::types::ClassId;

/// Explicit inheritance links, child to parent.
pub type ExtendsLinks = HashMap<ClassId, Option<ClassId>>;

/// Returns the ancestor chain of `class`, most-derived first, ending at the
/// root of its hierarchy. The class itself is the first element.
pub fn chain_of(links: &ExtendsLinks, class: &ClassId) -> Vec<ClassId> {
    let mut chain = vec![class.clone()];
    let mut current = class;
    while let Some(Some(parent)) = links.get(current) {
        chain.push(parent.clone());
        current = parent;
    }
    chain
}
