//! Memoized 1:1 lookups.
//!
//! Some fields never change once an entity exists: a registry index, an
//! account's owner address, a unique display name. Lookups by those fields
//! are cached here as `(entity class, key) -> row handle`.
//!
//! Only positive results are stored, so an entity created after a miss is
//! still found on the next lookup. Row handles go stale when the store
//! removes entities; the owning [`Session`](crate::session::Session) clears
//! this cache whenever the store epoch moves.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use kami_store::entity::EntityIndex;
use primitive_types::U256;

/// The immutable field a lookup is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(u32),
    Owner(U256),
    Name(String),
}

#[derive(Debug, Default)]
pub struct IndexCache {
    entries: RefCell<HashMap<(&'static str, Key), EntityIndex>>,
    hits: Cell<u64>,
    resets: Cell<u64>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, class: &'static str, key: &Key) -> Option<EntityIndex> {
        let found = self.entries.borrow().get(&(class, key.clone())).copied();
        if found.is_some() {
            self.hits.set(self.hits.get() + 1);
        }
        found
    }

    pub fn insert(&self, class: &'static str, key: Key, entity: EntityIndex) {
        self.entries.borrow_mut().insert((class, key), entity);
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.resets.set(self.resets.get() + 1);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn resets(&self) -> u64 {
        self.resets.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_scoped_by_class() {
        let cache = IndexCache::new();
        cache.insert("IsKami", Key::Index(1), EntityIndex(4));
        assert_eq!(cache.get("IsKami", &Key::Index(1)), Some(EntityIndex(4)));
        assert_eq!(cache.get("IsNode", &Key::Index(1)), None);
        assert_eq!(cache.hits(), 1);
    }

    #[test]
    fn clear_drops_everything() {
        let cache = IndexCache::new();
        cache.insert("IsAccount", Key::Name("ava".into()), EntityIndex(0));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.resets(), 1);
    }
}
