//! Component registration and metadata.
//!
//! Every component name used in a [`World`](crate::world::World) must be
//! registered before it is written. A component is either a *tag* (presence
//! only, e.g. `IsKami`) or a *field* (carries a [`Value`](crate::value::Value),
//! e.g. `Name`). Registration produces a [`ComponentId`] that indexes the
//! world's column storage.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a registered component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) u32);

impl ComponentId {
    #[inline]
    pub(crate) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentKind / ComponentInfo
// ---------------------------------------------------------------------------

/// Whether a component marks membership or carries data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Tag,
    Field,
}

/// Metadata about a registered component.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub id: ComponentId,
    pub name: String,
    pub kind: ComponentKind,
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping component names to [`ComponentId`]s and their kind.
///
/// A name can only be registered once; re-registering returns the existing
/// id. Re-registering with a different kind keeps the original kind and logs
/// a warning.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_name: HashMap<String, ComponentId>,
    /// Indexed by `ComponentId.0`.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with the given kind.
    pub fn register(&mut self, name: &str, kind: ComponentKind) -> ComponentId {
        if let Some(&existing) = self.by_name.get(name) {
            let registered = self.infos[existing.slot()].kind;
            if registered != kind {
                tracing::warn!(
                    component = %name,
                    registered = ?registered,
                    requested = ?kind,
                    "component re-registered with a different kind -- keeping the original"
                );
            }
            return existing;
        }

        let id = ComponentId(self.infos.len() as u32);
        self.infos.push(ComponentInfo {
            id,
            name: name.to_owned(),
            kind,
        });
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Look up a component by name.
    pub fn lookup(&self, name: &str) -> Option<ComponentId> {
        self.by_name.get(name).copied()
    }

    /// Metadata for a registered id.
    pub fn info(&self, id: ComponentId) -> Option<&ComponentInfo> {
        self.infos.get(id.slot())
    }

    /// Kind of a registered component, by name.
    pub fn kind_of(&self, name: &str) -> Option<ComponentKind> {
        self.lookup(name).map(|id| self.infos[id.slot()].kind)
    }

    /// All registered components in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.infos.iter()
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Names of all registered components, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of registered components of one kind, sorted.
    pub fn names_of_kind(&self, kind: ComponentKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .infos
            .iter()
            .filter(|info| info.kind == kind)
            .map(|info| info.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_sequential_ids() {
        let mut reg = ComponentRegistry::new();
        let a = reg.register("IsKami", ComponentKind::Tag);
        let b = reg.register("Name", ComponentKind::Field);
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.info(b).map(|i| i.name.as_str()), Some("Name"));
    }

    #[test]
    fn reregistration_is_idempotent() {
        let mut reg = ComponentRegistry::new();
        let first = reg.register("Level", ComponentKind::Field);
        let second = reg.register("Level", ComponentKind::Field);
        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn conflicting_kind_keeps_original() {
        let mut reg = ComponentRegistry::new();
        reg.register("IsNode", ComponentKind::Tag);
        reg.register("IsNode", ComponentKind::Field);
        assert_eq!(reg.kind_of("IsNode"), Some(ComponentKind::Tag));
    }

    #[test]
    fn names_are_sorted() {
        let mut reg = ComponentRegistry::new();
        reg.register("Value", ComponentKind::Field);
        reg.register("IsBonus", ComponentKind::Tag);
        reg.register("HolderID", ComponentKind::Field);
        assert_eq!(reg.registered_names(), vec!["HolderID", "IsBonus", "Value"]);
        assert_eq!(reg.names_of_kind(ComponentKind::Field), vec!["HolderID", "Value"]);
        assert!(reg.lookup("Missing").is_none());
    }
}
