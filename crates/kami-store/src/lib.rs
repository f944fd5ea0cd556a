//! Kami Store -- sparse tag-and-field entity/component store.
//!
//! This crate defines the read interface the projection layer consumes
//! ([`Store`]) and an in-memory reference implementation ([`World`]) used by
//! tests, benchmarks and tooling. Entities are rows addressed by a transient
//! [`EntityIndex`] (row handle) and, independently, by a stable
//! [`EntityId`] (content ID). Every field holds a loosely typed [`Value`].
//!
//! # Quick Start
//!
//! ```
//! use kami_store::prelude::*;
//!
//! let mut world = World::new();
//! world.register_tag("IsKami");
//! world.register_field("Name");
//!
//! let kami = world.spawn(EntityId::from(7u64));
//! world.tag(kami, "IsKami").unwrap();
//! world.set(kami, "Name", "Zephyr").unwrap();
//!
//! let found = world.run_query(&[Predicate::has("IsKami"), Predicate::value("Name", "Zephyr")]);
//! assert_eq!(found, vec![kami]);
//! assert_eq!(world.get_value("Name", kami).and_then(Value::as_str), Some("Zephyr"));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod query;
pub mod snapshot;
pub mod value;
pub mod world;

pub use primitive_types::U256;

use crate::entity::{EntityId, EntityIndex};
use crate::query::Predicate;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store writes and snapshot restore.
///
/// Reads never fail: an absent field or entity is `None`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The row handle does not refer to a live entity.
    #[error("entity {entity:?} does not exist (despawned or never allocated)")]
    StaleEntity { entity: EntityIndex },

    /// A component was referenced that has not been registered.
    #[error("component '{name}' not registered. Registered components: [{registered}]")]
    UnknownComponent { name: String, registered: String },

    /// A tag was written as a field or a field was written as a tag.
    #[error("component '{name}' is registered as a {registered:?} component")]
    KindMismatch {
        name: String,
        registered: component::ComponentKind,
    },

    /// A string could not be parsed as a content ID.
    #[error("invalid entity id '{0}': expected 0x-prefixed hex or a decimal integer")]
    InvalidId(String),

    /// A snapshot failed validation.
    #[error("failed to restore snapshot: {details}")]
    Snapshot { details: String },
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The read interface of an entity/component store.
///
/// Everything the projection layer knows about the world flows through these
/// five calls. Implementations must be deterministic: identical state yields
/// identical query results in identical order.
pub trait Store {
    /// The value of `component` on `entity`, if present.
    fn get_value(&self, component: &str, entity: EntityIndex) -> Option<&Value>;

    /// Row handles of every entity matching all `predicates`, ascending.
    fn run_query(&self, predicates: &[Predicate<'_>]) -> Vec<EntityIndex>;

    /// Content ID -> row handle.
    fn entity_index(&self, id: &EntityId) -> Option<EntityIndex>;

    /// Row handle -> content ID.
    fn entity_id(&self, entity: EntityIndex) -> Option<EntityId>;

    /// Monotonic counter bumped whenever an entity is removed. Consumers that
    /// cache row handles must drop them when this changes.
    fn epoch(&self) -> u64 {
        0
    }

    /// Whether `entity` carries `component` at all.
    fn has(&self, component: &str, entity: EntityIndex) -> bool {
        self.get_value(component, entity).is_some()
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{ComponentId, ComponentKind, ComponentRegistry};
    pub use crate::entity::{EntityId, EntityIndex};
    pub use crate::query::Predicate;
    pub use crate::snapshot::{EntitySnapshot, WorldSnapshot};
    pub use crate::value::Value;
    pub use crate::world::World;
    pub use crate::{Store, StoreError, U256};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
