//! World snapshot and restore support.
//!
//! Provides [`WorldSnapshot`], a fully serializable representation of the
//! store that can be captured, written to JSON, and loaded back into a fresh
//! [`World`]. Row handles are not part of the snapshot: restored entities get
//! new rows in snapshot order, and only content IDs survive.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::component::ComponentKind;
use crate::entity::EntityId;
use crate::value::Value;
use crate::world::World;
use crate::StoreError;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Serializable snapshot of a single entity's components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    /// Component name -> value. Tags are stored as `true`.
    /// `BTreeMap` for deterministic serialization order.
    pub components: BTreeMap<String, Value>,
}

/// A complete, serializable snapshot of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Registered tag components, sorted.
    pub tags: Vec<String>,
    /// Registered field components, sorted.
    pub fields: Vec<String>,
    /// Live entities in row order.
    pub entities: Vec<EntitySnapshot>,
}

// ---------------------------------------------------------------------------
// World snapshot/restore impl
// ---------------------------------------------------------------------------

impl World {
    /// Capture every registered component and live entity.
    pub fn capture_snapshot(&self) -> WorldSnapshot {
        let tags = owned(self.registry.names_of_kind(ComponentKind::Tag));
        let fields = owned(self.registry.names_of_kind(ComponentKind::Field));

        let entities = self
            .entities()
            .filter_map(|entity| {
                let id = self.ids.get(entity.row()).copied().flatten()?;
                let components = self
                    .components_of(entity)
                    .into_iter()
                    .map(|(name, value)| (name.to_owned(), value.clone()))
                    .collect();
                Some(EntitySnapshot { id, components })
            })
            .collect();

        WorldSnapshot {
            tags,
            fields,
            entities,
        }
    }

    /// Build a world from a snapshot.
    ///
    /// The snapshot is validated before any state is built: every component
    /// an entity uses must be declared, no name may be both a tag and a
    /// field, and content IDs must be unique.
    pub fn from_snapshot(snapshot: &WorldSnapshot) -> Result<World, StoreError> {
        validate(snapshot)?;

        let mut world = World::new();
        for name in &snapshot.tags {
            world.register_tag(name);
        }
        for name in &snapshot.fields {
            world.register_field(name);
        }

        for entity in &snapshot.entities {
            let row = world.spawn(entity.id);
            for (name, value) in &entity.components {
                match world.registry.kind_of(name) {
                    Some(ComponentKind::Tag) => world.tag(row, name)?,
                    Some(ComponentKind::Field) => world.set(row, name, value.clone())?,
                    None => {
                        return Err(StoreError::Snapshot {
                            details: format!("component '{name}' vanished during restore"),
                        })
                    }
                }
            }
        }

        tracing::debug!(
            entities = world.len(),
            components = world.registry.len(),
            "world restored from snapshot"
        );
        Ok(world)
    }
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_owned).collect()
}

fn validate(snapshot: &WorldSnapshot) -> Result<(), StoreError> {
    let tags: HashSet<&str> = snapshot.tags.iter().map(String::as_str).collect();
    let fields: HashSet<&str> = snapshot.fields.iter().map(String::as_str).collect();

    if let Some(both) = tags.intersection(&fields).next() {
        return Err(StoreError::Snapshot {
            details: format!("component '{both}' declared as both tag and field"),
        });
    }

    let mut seen = HashSet::new();
    for entity in &snapshot.entities {
        if !seen.insert(entity.id) {
            return Err(StoreError::Snapshot {
                details: format!("duplicate entity id {}", entity.id),
            });
        }
        for name in entity.components.keys() {
            if !tags.contains(name.as_str()) && !fields.contains(name.as_str()) {
                return Err(StoreError::Snapshot {
                    details: format!(
                        "entity {} uses undeclared component '{name}'",
                        entity.id
                    ),
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Predicate;
    use crate::Store;

    fn setup_world() -> World {
        let mut world = World::new();
        world.register_tag("IsKami");
        world.register_field("Name");
        world.register_field("Level");
        for i in 1..=3u64 {
            let e = world.spawn(EntityId::from(i * 10));
            world.tag(e, "IsKami").unwrap();
            world.set(e, "Name", format!("kami {i}")).unwrap();
            world.set(e, "Level", i).unwrap();
        }
        world
    }

    #[test]
    fn capture_then_restore_preserves_content() {
        let world = setup_world();
        let snap = world.capture_snapshot();
        assert_eq!(snap.tags, vec!["IsKami"]);
        assert_eq!(snap.fields, vec!["Level", "Name"]);
        assert_eq!(snap.entities.len(), 3);

        let json = serde_json::to_string(&snap).unwrap();
        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        let restored = World::from_snapshot(&back).unwrap();

        assert_eq!(restored.capture_snapshot(), snap);
        let id = EntityId::from(20u64);
        let e = restored.entity_index(&id).unwrap();
        assert_eq!(
            restored.get_value("Name", e).and_then(Value::as_str),
            Some("kami 2")
        );
        assert_eq!(
            restored.run_query(&[Predicate::has("IsKami")]).len(),
            3
        );
    }

    #[test]
    fn despawned_entities_are_not_captured() {
        let mut world = setup_world();
        let e = world.entity_index(&EntityId::from(10u64)).unwrap();
        world.despawn(e).unwrap();
        let snap = world.capture_snapshot();
        assert_eq!(snap.entities.len(), 2);
        assert!(snap.entities.iter().all(|s| s.id != EntityId::from(10u64)));
    }

    #[test]
    fn undeclared_component_is_rejected_before_restore() {
        let mut snap = setup_world().capture_snapshot();
        snap.entities[1]
            .components
            .insert("Ghost".into(), Value::Int(1));
        let err = World::from_snapshot(&snap).unwrap_err();
        assert!(matches!(err, StoreError::Snapshot { .. }));
        assert!(err.to_string().contains("Ghost"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut snap = setup_world().capture_snapshot();
        let dup = snap.entities[0].clone();
        snap.entities.push(dup);
        assert!(World::from_snapshot(&snap).is_err());
    }

    #[test]
    fn tag_field_overlap_is_rejected() {
        let mut snap = setup_world().capture_snapshot();
        snap.fields.push("IsKami".into());
        let err = World::from_snapshot(&snap).unwrap_err();
        assert!(err.to_string().contains("both tag and field"));
    }
}
