//! The [`World`] is the in-memory reference store. It owns the component
//! registry, one sparse column per component, and the two-way map between
//! content IDs and row handles.
//!
//! Rows are never reused: a despawned entity leaves a hole, and a content ID
//! spawned again lands on a fresh row. This keeps stale row handles from
//! silently aliasing a different entity.

use std::collections::{BTreeMap, HashMap};

use crate::component::{ComponentId, ComponentKind, ComponentRegistry};
use crate::entity::{EntityId, EntityIndex};
use crate::query::Predicate;
use crate::value::Value;
use crate::{Store, StoreError};

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Sparse column store keyed by component name.
#[derive(Debug, Default)]
pub struct World {
    pub(crate) registry: ComponentRegistry,
    /// One column per registered component, indexed by `ComponentId`.
    pub(crate) columns: Vec<BTreeMap<EntityIndex, Value>>,
    /// Row -> content ID. `None` marks a despawned row.
    pub(crate) ids: Vec<Option<EntityId>>,
    pub(crate) index: HashMap<EntityId, EntityIndex>,
    epoch: u64,
}

impl World {
    /// Create an empty world with no registered components.
    pub fn new() -> Self {
        Self::default()
    }

    // -- registration ------------------------------------------------------

    /// Register a presence-only component.
    pub fn register_tag(&mut self, name: &str) -> ComponentId {
        self.register(name, ComponentKind::Tag)
    }

    /// Register a value-carrying component.
    pub fn register_field(&mut self, name: &str) -> ComponentId {
        self.register(name, ComponentKind::Field)
    }

    fn register(&mut self, name: &str, kind: ComponentKind) -> ComponentId {
        let id = self.registry.register(name, kind);
        if id.slot() >= self.columns.len() {
            self.columns.resize_with(id.slot() + 1, BTreeMap::new);
        }
        id
    }

    /// The component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    // -- entities ----------------------------------------------------------

    /// Allocate a row for `id`. Spawning a live ID returns its existing row.
    pub fn spawn(&mut self, id: EntityId) -> EntityIndex {
        if let Some(&existing) = self.index.get(&id) {
            return existing;
        }
        let entity = EntityIndex(self.ids.len() as u32);
        self.ids.push(Some(id));
        self.index.insert(id, entity);
        entity
    }

    /// Remove an entity and all its components. Bumps the epoch.
    pub fn despawn(&mut self, entity: EntityIndex) -> Result<(), StoreError> {
        let id = self.live_id(entity)?;
        for column in &mut self.columns {
            column.remove(&entity);
        }
        self.ids[entity.row()] = None;
        self.index.remove(&id);
        self.epoch += 1;
        tracing::debug!(entity = %entity, id = %id, epoch = self.epoch, "entity despawned");
        Ok(())
    }

    /// Whether `entity` refers to a live row.
    pub fn is_alive(&self, entity: EntityIndex) -> bool {
        matches!(self.ids.get(entity.row()), Some(Some(_)))
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live row handles, ascending.
    pub fn entities(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.ids
            .iter()
            .enumerate()
            .filter(|(_, id)| id.is_some())
            .map(|(row, _)| EntityIndex(row as u32))
    }

    /// Current epoch. See [`Store::epoch`].
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn live_id(&self, entity: EntityIndex) -> Result<EntityId, StoreError> {
        self.ids
            .get(entity.row())
            .copied()
            .flatten()
            .ok_or(StoreError::StaleEntity { entity })
    }

    // -- components --------------------------------------------------------

    fn resolve(&self, name: &str, expected: ComponentKind) -> Result<ComponentId, StoreError> {
        let id = self
            .registry
            .lookup(name)
            .ok_or_else(|| StoreError::UnknownComponent {
                name: name.to_owned(),
                registered: self.registry.registered_names().join(", "),
            })?;
        let registered = self.registry.kind_of(name).unwrap_or(expected);
        if registered != expected {
            return Err(StoreError::KindMismatch {
                name: name.to_owned(),
                registered,
            });
        }
        Ok(id)
    }

    /// Mark `entity` with the tag `name`.
    pub fn tag(&mut self, entity: EntityIndex, name: &str) -> Result<(), StoreError> {
        self.live_id(entity)?;
        let id = self.resolve(name, ComponentKind::Tag)?;
        self.columns[id.slot()].insert(entity, Value::Bool(true));
        Ok(())
    }

    /// Write the field `name` on `entity`, replacing any previous value.
    pub fn set(
        &mut self,
        entity: EntityIndex,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), StoreError> {
        self.live_id(entity)?;
        let id = self.resolve(name, ComponentKind::Field)?;
        self.columns[id.slot()].insert(entity, value.into());
        Ok(())
    }

    /// Remove a tag or field from `entity`, returning the previous value.
    pub fn remove(&mut self, entity: EntityIndex, name: &str) -> Result<Option<Value>, StoreError> {
        self.live_id(entity)?;
        let id = self
            .registry
            .lookup(name)
            .ok_or_else(|| StoreError::UnknownComponent {
                name: name.to_owned(),
                registered: self.registry.registered_names().join(", "),
            })?;
        Ok(self.columns[id.slot()].remove(&entity))
    }

    /// Every component present on `entity`, sorted by name.
    pub fn components_of(&self, entity: EntityIndex) -> BTreeMap<&str, &Value> {
        self.registry
            .iter()
            .filter_map(|info| {
                self.columns[info.id.slot()]
                    .get(&entity)
                    .map(|v| (info.name.as_str(), v))
            })
            .collect()
    }

    pub(crate) fn column(&self, name: &str) -> Option<&BTreeMap<EntityIndex, Value>> {
        self.registry
            .lookup(name)
            .and_then(|id| self.columns.get(id.slot()))
    }

    // -- queries -----------------------------------------------------------

    /// Row handles of every live entity matching all `predicates`, ascending.
    ///
    /// Candidates come from the column of the first positive predicate; a
    /// positive predicate on an unregistered component matches nothing. With
    /// no positive predicate every live entity is a candidate.
    pub fn run_query(&self, predicates: &[Predicate<'_>]) -> Vec<EntityIndex> {
        let seed = predicates.iter().find(|p| p.is_positive());

        let candidates: Vec<EntityIndex> = match seed {
            Some(p) => match self.column(p.component()) {
                Some(column) => column.keys().copied().collect(),
                None => return Vec::new(),
            },
            None => self.entities().collect(),
        };

        let result: Vec<EntityIndex> = candidates
            .into_iter()
            .filter(|&e| predicates.iter().all(|p| self.matches(p, e)))
            .collect();

        tracing::trace!(
            predicates = predicates.len(),
            matches = result.len(),
            "query executed"
        );
        result
    }

    fn matches(&self, predicate: &Predicate<'_>, entity: EntityIndex) -> bool {
        let cell = self
            .column(predicate.component())
            .and_then(|column| column.get(&entity));
        match (predicate, cell) {
            (Predicate::Has(_), found) => found.is_some(),
            (Predicate::HasValue(_, want), Some(v)) => v.loosely_eq(want),
            (Predicate::HasValue(_, _), None) => false,
            (Predicate::Not(_), found) => found.is_none(),
            (Predicate::NotValue(_, unwanted), Some(v)) => !v.loosely_eq(unwanted),
            (Predicate::NotValue(_, _), None) => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Store impl
// ---------------------------------------------------------------------------

impl Store for World {
    fn get_value(&self, component: &str, entity: EntityIndex) -> Option<&Value> {
        self.column(component).and_then(|column| column.get(&entity))
    }

    fn run_query(&self, predicates: &[Predicate<'_>]) -> Vec<EntityIndex> {
        World::run_query(self, predicates)
    }

    fn entity_index(&self, id: &EntityId) -> Option<EntityIndex> {
        self.index.get(id).copied()
    }

    fn entity_id(&self, entity: EntityIndex) -> Option<EntityId> {
        self.ids.get(entity.row()).copied().flatten()
    }

    fn epoch(&self) -> u64 {
        self.epoch
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_world() -> World {
        let mut world = World::new();
        world.register_tag("IsNode");
        world.register_tag("IsKami");
        world.register_field("Index");
        world.register_field("Affinity");
        world
    }

    #[test]
    fn spawn_is_idempotent_for_live_ids() {
        let mut world = setup_world();
        let id = EntityId::from(3u64);
        let a = world.spawn(id);
        let b = world.spawn(id);
        assert_eq!(a, b);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn tag_rejects_field_components() {
        let mut world = setup_world();
        let e = world.spawn(EntityId::from(1u64));
        let err = world.tag(e, "Index").unwrap_err();
        assert!(matches!(
            err,
            StoreError::KindMismatch {
                registered: ComponentKind::Field,
                ..
            }
        ));
        let err = world.set(e, "IsNode", 1u32).unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn writes_to_despawned_rows_fail() {
        let mut world = setup_world();
        let e = world.spawn(EntityId::from(1u64));
        world.despawn(e).unwrap();
        assert!(matches!(
            world.set(e, "Index", 1u32),
            Err(StoreError::StaleEntity { .. })
        ));
        assert!(world.despawn(e).is_err());
        assert!(!world.is_alive(e));
    }

    #[test]
    fn negative_predicates_filter() {
        let mut world = setup_world();
        let mut nodes = Vec::new();
        for (i, affinity) in ["EERIE", "SCRAP", "EERIE"].iter().enumerate() {
            let e = world.spawn(EntityId::from(i as u64 + 1));
            world.tag(e, "IsNode").unwrap();
            world.set(e, "Index", i as u32).unwrap();
            world.set(e, "Affinity", *affinity).unwrap();
            nodes.push(e);
        }
        world.tag(nodes[2], "IsKami").unwrap();

        let not_eerie = world.run_query(&[
            Predicate::has("IsNode"),
            Predicate::not_value("Affinity", "EERIE"),
        ]);
        assert_eq!(not_eerie, vec![nodes[1]]);

        let plain = world.run_query(&[Predicate::has("IsNode"), Predicate::not("IsKami")]);
        assert_eq!(plain, vec![nodes[0], nodes[1]]);
    }

    #[test]
    fn unknown_positive_component_matches_nothing() {
        let mut world = setup_world();
        let e = world.spawn(EntityId::from(1u64));
        world.tag(e, "IsNode").unwrap();
        assert!(world.run_query(&[Predicate::has("IsGhost")]).is_empty());
        assert_eq!(
            world.run_query(&[Predicate::has("IsNode"), Predicate::not("IsGhost")]),
            vec![e]
        );
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut world = setup_world();
        let e = world.spawn(EntityId::from(1u64));
        world.set(e, "Index", 4u32).unwrap();
        assert_eq!(world.remove(e, "Index").unwrap(), Some(Value::Int(4)));
        assert_eq!(world.remove(e, "Index").unwrap(), None);
        assert!(world.components_of(e).is_empty());
    }
}
