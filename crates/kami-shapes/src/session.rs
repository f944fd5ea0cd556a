//! The per-store read context.
//!
//! A [`Session`] borrows one store and owns everything that is cached about
//! it: resolved content IDs, 1:1 index lookups, and the diagnostic counters
//! for degraded reads. Two sessions over two stores never share state.
//!
//! A [`Frame`] pins a single as-of timestamp. Every time-dependent value in
//! one assembly (health, harvest balance, cooldown, stamina) is computed from
//! the frame's `now`, so fields never drift relative to each other.

use std::cell::Cell;
use std::ops::Deref;

use kami_store::entity::{EntityId, EntityIndex};
use kami_store::value::Value;
use kami_store::Store;
use serde::{Deserialize, Serialize};

use crate::cache::IndexCache;
use crate::codec::Stat;
use crate::ids::{Arg, IdResolver};

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Counters for reads that degraded instead of failing.
#[derive(Debug, Default)]
struct Diagnostics {
    unique_misses: Cell<u64>,
    unique_collisions: Cell<u64>,
    unknown_handlers: Cell<u64>,
    holder_mismatches: Cell<u64>,
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get() + 1);
}

/// Serializable view of a session's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    /// Find-unique queries that matched nothing.
    pub unique_misses: u64,
    /// Find-unique queries that matched more than one entity.
    pub unique_collisions: u64,
    /// Conditions skipped because their logic was not understood.
    pub unknown_handlers: u64,
    /// Conditions checked against a holder of the wrong kind.
    pub holder_mismatches: u64,
    /// Keccak invocations.
    pub id_hashes: u64,
    /// Content IDs served from the resolver cache.
    pub id_cache_hits: u64,
    /// 1:1 lookups served from the index cache.
    pub index_cache_hits: u64,
    /// Times the index cache was cleared.
    pub cache_resets: u64,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session<'s> {
    store: &'s dyn Store,
    ids: IdResolver,
    index: IndexCache,
    diagnostics: Diagnostics,
    seen_epoch: Cell<u64>,
}

impl<'s> Session<'s> {
    pub fn new(store: &'s dyn Store) -> Self {
        Self {
            store,
            ids: IdResolver::new(),
            index: IndexCache::new(),
            diagnostics: Diagnostics::default(),
            seen_epoch: Cell::new(store.epoch()),
        }
    }

    pub fn store(&self) -> &'s dyn Store {
        self.store
    }

    pub fn ids(&self) -> &IdResolver {
        &self.ids
    }

    /// Pin `now` (unix seconds) for one assembly pass.
    pub fn frame(&self, now: u64) -> Frame<'_, 's> {
        Frame { session: self, now }
    }

    /// Drop every cached row handle. Resolved content IDs are kept: they are
    /// pure functions of their inputs.
    pub fn reset_caches(&self) {
        self.index.clear();
        self.seen_epoch.set(self.store.epoch());
        tracing::debug!("session index cache reset");
    }

    /// The index cache, cleared first if the store has removed entities
    /// since it was last consulted.
    pub(crate) fn index_cache(&self) -> &IndexCache {
        let epoch = self.store.epoch();
        if epoch != self.seen_epoch.get() {
            tracing::debug!(
                previous = self.seen_epoch.get(),
                current = epoch,
                "store epoch moved -- clearing index cache"
            );
            self.index.clear();
            self.seen_epoch.set(epoch);
        }
        &self.index
    }

    pub fn diagnostics(&self) -> DiagnosticsReport {
        DiagnosticsReport {
            unique_misses: self.diagnostics.unique_misses.get(),
            unique_collisions: self.diagnostics.unique_collisions.get(),
            unknown_handlers: self.diagnostics.unknown_handlers.get(),
            holder_mismatches: self.diagnostics.holder_mismatches.get(),
            id_hashes: self.ids.hash_count(),
            id_cache_hits: self.ids.cache_hits(),
            index_cache_hits: self.index.hits(),
            cache_resets: self.index.resets(),
        }
    }

    pub(crate) fn note_unique_miss(&self) {
        bump(&self.diagnostics.unique_misses);
    }

    pub(crate) fn note_unique_collision(&self) {
        bump(&self.diagnostics.unique_collisions);
    }

    pub(crate) fn note_unknown_handler(&self) {
        bump(&self.diagnostics.unknown_handlers);
    }

    pub(crate) fn note_holder_mismatch(&self) {
        bump(&self.diagnostics.holder_mismatches);
    }

    // -- addressing --------------------------------------------------------

    /// Content ID for `(namespace, args)`; `None` on invalid input.
    pub fn content_id(&self, namespace: &str, args: &[Arg<'_>]) -> Option<EntityId> {
        self.ids.id(namespace, args)
    }

    /// Row handle of the entity addressed by `(namespace, args)`.
    pub fn resolve(&self, namespace: &str, args: &[Arg<'_>]) -> Option<EntityIndex> {
        self.ids.resolve(self.store, namespace, args)
    }

    /// Content ID of a row, or the zero ID.
    pub fn entity_id(&self, entity: EntityIndex) -> EntityId {
        self.store.entity_id(entity).unwrap_or(EntityId::ZERO)
    }

    /// Row handle of a referenced entity. The zero ID never resolves.
    pub fn row_of(&self, id: EntityId) -> Option<EntityIndex> {
        if id.is_zero() {
            return None;
        }
        self.store.entity_index(&id)
    }

    // -- field reads -------------------------------------------------------
    //
    // Missing fields decode to zero / empty so absent data never reaches a
    // formula as garbage.

    pub fn value(&self, component: &str, entity: EntityIndex) -> Option<&'s Value> {
        let store: &'s dyn Store = self.store;
        store.get_value(component, entity)
    }

    pub fn has(&self, component: &str, entity: EntityIndex) -> bool {
        self.store.has(component, entity)
    }

    pub fn u64_of(&self, component: &str, entity: EntityIndex) -> u64 {
        self.value(component, entity)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    pub fn u32_of(&self, component: &str, entity: EntityIndex) -> u32 {
        u32::try_from(self.u64_of(component, entity)).unwrap_or(u32::MAX)
    }

    pub fn i64_of(&self, component: &str, entity: EntityIndex) -> i64 {
        self.value(component, entity)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    pub fn string_of(&self, component: &str, entity: EntityIndex) -> String {
        self.value(component, entity)
            .map(|v| match v {
                Value::Text(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_default()
    }

    /// A reference field. The zero ID counts as absent.
    pub fn id_of(&self, component: &str, entity: EntityIndex) -> Option<EntityId> {
        self.value(component, entity)
            .and_then(Value::as_entity_id)
            .filter(|id| !id.is_zero())
    }

    pub fn stat_of(&self, component: &str, entity: EntityIndex) -> Stat {
        Stat::from_value(self.value(component, entity))
    }

    /// An array field coerced element-wise; non-numeric elements are zero.
    pub fn u64_array_of(&self, component: &str, entity: EntityIndex) -> Vec<u64> {
        self.value(component, entity)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(|v| v.as_u64().unwrap_or(0)).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("epoch", &self.seen_epoch.get())
            .field("cached_ids", &self.ids.len())
            .field("cached_rows", &self.index.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// A session pinned to one instant.
#[derive(Clone, Copy)]
pub struct Frame<'a, 's> {
    session: &'a Session<'s>,
    now: u64,
}

impl<'a, 's> Frame<'a, 's> {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn session(&self) -> &'a Session<'s> {
        self.session
    }

    /// Seconds from `then` to now, zero if `then` is in the future.
    pub fn elapsed_since(&self, then: u64) -> u64 {
        self.now.saturating_sub(then)
    }
}

impl<'s> Deref for Frame<'_, 's> {
    type Target = Session<'s>;

    fn deref(&self) -> &Self::Target {
        self.session
    }
}

impl std::fmt::Debug for Frame<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame").field("now", &self.now).finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
