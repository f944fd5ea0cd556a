//! Typed queries over the store.
//!
//! Every query here carries its entity-class tag. Clauses are listed most
//! selective first (a key field before the class tag) since the store seeds
//! its candidates from the first positive clause; results do not depend on
//! the order.
//!
//! Lookups by immutable keys go through [`Session::find_unique_cached`]: the
//! first hit is memoized, misses and multiplicity violations are logged,
//! counted and degraded instead of failing.

use kami_store::entity::{EntityId, EntityIndex};
use kami_store::query::{describe, Predicate};
use primitive_types::U256;

use crate::cache::Key;
use crate::components::*;
use crate::session::Session;

impl<'s> Session<'s> {
    /// Run a raw conjunctive query.
    pub fn query(&self, predicates: &[Predicate<'_>]) -> Vec<EntityIndex> {
        self.store().run_query(predicates)
    }

    /// Query expected to match exactly one entity.
    ///
    /// Zero matches yields `None`; several matches yield the first (lowest
    /// row). Both are logged and counted in the session diagnostics.
    pub fn find_unique(&self, predicates: &[Predicate<'_>]) -> Option<EntityIndex> {
        let results = self.query(predicates);
        match results.as_slice() {
            [] => {
                self.note_unique_miss();
                tracing::warn!(query = %describe(predicates), "find-unique matched no entity");
                None
            }
            [only] => Some(*only),
            [first, ..] => {
                self.note_unique_collision();
                tracing::warn!(
                    query = %describe(predicates),
                    matches = results.len(),
                    chosen = %first,
                    "find-unique matched several entities -- using the first"
                );
                Some(*first)
            }
        }
    }

    /// [`find_unique`](Self::find_unique) memoized under `(class, key)`.
    pub fn find_unique_cached(
        &self,
        class: &'static str,
        key: Key,
        predicates: &[Predicate<'_>],
    ) -> Option<EntityIndex> {
        let cache = self.index_cache();
        if let Some(hit) = cache.get(class, &key) {
            return Some(hit);
        }
        let found = self.find_unique(predicates)?;
        cache.insert(class, key, found);
        Some(found)
    }

    // -- accounts ----------------------------------------------------------

    pub fn account_by_index(&self, index: u32) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_ACCOUNT,
            Key::Index(index),
            &[Predicate::value(INDEX, index), Predicate::has(IS_ACCOUNT)],
        )
    }

    pub fn account_by_owner(&self, owner: U256) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_ACCOUNT,
            Key::Owner(owner),
            &[Predicate::value(OWNER_ADDRESS, owner), Predicate::has(IS_ACCOUNT)],
        )
    }

    pub fn account_by_name(&self, name: &str) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_ACCOUNT,
            Key::Name(name.to_owned()),
            &[Predicate::value(NAME, name), Predicate::has(IS_ACCOUNT)],
        )
    }

    pub fn accounts_in_room(&self, room: u32) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(ROOM_INDEX, room), Predicate::has(IS_ACCOUNT)])
    }

    pub fn all_accounts(&self) -> Vec<EntityIndex> {
        self.query(&[Predicate::has(IS_ACCOUNT)])
    }

    // -- kamis -------------------------------------------------------------

    pub fn kami_by_index(&self, index: u32) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_KAMI,
            Key::Index(index),
            &[Predicate::value(INDEX, index), Predicate::has(IS_KAMI)],
        )
    }

    pub fn kami_by_name(&self, name: &str) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_KAMI,
            Key::Name(name.to_owned()),
            &[Predicate::value(NAME, name), Predicate::has(IS_KAMI)],
        )
    }

    pub fn kamis_owned_by(&self, account: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(OWNER_ID, account), Predicate::has(IS_KAMI)])
    }

    pub fn kamis_in_state(&self, state: &str) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(STATE, state), Predicate::has(IS_KAMI)])
    }

    // -- nodes & harvests --------------------------------------------------

    pub fn node_by_index(&self, index: u32) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_NODE,
            Key::Index(index),
            &[Predicate::value(INDEX, index), Predicate::has(IS_NODE)],
        )
    }

    pub fn nodes_in_room(&self, room: u32) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(ROOM_INDEX, room), Predicate::has(IS_NODE)])
    }

    /// Active harvests on a node.
    pub fn harvests_on_node(&self, node: EntityId) -> Vec<EntityIndex> {
        self.query(&[
            Predicate::value(NODE_ID, node),
            Predicate::has(IS_HARVEST),
            Predicate::value(STATE, "ACTIVE"),
        ])
    }

    // -- registries --------------------------------------------------------

    pub fn item_by_index(&self, index: u32) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_ITEM,
            Key::Index(index),
            &[
                Predicate::value(INDEX, index),
                Predicate::has(IS_ITEM),
                Predicate::has(IS_REGISTRY),
            ],
        )
    }

    pub fn skill_by_index(&self, index: u32) -> Option<EntityIndex> {
        self.find_unique_cached(
            IS_SKILL,
            Key::Index(index),
            &[
                Predicate::value(INDEX, index),
                Predicate::has(IS_SKILL),
                Predicate::has(IS_REGISTRY),
            ],
        )
    }

    // -- holder-scoped records ---------------------------------------------

    pub fn bonuses_of(&self, holder: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(HOLDER_ID, holder), Predicate::has(IS_BONUS)])
    }

    pub fn inventories_of(&self, holder: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(HOLDER_ID, holder), Predicate::has(IS_INVENTORY)])
    }

    /// Skill instances (not registry entries) held by `holder`.
    pub fn skills_of(&self, holder: EntityId) -> Vec<EntityIndex> {
        self.query(&[
            Predicate::value(HOLDER_ID, holder),
            Predicate::has(IS_SKILL),
            Predicate::not(IS_REGISTRY),
        ])
    }

    pub fn flags_of(&self, holder: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(HOLDER_ID, holder), Predicate::has(IS_FLAG)])
    }

    pub fn friendships_from(&self, source: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(SOURCE_ID, source), Predicate::has(IS_FRIENDSHIP)])
    }

    pub fn friendships_to(&self, target: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(TARGET_ID, target), Predicate::has(IS_FRIENDSHIP)])
    }

    // -- anchored records --------------------------------------------------

    pub fn conditions_under(&self, parent: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(PARENT_ID, parent), Predicate::has(IS_CONDITION)])
    }

    pub fn allos_under(&self, parent: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(PARENT_ID, parent), Predicate::has(IS_ALLO)])
    }

    // -- trading -----------------------------------------------------------

    pub fn trades(&self) -> Vec<EntityIndex> {
        self.query(&[Predicate::has(IS_TRADE)])
    }

    pub fn trades_by_maker(&self, maker: EntityId) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(MAKER_ID, maker), Predicate::has(IS_TRADE)])
    }

    pub fn listings_of_npc(&self, npc: u32) -> Vec<EntityIndex> {
        self.query(&[Predicate::value(NPC_INDEX, npc), Predicate::has(IS_LISTING)])
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
