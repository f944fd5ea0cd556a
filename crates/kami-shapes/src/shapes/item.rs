//! Registry items, holder inventories, skills and flags.

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::ids::Arg;
use crate::session::Session;

/// Registry index of MUSU, the in-game currency item.
pub const MUSU_INDEX: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub index: u32,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    pub rarity: u32,
}

/// A holder's balance of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub item: Item,
    pub balance: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub index: u32,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub points: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub name: String,
    pub value: bool,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

pub fn get_item(session: &Session<'_>, entity: EntityIndex) -> Item {
    Item {
        id: session.entity_id(entity),
        entity,
        index: session.u32_of(INDEX, entity),
        name: session.string_of(NAME, entity),
        description: session.string_of(DESCRIPTION, entity),
        kind: session.string_of(TYPE, entity),
        image: session.string_of(MEDIA_URI, entity),
        rarity: session.u32_of(RARITY, entity),
    }
}

pub fn get_item_by_index(session: &Session<'_>, index: u32) -> Option<Item> {
    session.item_by_index(index).map(|e| get_item(session, e))
}

/// The registry entry for `index`, or an item carrying only that index when
/// the registry has no such entry.
fn item_or_placeholder(session: &Session<'_>, index: u32) -> Item {
    get_item_by_index(session, index).unwrap_or(Item {
        index,
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Inventories
// ---------------------------------------------------------------------------

impl Session<'_> {
    /// Balance of `item` held by `holder`; zero when there is no slot.
    pub fn inventory_balance(&self, holder: EntityId, item: u32) -> u64 {
        self.resolve("inventory.instance", &[holder.into(), Arg::U32(item)])
            .map(|e| self.u64_of(VALUE, e))
            .unwrap_or(0)
    }

    pub fn musu_balance(&self, holder: EntityId) -> u64 {
        self.inventory_balance(holder, MUSU_INDEX)
    }
}

pub fn get_inventory(session: &Session<'_>, entity: EntityIndex) -> Inventory {
    Inventory {
        id: session.entity_id(entity),
        entity,
        item: item_or_placeholder(session, session.u32_of(ITEM_INDEX, entity)),
        balance: session.u64_of(VALUE, entity),
    }
}

/// Non-empty inventories of `holder`, ordered by item index.
pub fn get_inventories(session: &Session<'_>, holder: EntityId) -> Vec<Inventory> {
    let mut out: Vec<Inventory> = session
        .inventories_of(holder)
        .into_iter()
        .map(|e| get_inventory(session, e))
        .filter(|inv| inv.balance > 0)
        .collect();
    out.sort_by_key(|inv| inv.item.index);
    out
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

impl Session<'_> {
    /// Points `holder` has invested in skill `index`.
    pub fn skill_points(&self, holder: EntityId, index: u32) -> u64 {
        self.resolve("skill.instance", &[holder.into(), Arg::U32(index)])
            .map(|e| self.u64_of(VALUE, e))
            .unwrap_or(0)
    }
}

/// Skills invested by `holder`, with names from the registry.
pub fn get_skills(session: &Session<'_>, holder: EntityId) -> Vec<Skill> {
    let mut out: Vec<Skill> = session
        .skills_of(holder)
        .into_iter()
        .map(|e| {
            let index = session.u32_of(INDEX, e);
            let registry = session.skill_by_index(index);
            let text = |component: &str| {
                registry
                    .map(|r| session.string_of(component, r))
                    .unwrap_or_default()
            };
            Skill {
                id: session.entity_id(e),
                entity: e,
                index,
                name: text(NAME),
                description: text(DESCRIPTION),
                kind: text(TYPE),
                points: session.u64_of(VALUE, e),
            }
        })
        .collect();
    out.sort_by_key(|s| s.index);
    out
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

fn flag_value(session: &Session<'_>, entity: EntityIndex) -> bool {
    session
        .value(VALUE, entity)
        .map_or(true, |v| v.as_bool().unwrap_or(false))
}

impl Session<'_> {
    /// Whether `holder` has `flag` set. A flag record without a value is set.
    pub fn has_flag(&self, holder: EntityId, flag: &str) -> bool {
        self.resolve("has.flag", &[holder.into(), Arg::Str(flag)])
            .is_some_and(|e| flag_value(self, e))
    }
}

pub fn get_flags(session: &Session<'_>, holder: EntityId) -> Vec<Flag> {
    session
        .flags_of(holder)
        .into_iter()
        .map(|e| Flag {
            id: session.entity_id(e),
            entity: e,
            name: session.string_of(TYPE, e),
            value: flag_value(session, e),
        })
        .collect()
}
