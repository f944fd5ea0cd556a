//! Declarative requirement and reward records.
//!
//! A condition or allo hangs off an anchor through `ParentID`. Anchors are
//! content IDs derived from what they gate (`("node.requirement", index)`,
//! `("listing.requirement", listing id)`, ...), so they need no entity of
//! their own.

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::components::{FOR, INDEX, LOGIC_TYPE, TYPE, VALUE};
use crate::session::Session;
use crate::shapes::opt_u32;

/// What a condition measures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub kind: String,
    pub index: Option<u32>,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: EntityId,
    pub entity: EntityIndex,
    /// `<HANDLER>_<OPERATOR>`, e.g. `CURR_MIN`.
    pub logic: String,
    pub target: Target,
    /// Which holder the condition applies to (`ACCOUNT`, `KAMI`), if stated.
    #[serde(rename = "for")]
    pub for_: Option<String>,
}

impl Condition {
    /// A free-standing condition, not backed by a store row.
    pub fn new(logic: &str, kind: &str, index: Option<u32>, value: Option<i64>) -> Self {
        Self {
            logic: logic.to_owned(),
            target: Target {
                kind: kind.to_owned(),
                index,
                value,
            },
            ..Default::default()
        }
    }
}

/// A reward descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allo {
    pub id: EntityId,
    pub entity: EntityIndex,
    #[serde(rename = "type")]
    pub kind: String,
    pub index: Option<u32>,
    pub value: i64,
}

impl Session<'_> {
    pub fn condition(&self, entity: EntityIndex) -> Condition {
        let for_ = self.string_of(FOR, entity);
        Condition {
            id: self.entity_id(entity),
            entity,
            logic: self.string_of(LOGIC_TYPE, entity),
            target: Target {
                kind: self.string_of(TYPE, entity),
                index: opt_u32(self, INDEX, entity),
                value: self.has(VALUE, entity).then(|| self.i64_of(VALUE, entity)),
            },
            for_: (!for_.is_empty()).then_some(for_),
        }
    }

    /// Every condition anchored under `parent`, in row order.
    pub fn conditions_for(&self, parent: EntityId) -> Vec<Condition> {
        self.conditions_under(parent)
            .into_iter()
            .map(|e| self.condition(e))
            .collect()
    }

    pub fn allo(&self, entity: EntityIndex) -> Allo {
        Allo {
            id: self.entity_id(entity),
            entity,
            kind: self.string_of(TYPE, entity),
            index: opt_u32(self, INDEX, entity),
            value: self.i64_of(VALUE, entity),
        }
    }

    pub fn allos_for(&self, parent: EntityId) -> Vec<Allo> {
        self.allos_under(parent)
            .into_iter()
            .map(|e| self.allo(e))
            .collect()
    }
}
