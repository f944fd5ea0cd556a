//! Shape assemblers.
//!
//! Every assembler builds its base shape unconditionally from a row handle
//! and populates only the branches its options select. Shapes are plain
//! values: rebuilt on every call, never cached, compared by value.
//!
//! Lookups that may miss come in three forms:
//!
//! - `get_x(frame, entity, ..)` assembles a known row.
//! - `get_x_by_*(..)` resolves a key first and returns `None` on a miss.
//! - `get_x_or_sentinel(..)` returns the zero-identity default on a miss.

pub mod account;
pub mod condition;
pub mod harvest;
pub mod item;
pub mod kami;
pub mod node;
pub mod options;
pub mod trade;

use kami_store::entity::EntityIndex;

use crate::session::Session;

/// An optional `u32` field: `None` when the field is absent.
pub(crate) fn opt_u32(session: &Session<'_>, component: &str, entity: EntityIndex) -> Option<u32> {
    session
        .has(component, entity)
        .then(|| session.u32_of(component, entity))
}
