//! Player trades and merchant listings.

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::formulas::progression;
use crate::ids::Arg;
use crate::session::Session;
use crate::shapes::condition::Condition;
use crate::shapes::item::{get_item_by_index, Item};

/// One side of a trade: an item and an amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub item: Item,
    pub amount: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub maker: Option<EntityId>,
    pub taker: Option<EntityId>,
    pub state: String,
    /// What the maker wants.
    pub buy: Vec<Order>,
    /// What the maker gives.
    pub sell: Vec<Order>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub npc: u32,
    pub item: Item,
    /// What the merchant charges.
    pub buy_price: u64,
    /// What the merchant pays; `None` when it does not buy back.
    pub sell_price: Option<u64>,
    pub requirements: Vec<Condition>,
}

fn orders(session: &Session<'_>, keys: &str, values: &str, entity: EntityIndex) -> Vec<Order> {
    let keys = session.u64_array_of(keys, entity);
    let amounts = session.u64_array_of(values, entity);
    keys.into_iter()
        .zip(amounts)
        .map(|(index, amount)| {
            let index = u32::try_from(index).unwrap_or(u32::MAX);
            Order {
                item: get_item_by_index(session, index).unwrap_or(Item {
                    index,
                    ..Default::default()
                }),
                amount,
            }
        })
        .collect()
}

pub fn get_trade(session: &Session<'_>, entity: EntityIndex) -> Trade {
    Trade {
        id: session.entity_id(entity),
        entity,
        maker: session.id_of(MAKER_ID, entity),
        taker: session.id_of(TAKER_ID, entity),
        state: session.string_of(STATE, entity),
        buy: orders(session, BUY_KEYS, BUY_VALUES, entity),
        sell: orders(session, SELL_KEYS, SELL_VALUES, entity),
    }
}

/// Every trade, optionally restricted to one maker and one state.
pub fn get_trades(session: &Session<'_>, maker: Option<EntityId>, state: Option<&str>) -> Vec<Trade> {
    let rows = match maker {
        Some(m) => session.trades_by_maker(m),
        None => session.trades(),
    };
    rows.into_iter()
        .map(|e| get_trade(session, e))
        .filter(|t| state.map_or(true, |s| t.state == s))
        .collect()
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

pub fn listing_requirement_anchor(session: &Session<'_>, listing: EntityId) -> Option<EntityId> {
    session.content_id("listing.requirement", &[listing.into()])
}

pub fn get_listing(session: &Session<'_>, entity: EntityIndex) -> Listing {
    let id = session.entity_id(entity);
    let index = session.u32_of(ITEM_INDEX, entity);
    let buy_price = session.u64_of(VALUE, entity);
    Listing {
        id,
        entity,
        npc: session.u32_of(NPC_INDEX, entity),
        item: get_item_by_index(session, index).unwrap_or(Item {
            index,
            ..Default::default()
        }),
        buy_price,
        sell_price: progression::sell_price(buy_price, session.u64_of(SCALE, entity)),
        requirements: listing_requirement_anchor(session, id)
            .map(|anchor| session.conditions_for(anchor))
            .unwrap_or_default(),
    }
}

/// The listing of `item` at merchant `npc`.
pub fn get_listing_by(session: &Session<'_>, npc: u32, item: u32) -> Option<Listing> {
    session
        .resolve("listing", &[Arg::U32(npc), Arg::U32(item)])
        .map(|e| get_listing(session, e))
}

/// A merchant's listings, ordered by item index.
pub fn get_listings_of_npc(session: &Session<'_>, npc: u32) -> Vec<Listing> {
    let mut out: Vec<Listing> = session
        .listings_of_npc(npc)
        .into_iter()
        .map(|e| get_listing(session, e))
        .collect();
    out.sort_by_key(|l| l.item.index);
    out
}
