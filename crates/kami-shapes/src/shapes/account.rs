//! Account assembly.
//!
//! An account's content ID is its owner address. The base account carries
//! identity, room, reputation, MUSU and stamina; kamis, friendships,
//! inventory, lifetime stats and flags are branches.

use kami_store::entity::{EntityId, EntityIndex};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::codec::Stat;
use crate::components::*;
use crate::formulas::progression;
use crate::ids::Arg;
use crate::session::{Frame, Session};
use crate::shapes::item::{get_flags, get_inventories, Flag, Inventory};
use crate::shapes::kami::{get_kamis_by_owner, Kami};
use crate::shapes::options::AccountOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTime {
    pub creation: u64,
    /// Last stamina sync.
    pub last: u64,
    pub last_move: u64,
}

/// One directed friendship record, seen from the account being assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: EntityId,
    pub entity: EntityIndex,
    /// The account on the other end.
    pub account: EntityId,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendships {
    pub friends: Vec<Friendship>,
    /// Requests others sent to this account.
    pub incoming: Vec<Friendship>,
    /// Requests this account sent.
    pub outgoing: Vec<Friendship>,
    pub blocked: Vec<Friendship>,
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStats {
    pub coin_total: u64,
    pub kills: u64,
    pub deaths: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub index: u32,
    pub owner_address: String,
    pub operator_address: String,
    pub name: String,
    pub pfp: String,
    pub room: u32,
    pub reputation: u64,
    /// MUSU balance.
    pub coin: u64,
    pub stamina: Stat,
    pub current_stamina: i64,
    pub time: AccountTime,

    pub kamis: Option<Vec<Kami>>,
    pub friends: Option<Friendships>,
    pub inventory: Option<Vec<Inventory>>,
    pub stats: Option<AccountStats>,
    pub flags: Option<Vec<Flag>>,
}

impl Account {
    pub fn is_sentinel(&self) -> bool {
        self.id.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// An address field rendered as 20-byte hex; empty when absent.
fn address_of(session: &Session<'_>, component: &str, entity: EntityIndex) -> String {
    let Some(word) = session.value(component, entity).and_then(|v| v.as_u256()) else {
        return String::new();
    };
    let mut bytes = [0u8; 32];
    word.to_big_endian(&mut bytes);
    let hex: String = bytes[12..].iter().map(|b| format!("{b:02x}")).collect();
    format!("0x{hex}")
}

impl Session<'_> {
    /// A numeric `is.data` counter; zero when never written.
    pub fn data(&self, holder: EntityId, index: u32, kind: &str) -> u64 {
        self.resolve("is.data", &[holder.into(), Arg::U32(index), Arg::Str(kind)])
            .map(|e| self.u64_of(VALUE, e))
            .unwrap_or(0)
    }
}

fn friendships(session: &Session<'_>, account: EntityId) -> Friendships {
    let read = |e: EntityIndex, other: &str| Friendship {
        id: session.entity_id(e),
        entity: e,
        account: session.id_of(other, e).unwrap_or_default(),
        state: session.string_of(STATE, e),
    };
    let mut out = Friendships::default();
    for e in session.friendships_from(account) {
        let record = read(e, TARGET_ID);
        match record.state.as_str() {
            "FRIEND" => out.friends.push(record),
            "REQUEST" => out.outgoing.push(record),
            "BLOCKED" => out.blocked.push(record),
            other => tracing::trace!(state = %other, "ignoring friendship state"),
        }
    }
    for e in session.friendships_to(account) {
        let record = read(e, SOURCE_ID);
        if record.state == "REQUEST" {
            out.incoming.push(record);
        }
    }
    out
}

fn account_stats(session: &Session<'_>, account: EntityId) -> AccountStats {
    AccountStats {
        coin_total: session.data(account, 0, "COIN_TOTAL"),
        kills: session.data(account, 0, "LIQUIDATE_TOTAL"),
        deaths: session.data(account, 0, "LIQUIDATED_TOTAL"),
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

pub fn get_account(frame: &Frame<'_, '_>, entity: EntityIndex, options: &AccountOptions) -> Account {
    let session = frame.session();
    let id = session.entity_id(entity);
    let stamina = session.stat_of(STAMINA, entity);
    let time = AccountTime {
        creation: session.u64_of(CREATION_TIME, entity),
        last: session.u64_of(LAST_TIME, entity),
        last_move: session.u64_of(LAST_MOVE_TIME, entity),
    };
    let period = session.account_config().stamina_recovery_period;

    Account {
        id,
        entity,
        index: session.u32_of(INDEX, entity),
        owner_address: address_of(session, OWNER_ADDRESS, entity),
        operator_address: address_of(session, OPERATOR_ADDRESS, entity),
        name: session.string_of(NAME, entity),
        pfp: session.string_of(MEDIA_URI, entity),
        room: session.u32_of(ROOM_INDEX, entity),
        reputation: session.u64_of(REPUTATION, entity),
        coin: session.musu_balance(id),
        stamina,
        current_stamina: progression::current_stamina(&stamina, period, time.last, frame.now()),
        time,
        kamis: options
            .kamis
            .then(|| get_kamis_by_owner(frame, id, &options.kami)),
        friends: options.friends.then(|| friendships(session, id)),
        inventory: options.inventory.then(|| get_inventories(session, id)),
        stats: options.stats.then(|| account_stats(session, id)),
        flags: options.flags.then(|| get_flags(session, id)),
    }
}

pub fn get_account_by_index(
    frame: &Frame<'_, '_>,
    index: u32,
    options: &AccountOptions,
) -> Option<Account> {
    frame
        .account_by_index(index)
        .map(|e| get_account(frame, e, options))
}

pub fn get_account_by_owner(
    frame: &Frame<'_, '_>,
    owner: U256,
    options: &AccountOptions,
) -> Option<Account> {
    frame
        .account_by_owner(owner)
        .map(|e| get_account(frame, e, options))
}

pub fn get_account_by_name(
    frame: &Frame<'_, '_>,
    name: &str,
    options: &AccountOptions,
) -> Option<Account> {
    frame
        .account_by_name(name)
        .map(|e| get_account(frame, e, options))
}

/// The account with `index`, or the zero-identity account.
pub fn get_account_or_sentinel(
    frame: &Frame<'_, '_>,
    index: u32,
    options: &AccountOptions,
) -> Account {
    get_account_by_index(frame, index, options).unwrap_or_default()
}
