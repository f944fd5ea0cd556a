//! World seeding.
//!
//! [`Seeder`] writes well-formed Kamigotchi entities into a reference
//! [`World`]: every derived entity is spawned under the content ID the
//! assemblers will resolve it by, and packed fields are packed the way the
//! codec reads them. Used by tests, benchmarks and the inspector's `seed`
//! command.

use kami_store::entity::{EntityId, EntityIndex};
use kami_store::value::Value;
use kami_store::world::World;
use primitive_types::U256;

use crate::components::*;
use crate::config::*;
use crate::ids::{hash_id, Arg};

/// The instant the demo world is laid out around.
pub const DEMO_NOW: u64 = 1_700_000_000;

// ---------------------------------------------------------------------------
// Packing
// ---------------------------------------------------------------------------

/// Pack a stat word: `base | shift | boost | sync`, most significant first.
pub fn pack_stat(base: i64, shift: i64, boost: i64, sync: i64) -> U256 {
    [base, shift, boost, sync]
        .iter()
        .fold(U256::zero(), |acc, lane| (acc << 64usize) | U256::from(*lane as u64))
}

/// Pack up to eight signed 32-bit lanes, lane 0 least significant.
pub fn pack_config_array(lanes: &[i32]) -> U256 {
    lanes
        .iter()
        .take(8)
        .enumerate()
        .fold(U256::zero(), |acc, (i, lane)| {
            acc | (U256::from(*lane as u32) << (32 * i))
        })
}

/// The content ID of `(namespace, args)`. Fixture inputs are always valid.
fn derive(namespace: &str, args: &[Arg<'_>]) -> EntityId {
    hash_id(namespace, args).unwrap_or(EntityId::ZERO)
}

// ---------------------------------------------------------------------------
// Seeds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AccountSeed {
    pub index: u32,
    pub name: String,
    /// Owner address; derived from the index when zero.
    pub owner: U256,
    pub operator: U256,
    pub room: u32,
    pub reputation: u64,
    pub stamina: i64,
    pub stamina_sync: i64,
    pub creation_time: u64,
    pub last_time: u64,
}

#[derive(Debug, Clone, Default)]
pub struct KamiSeed {
    pub index: u32,
    pub owner: EntityId,
    pub name: String,
    /// Defaults to `RESTING`.
    pub state: String,
    /// Defaults to 1.
    pub level: u32,
    pub xp: u64,
    pub health: i64,
    pub health_sync: i64,
    pub power: i64,
    pub harmony: i64,
    pub violence: i64,
    pub last_time: u64,
    pub last_action_time: u64,
    pub body: Option<u32>,
    pub hand: Option<u32>,
    pub face: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct NodeSeed {
    pub index: u32,
    pub name: String,
    pub affinity: String,
    pub room: u32,
    /// Defaults to `HARVEST`.
    pub kind: String,
    /// `(item index, weight)`.
    pub drops: Vec<(u32, u64)>,
}

#[derive(Debug, Clone, Default)]
pub struct HarvestSeed {
    pub kami: EntityId,
    pub node: EntityId,
    /// Defaults to `ACTIVE`.
    pub state: String,
    pub balance: u64,
    pub start: u64,
    pub last: u64,
    pub reset: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionSeed {
    pub parent: EntityId,
    pub logic: String,
    pub kind: String,
    pub index: Option<u32>,
    pub value: Option<i64>,
    pub for_: Option<String>,
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Seeder
// ---------------------------------------------------------------------------

pub struct Seeder {
    world: World,
    next: u32,
}

impl Default for Seeder {
    fn default() -> Self {
        Self::new()
    }
}

impl Seeder {
    /// An empty world with the full schema registered.
    pub fn new() -> Self {
        let mut world = World::new();
        register_all(&mut world);
        Self { world, next: 0 }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    // -- raw writes ----------------------------------------------------------

    fn spawn(&mut self, id: EntityId, tags: &[&str]) -> EntityIndex {
        let entity = self.world.spawn(id);
        for tag in tags {
            if let Err(err) = self.world.tag(entity, tag) {
                tracing::error!(tag = %tag, error = %err, "fixture tag rejected");
            }
        }
        entity
    }

    fn put(&mut self, entity: EntityIndex, component: &str, value: impl Into<Value>) {
        if let Err(err) = self.world.set(entity, component, value) {
            tracing::error!(component = %component, error = %err, "fixture write rejected");
        }
    }

    /// An ID for a record nothing addresses by content.
    fn fresh_id(&mut self) -> EntityId {
        self.next += 1;
        derive("seed.entity", &[Arg::U32(self.next)])
    }

    // -- config ----------------------------------------------------------------

    fn config_entity(&mut self, name: &str) -> EntityIndex {
        let entity = self.spawn(derive(CONFIG_NAMESPACE, &[Arg::Str(name)]), &[IS_CONFIG]);
        self.put(entity, NAME, name);
        entity
    }

    pub fn config(&mut self, name: &str, value: u64) {
        let entity = self.config_entity(name);
        self.put(entity, VALUE, value);
    }

    pub fn config_array(&mut self, name: &str, lanes: &[i32]) {
        let entity = self.config_entity(name);
        self.put(entity, VALUE, pack_config_array(lanes));
    }

    /// Tunables in the range the live game uses.
    pub fn default_config(&mut self) {
        self.config_array(KAMI_REST_METABOLISM, &[0, 1, 3, 1000]);
        self.config_array(KAMI_HARV_FERTILITY, &[0, 6, 3, 1000]);
        self.config_array(KAMI_HARV_EFFICACY, &[3, 1000, 500, 250]);
        self.config_array(KAMI_HARV_INTENSITY, &[0, 1, 3, 1000]);
        self.config_array(KAMI_HARV_STRAIN, &[3, 1000, 3, 1000, 0, 20]);
        self.config_array(KAMI_LIQ_ANIMOSITY, &[3, 500, 3, 1000]);
        self.config_array(KAMI_LIQ_EFFICACY, &[3, 1000, 300, 200]);
        self.config_array(KAMI_LIQ_THRESHOLD, &[3, 200]);
        self.config_array(KAMI_LIQ_SALVAGE, &[3, 200]);
        self.config_array(KAMI_LIQ_SPOILS, &[3, 500]);
        self.config_array(KAMI_LIQ_KARMA, &[3, 500]);
        self.config_array(KAMI_LVL_REQ_MULT, &[3, 1500]);
        self.config(KAMI_LVL_REQ_BASE, 40);
        self.config(KAMI_STANDARD_COOLDOWN, 180);
        self.config(ACCOUNT_STAMINA_RECOVERY_PERIOD, 60);
    }

    pub fn bonus(&mut self, holder: EntityId, kind: &str, value: i64) -> EntityId {
        let id = self.fresh_id();
        let entity = self.spawn(id, &[IS_BONUS]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, TYPE, kind);
        self.put(entity, VALUE, value);
        id
    }

    // -- accounts & kamis ------------------------------------------------------

    /// Returns the account's ID, which is its owner address.
    pub fn account(&mut self, seed: AccountSeed) -> EntityId {
        let owner = if seed.owner.is_zero() {
            U256::from(0xacc0_0000u64 + u64::from(seed.index))
        } else {
            seed.owner
        };
        let id = EntityId::from(owner);
        let entity = self.spawn(id, &[IS_ACCOUNT]);
        self.put(entity, INDEX, seed.index);
        self.put(entity, NAME, seed.name);
        self.put(entity, OWNER_ADDRESS, owner);
        if !seed.operator.is_zero() {
            self.put(entity, OPERATOR_ADDRESS, seed.operator);
        }
        self.put(entity, ROOM_INDEX, seed.room);
        self.put(entity, REPUTATION, seed.reputation);
        self.put(entity, STAMINA, pack_stat(seed.stamina, 0, 0, seed.stamina_sync));
        self.put(entity, CREATION_TIME, seed.creation_time);
        self.put(entity, LAST_TIME, seed.last_time);
        id
    }

    pub fn kami(&mut self, seed: KamiSeed) -> EntityId {
        let id = derive("kami.id", &[Arg::U32(seed.index)]);
        let entity = self.spawn(id, &[IS_KAMI]);
        self.put(entity, INDEX, seed.index);
        self.put(entity, NAME, seed.name);
        if !seed.owner.is_zero() {
            self.put(entity, OWNER_ID, seed.owner);
        }
        self.put(entity, STATE, or_default(&seed.state, "RESTING"));
        self.put(entity, LEVEL, seed.level.max(1));
        self.put(entity, EXPERIENCE, seed.xp);
        self.put(entity, HEALTH, pack_stat(seed.health, 0, 0, seed.health_sync));
        self.put(entity, POWER, pack_stat(seed.power, 0, 0, 0));
        self.put(entity, HARMONY, pack_stat(seed.harmony, 0, 0, 0));
        self.put(entity, VIOLENCE, pack_stat(seed.violence, 0, 0, 0));
        self.put(entity, LAST_TIME, seed.last_time);
        self.put(entity, LAST_ACTION_TIME, seed.last_action_time);
        for (component, slot) in [(BODY_INDEX, seed.body), (HAND_INDEX, seed.hand), (FACE_INDEX, seed.face)] {
            if let Some(index) = slot {
                self.put(entity, component, index);
            }
        }
        id
    }

    pub fn trait_entry(&mut self, kind: &str, index: u32, name: &str, affinity: &str) -> EntityId {
        let id = derive("registry.trait", &[Arg::Str(kind), Arg::U32(index)]);
        let entity = self.spawn(id, &[IS_TRAIT, IS_REGISTRY]);
        self.put(entity, INDEX, index);
        self.put(entity, NAME, name);
        self.put(entity, TYPE, kind);
        self.put(entity, AFFINITY, affinity);
        id
    }

    // -- nodes & harvests ------------------------------------------------------

    pub fn node(&mut self, seed: NodeSeed) -> EntityId {
        let id = derive("node.id", &[Arg::U32(seed.index)]);
        let entity = self.spawn(id, &[IS_NODE]);
        self.put(entity, INDEX, seed.index);
        self.put(entity, NAME, seed.name);
        self.put(entity, AFFINITY, or_default(&seed.affinity, "NORMAL"));
        self.put(entity, ROOM_INDEX, seed.room);
        self.put(entity, TYPE, or_default(&seed.kind, "HARVEST"));
        if !seed.drops.is_empty() {
            let (keys, weights): (Vec<u32>, Vec<u64>) = seed.drops.into_iter().unzip();
            self.put(entity, KEYS, keys);
            self.put(entity, WEIGHTS, weights);
        }
        id
    }

    pub fn harvest(&mut self, seed: HarvestSeed) -> EntityId {
        let id = derive("harvest", &[seed.kami.into()]);
        let entity = self.spawn(id, &[IS_HARVEST]);
        self.put(entity, SOURCE_ID, seed.kami);
        self.put(entity, NODE_ID, seed.node);
        self.put(entity, STATE, or_default(&seed.state, "ACTIVE"));
        self.put(entity, VALUE, seed.balance);
        self.put(entity, START_TIME, seed.start);
        self.put(entity, LAST_TIME, seed.last);
        self.put(entity, RESET_TIME, seed.reset);
        id
    }

    pub fn node_requirement_anchor(&self, node_index: u32) -> EntityId {
        derive("node.requirement", &[Arg::U32(node_index)])
    }

    /// The scavenge bar of node `node_index`; returns the bar's ID.
    pub fn scavenge(&mut self, node_index: u32, cost: u64) -> EntityId {
        let id = derive("registry.scavenge", &[Arg::Str("NODE"), Arg::U32(node_index)]);
        let entity = self.spawn(id, &[IS_SCAVENGE, IS_REGISTRY]);
        self.put(entity, TYPE, "NODE");
        self.put(entity, INDEX, node_index);
        self.put(entity, VALUE, cost);
        id
    }

    pub fn scavenge_reward(&mut self, bar: EntityId, kind: &str, index: Option<u32>, value: i64) -> EntityId {
        let parent = derive("scavenge.reward", &[bar.into()]);
        self.allo(parent, kind, index, value)
    }

    pub fn scavenge_points(&mut self, node_index: u32, holder: EntityId, points: u64) {
        let id = derive(
            "scavenge.instance",
            &[Arg::Str("NODE"), Arg::U32(node_index), holder.into()],
        );
        let entity = self.spawn(id, &[IS_SCAVENGE]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, INDEX, node_index);
        self.put(entity, VALUE, points);
    }

    // -- items, skills, flags, counters ----------------------------------------

    pub fn item(&mut self, index: u32, name: &str, kind: &str) -> EntityId {
        let id = derive("registry.item", &[Arg::U32(index)]);
        let entity = self.spawn(id, &[IS_ITEM, IS_REGISTRY]);
        self.put(entity, INDEX, index);
        self.put(entity, NAME, name);
        self.put(entity, TYPE, kind);
        id
    }

    pub fn inventory(&mut self, holder: EntityId, item: u32, balance: u64) {
        let id = derive("inventory.instance", &[holder.into(), Arg::U32(item)]);
        let entity = self.spawn(id, &[IS_INVENTORY]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, ITEM_INDEX, item);
        self.put(entity, VALUE, balance);
    }

    pub fn skill(&mut self, index: u32, name: &str) -> EntityId {
        let id = derive("registry.skill", &[Arg::U32(index)]);
        let entity = self.spawn(id, &[IS_SKILL, IS_REGISTRY]);
        self.put(entity, INDEX, index);
        self.put(entity, NAME, name);
        id
    }

    pub fn skill_points(&mut self, holder: EntityId, index: u32, points: u64) {
        let id = derive("skill.instance", &[holder.into(), Arg::U32(index)]);
        let entity = self.spawn(id, &[IS_SKILL]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, INDEX, index);
        self.put(entity, VALUE, points);
    }

    pub fn flag(&mut self, holder: EntityId, name: &str, value: bool) {
        let id = derive("has.flag", &[holder.into(), Arg::Str(name)]);
        let entity = self.spawn(id, &[IS_FLAG]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, TYPE, name);
        self.put(entity, VALUE, value);
    }

    /// An `is.data` counter.
    pub fn data(&mut self, holder: EntityId, index: u32, kind: &str, value: u64) {
        let id = derive("is.data", &[holder.into(), Arg::U32(index), Arg::Str(kind)]);
        let entity = self.spawn(id, &[IS_DATA]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, INDEX, index);
        self.put(entity, TYPE, kind);
        self.put(entity, VALUE, value);
    }

    pub fn friendship(&mut self, source: EntityId, target: EntityId, state: &str) {
        let id = derive("friendship", &[source.into(), target.into()]);
        let entity = self.spawn(id, &[IS_FRIENDSHIP]);
        self.put(entity, SOURCE_ID, source);
        self.put(entity, TARGET_ID, target);
        self.put(entity, STATE, state);
    }

    // -- conditions & rewards --------------------------------------------------

    pub fn condition(&mut self, seed: ConditionSeed) -> EntityId {
        let id = self.fresh_id();
        let entity = self.spawn(id, &[IS_CONDITION]);
        self.put(entity, PARENT_ID, seed.parent);
        self.put(entity, LOGIC_TYPE, seed.logic);
        self.put(entity, TYPE, seed.kind);
        if let Some(index) = seed.index {
            self.put(entity, INDEX, index);
        }
        if let Some(value) = seed.value {
            self.put(entity, VALUE, value);
        }
        if let Some(for_) = seed.for_ {
            self.put(entity, FOR, for_);
        }
        id
    }

    /// The value a holder had when it accepted `condition`.
    pub fn snapshot(&mut self, holder: EntityId, condition: EntityId, value: i64) {
        let id = derive("condition.snapshot", &[holder.into(), condition.into()]);
        let entity = self.spawn(id, &[IS_DATA]);
        self.put(entity, HOLDER_ID, holder);
        self.put(entity, VALUE, value);
    }

    pub fn allo(&mut self, parent: EntityId, kind: &str, index: Option<u32>, value: i64) -> EntityId {
        let id = self.fresh_id();
        let entity = self.spawn(id, &[IS_ALLO]);
        self.put(entity, PARENT_ID, parent);
        self.put(entity, TYPE, kind);
        if let Some(index) = index {
            self.put(entity, INDEX, index);
        }
        self.put(entity, VALUE, value);
        id
    }

    // -- trading ---------------------------------------------------------------

    pub fn trade(
        &mut self,
        maker: EntityId,
        buy: &[(u32, u64)],
        sell: &[(u32, u64)],
        state: &str,
    ) -> EntityId {
        let id = self.fresh_id();
        let entity = self.spawn(id, &[IS_TRADE]);
        self.put(entity, MAKER_ID, maker);
        self.put(entity, STATE, state);
        let split = |orders: &[(u32, u64)]| -> (Vec<u32>, Vec<u64>) { orders.iter().copied().unzip() };
        let (buy_keys, buy_values) = split(buy);
        let (sell_keys, sell_values) = split(sell);
        self.put(entity, BUY_KEYS, buy_keys);
        self.put(entity, BUY_VALUES, buy_values);
        self.put(entity, SELL_KEYS, sell_keys);
        self.put(entity, SELL_VALUES, sell_values);
        id
    }

    /// A merchant listing; `scale` is the buy-back rate in per-mille.
    pub fn listing(&mut self, npc: u32, item: u32, price: u64, scale: u64) -> EntityId {
        let id = derive("listing", &[Arg::U32(npc), Arg::U32(item)]);
        let entity = self.spawn(id, &[IS_LISTING]);
        self.put(entity, NPC_INDEX, npc);
        self.put(entity, ITEM_INDEX, item);
        self.put(entity, VALUE, price);
        self.put(entity, SCALE, scale);
        id
    }

    pub fn listing_requirement_anchor(&self, listing: EntityId) -> EntityId {
        derive("listing.requirement", &[listing.into()])
    }
}

// ---------------------------------------------------------------------------
// Demo world
// ---------------------------------------------------------------------------

/// A small, fully linked world laid out around [`DEMO_NOW`].
///
/// Accounts `ava` (1) and `bo` (2); kamis Zephyr (1, resting), Pebble (2,
/// harvesting on node 1 for two hours) and Thorn (3, bo's fighter); nodes 1
/// and 3 with requirements, a drop table and a scavenge bar; a merchant
/// listing and an open trade.
pub fn demo_world() -> World {
    let now = DEMO_NOW;
    let mut seed = Seeder::new();
    seed.default_config();

    seed.item(1, "MUSU", "CURRENCY");
    seed.item(11, "Maple-Flavor Ghost Gum", "FOOD");
    seed.item(21, "Ice Cream", "FOOD");
    seed.trait_entry("BODY", 1, "Bulb", "EERIE");
    seed.trait_entry("BODY", 2, "Cube", "SCRAP");
    seed.trait_entry("HAND", 1, "Claws", "SCRAP");
    seed.trait_entry("HAND", 2, "Antennae", "INSECT");
    seed.trait_entry("FACE", 1, "Smile", "NORMAL");
    seed.skill(101, "Vigor");

    let ava = seed.account(AccountSeed {
        index: 1,
        name: "ava".into(),
        room: 1,
        reputation: 20,
        stamina: 20,
        stamina_sync: 12,
        creation_time: now - 86_400,
        last_time: now - 900,
        ..Default::default()
    });
    let bo = seed.account(AccountSeed {
        index: 2,
        name: "bo".into(),
        room: 3,
        reputation: 5,
        stamina: 20,
        stamina_sync: 20,
        creation_time: now - 43_200,
        last_time: now - 60,
        ..Default::default()
    });
    seed.friendship(ava, bo, "FRIEND");
    seed.friendship(bo, ava, "FRIEND");
    seed.inventory(ava, 1, 1_250);
    seed.inventory(ava, 11, 4);
    seed.inventory(bo, 1, 300);
    seed.data(ava, 1, "QUEST_COMPLETE", 1);
    seed.data(ava, 0, "COIN_TOTAL", 4_000);
    seed.flag(ava, "TUTORIAL_DONE", true);

    let misty = seed.node(NodeSeed {
        index: 1,
        name: "Misty Riverside".into(),
        affinity: "EERIE".into(),
        room: 1,
        drops: vec![(11, 80), (21, 20)],
        ..Default::default()
    });
    seed.node(NodeSeed {
        index: 3,
        name: "Scrapyard Exit".into(),
        affinity: "SCRAP".into(),
        room: 3,
        ..Default::default()
    });
    let node_three = seed.node_requirement_anchor(3);
    seed.condition(ConditionSeed {
        parent: node_three,
        logic: "CURR_MIN".into(),
        kind: "LEVEL".into(),
        value: Some(2),
        for_: Some("KAMI".into()),
        ..Default::default()
    });
    let bar = seed.scavenge(1, 200);
    seed.scavenge_reward(bar, "ITEM", Some(21), 1);
    seed.scavenge_points(1, ava, 120);

    let zephyr = seed.kami(KamiSeed {
        index: 1,
        owner: ava,
        name: "Zephyr".into(),
        level: 3,
        xp: 95,
        health: 120,
        health_sync: 60,
        power: 14,
        harmony: 12,
        violence: 9,
        last_time: now - 1_800,
        last_action_time: now - 60,
        body: Some(1),
        hand: Some(1),
        face: Some(1),
        ..Default::default()
    });
    seed.skill_points(zephyr, 101, 2);
    seed.bonus(zephyr, "REST_METABOLISM_BOOST", 250);

    let pebble = seed.kami(KamiSeed {
        index: 2,
        owner: ava,
        name: "Pebble".into(),
        state: "HARVESTING".into(),
        level: 2,
        health: 90,
        health_sync: 40,
        power: 18,
        harmony: 8,
        violence: 11,
        body: Some(2),
        hand: Some(2),
        ..Default::default()
    });
    seed.harvest(HarvestSeed {
        kami: pebble,
        node: misty,
        balance: 35,
        start: now - 7_200,
        last: now - 7_200,
        reset: now - 7_200,
        ..Default::default()
    });

    let thorn = seed.kami(KamiSeed {
        index: 3,
        owner: bo,
        name: "Thorn".into(),
        level: 5,
        health: 150,
        health_sync: 150,
        power: 10,
        harmony: 14,
        violence: 22,
        last_time: now - 60,
        body: Some(1),
        hand: Some(1),
        ..Default::default()
    });
    seed.bonus(thorn, "ATK_THRESHOLD_RATIO", 100);
    seed.bonus(thorn, "ATK_SPOILS_RATIO", 50);

    let listing = seed.listing(1, 11, 60, 500);
    let anchor = seed.listing_requirement_anchor(listing);
    seed.condition(ConditionSeed {
        parent: anchor,
        logic: "BOOL_IS".into(),
        kind: "QUEST".into(),
        index: Some(1),
        for_: Some("ACCOUNT".into()),
        ..Default::default()
    });
    seed.listing(1, 21, 150, 0);
    seed.trade(bo, &[(1, 100)], &[(21, 1)], "PENDING");

    seed.into_world()
}
