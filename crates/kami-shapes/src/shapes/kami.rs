//! Kami assembly.
//!
//! The base kami carries identity, stats, bonuses, config and every
//! time-derived scalar (current health, cooldown, level cost) evaluated at
//! the frame's `now`. Health of a harvesting kami depends on its harvest,
//! which depends on its trait affinities; both are loaded internally when
//! needed and only exposed when their branch is requested.

use std::fmt;
use std::str::FromStr;

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::affinity::Affinity;
use crate::bonus::KamiBonuses;
use crate::codec::Stat;
use crate::components::*;
use crate::config::KamiConfig;
use crate::formulas::harvest::HarvestInputs;
use crate::formulas::{health, progression};
use crate::ids::Arg;
use crate::session::{Frame, Session};
use crate::shapes::harvest::{self, Harvest};
use crate::shapes::item::{get_flags, get_skills, Flag, Skill};
use crate::shapes::options::{HarvestOptions, KamiBranch, KamiOptions};
use crate::ShapeError;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KamiState {
    #[default]
    #[serde(rename = "RESTING")]
    Resting,
    #[serde(rename = "HARVESTING")]
    Harvesting,
    #[serde(rename = "DEAD")]
    Dead,
    /// Bridged out to an external chain; frozen in place.
    #[serde(rename = "721_EXTERNAL")]
    External,
}

impl KamiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            KamiState::Resting => "RESTING",
            KamiState::Harvesting => "HARVESTING",
            KamiState::Dead => "DEAD",
            KamiState::External => "721_EXTERNAL",
        }
    }

    /// Parse, treating an empty or unknown string as RESTING.
    pub fn parse_lenient(raw: &str) -> KamiState {
        if raw.trim().is_empty() {
            return KamiState::Resting;
        }
        raw.parse().unwrap_or_else(|err: ShapeError| {
            tracing::warn!(state = %raw, error = %err, "unparseable kami state -- treating as RESTING");
            KamiState::Resting
        })
    }
}

impl fmt::Display for KamiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KamiState {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RESTING" => Ok(KamiState::Resting),
            "HARVESTING" => Ok(KamiState::Harvesting),
            "DEAD" => Ok(KamiState::Dead),
            "721_EXTERNAL" => Ok(KamiState::External),
            _ => Err(ShapeError::UnknownState {
                value: s.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub index: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub affinity: Affinity,
    pub rarity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamiTraits {
    pub body: Option<Trait>,
    pub hand: Option<Trait>,
    pub face: Option<Trait>,
    pub background: Option<Trait>,
    pub color: Option<Trait>,
}

impl KamiTraits {
    pub fn body_affinity(&self) -> Affinity {
        self.body.as_ref().map_or(Affinity::Normal, |t| t.affinity)
    }

    pub fn hand_affinity(&self) -> Affinity {
        self.hand.as_ref().map_or(Affinity::Normal, |t| t.affinity)
    }

    /// Affinities that take part in harvest matchups: body then hand.
    pub fn affinities(&self) -> Vec<Affinity> {
        [&self.body, &self.hand]
            .into_iter()
            .flatten()
            .map(|t| t.affinity)
            .collect()
    }
}

/// Registry entry of trait `index` of type `kind` (`BODY`, `HAND`, ...).
pub fn get_trait(session: &Session<'_>, kind: &str, index: u32) -> Option<Trait> {
    let entity = session.resolve("registry.trait", &[Arg::Str(kind), Arg::U32(index)])?;
    Some(Trait {
        id: session.entity_id(entity),
        entity,
        index,
        name: session.string_of(NAME, entity),
        kind: kind.to_owned(),
        affinity: Affinity::parse_lenient(&session.string_of(AFFINITY, entity)),
        rarity: session.u32_of(RARITY, entity),
    })
}

fn load_traits(session: &Session<'_>, kami: EntityIndex) -> KamiTraits {
    let slot = |kind: &str, component: &str| {
        if !session.has(component, kami) {
            return None;
        }
        get_trait(session, kind, session.u32_of(component, kami))
    };
    KamiTraits {
        body: slot("BODY", BODY_INDEX),
        hand: slot("HAND", HAND_INDEX),
        face: slot("FACE", FACE_INDEX),
        background: slot("BACKGROUND", BACKGROUND_INDEX),
        color: slot("COLOR", COLOR_INDEX),
    }
}

// ---------------------------------------------------------------------------
// Kami
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KamiStats {
    pub health: Stat,
    pub power: Stat,
    pub harmony: Stat,
    pub violence: Stat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamiTime {
    /// Last health sync.
    pub last: u64,
    /// Last action, for cooldowns.
    pub last_action: u64,
    pub start: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kami {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub index: u32,
    pub name: String,
    pub image: String,
    pub owner_id: Option<EntityId>,
    pub level: u32,
    pub xp: u64,
    pub state: KamiState,
    pub room: u32,
    pub stats: KamiStats,
    pub bonuses: KamiBonuses,
    pub config: KamiConfig,
    pub time: KamiTime,
    /// Health at the frame's instant.
    pub current_health: i64,
    /// Health per second at the frame's instant, unrounded: positive while
    /// resting, negative while harvesting.
    pub health_rate: f64,
    /// Seconds until the kami may act again.
    pub cooldown: u64,
    /// Experience needed for the next level.
    pub level_cost: u64,
    pub can_level: bool,

    pub harvest: Option<Box<Harvest>>,
    pub traits: Option<KamiTraits>,
    pub skills: Option<Vec<Skill>>,
    pub flags: Option<Vec<Flag>>,
}

impl Kami {
    /// Whether this is the zero-identity placeholder of a missed lookup.
    pub fn is_sentinel(&self) -> bool {
        self.id.is_zero()
    }
}

fn read_stats(session: &Session<'_>, entity: EntityIndex) -> KamiStats {
    KamiStats {
        health: session.stat_of(HEALTH, entity),
        power: session.stat_of(POWER, entity),
        harmony: session.stat_of(HARMONY, entity),
        violence: session.stat_of(VIOLENCE, entity),
    }
}

/// Everything a harvest of this kami needs, read straight from the store.
pub(crate) fn harvest_inputs(session: &Session<'_>, kami: EntityIndex) -> HarvestInputs {
    let stats = read_stats(session, kami);
    HarvestInputs {
        power_total: stats.power.total,
        violence_total: stats.violence.total,
        affinities: load_traits(session, kami).affinities(),
        node_affinity: Affinity::Normal,
        config: session.kami_config(),
        bonuses: session.bonuses(session.entity_id(kami)),
    }
}

fn current_health(
    frame: &Frame<'_, '_>,
    state: KamiState,
    stats: &KamiStats,
    config: &KamiConfig,
    bonuses: &KamiBonuses,
    last: u64,
    harvest: Option<&Harvest>,
) -> i64 {
    match state {
        KamiState::Resting => {
            let rate = health::metabolism_rate(
                stats.harmony.total,
                &config.metabolism,
                bonuses.rest_metabolism_boost,
            );
            health::resting_health(&stats.health, rate, frame.elapsed_since(last))
        }
        KamiState::Harvesting => match harvest {
            Some(h) if h.is_active() => {
                let strain = health::calc_strain(
                    h.bounty,
                    stats.harmony.total,
                    &config.strain,
                    bonuses.harv_strain_boost,
                );
                health::harvesting_health(&stats.health, strain)
            }
            _ => stats.health.sync,
        },
        KamiState::Dead => 0,
        KamiState::External => stats.health.sync,
    }
}

fn health_rate(
    state: KamiState,
    stats: &KamiStats,
    config: &KamiConfig,
    bonuses: &KamiBonuses,
    harvest: Option<&Harvest>,
) -> f64 {
    match (state, harvest) {
        (KamiState::Resting, _) => health::metabolism_rate(
            stats.harmony.total,
            &config.metabolism,
            bonuses.rest_metabolism_boost,
        ),
        (KamiState::Harvesting, Some(h)) if h.is_active() => health::drain_rate(
            h.rate,
            stats.harmony.total,
            &config.strain,
            bonuses.harv_strain_boost,
        ),
        _ => 0.0,
    }
}

/// Assemble the kami at `entity`.
pub fn get_kami(frame: &Frame<'_, '_>, entity: EntityIndex, options: &KamiOptions) -> Kami {
    let session = frame.session();
    let id = session.entity_id(entity);
    let state = KamiState::parse_lenient(&session.string_of(STATE, entity));
    let harvesting = state == KamiState::Harvesting;
    let stats = read_stats(session, entity);
    let bonuses = session.bonuses(id);
    let config = session.kami_config();
    let time = KamiTime {
        last: session.u64_of(LAST_TIME, entity),
        last_action: session.u64_of(LAST_ACTION_TIME, entity),
        start: session.u64_of(START_TIME, entity),
    };
    let level = session.u32_of(LEVEL, entity);
    let xp = session.u64_of(EXPERIENCE, entity);
    let owner_id = session.id_of(OWNER_ID, entity);

    let traits = (options.loads(KamiBranch::Traits) || harvesting).then(|| load_traits(session, entity));

    let harvest = if harvesting || options.loads(KamiBranch::Harvest) {
        harvest::harvest_of(session, id).map(|h| {
            let inputs = HarvestInputs {
                power_total: stats.power.total,
                violence_total: stats.violence.total,
                affinities: traits.as_ref().map(KamiTraits::affinities).unwrap_or_default(),
                node_affinity: Affinity::Normal,
                config,
                bonuses,
            };
            let child = HarvestOptions {
                kami: false,
                node: options.harvest_node,
            };
            harvest::assemble(frame, h, inputs, &child)
        })
    } else {
        None
    };

    let current_health =
        current_health(frame, state, &stats, &config, &bonuses, time.last, harvest.as_ref());
    let health_rate = health_rate(state, &stats, &config, &bonuses, harvest.as_ref());

    let node_room = harvest
        .as_ref()
        .filter(|_| harvesting)
        .and_then(|h| h.node_id)
        .and_then(|n| session.row_of(n))
        .map(|n| session.u32_of(ROOM_INDEX, n));
    let owner_room = owner_id
        .and_then(|o| session.row_of(o))
        .map(|o| session.u32_of(ROOM_INDEX, o));
    let room = node_room
        .or(owner_room)
        .unwrap_or_else(|| session.u32_of(ROOM_INDEX, entity));

    let level_cost = progression::level_cost(config.level_base, &config.level_mult, level);

    Kami {
        id,
        entity,
        index: session.u32_of(INDEX, entity),
        name: session.string_of(NAME, entity),
        image: session.string_of(MEDIA_URI, entity),
        owner_id,
        level,
        xp,
        state,
        room,
        stats,
        bonuses,
        config,
        time,
        current_health,
        health_rate,
        cooldown: progression::cooldown_remaining(
            time.last_action,
            config.cooldown,
            bonuses.stnd_cooldown_shift,
            frame.now(),
        ),
        level_cost,
        can_level: progression::can_level(xp, level_cost),
        harvest: harvest
            .filter(|h| h.is_active() && options.shows(KamiBranch::Harvest))
            .map(Box::new),
        traits: traits.filter(|_| options.shows(KamiBranch::Traits)),
        skills: options.shows(KamiBranch::Skills).then(|| get_skills(session, id)),
        flags: options.shows(KamiBranch::Flags).then(|| get_flags(session, id)),
    }
}

pub fn get_kami_by_index(frame: &Frame<'_, '_>, index: u32, options: &KamiOptions) -> Option<Kami> {
    frame
        .kami_by_index(index)
        .map(|e| get_kami(frame, e, options))
}

pub fn get_kami_by_id(frame: &Frame<'_, '_>, id: EntityId, options: &KamiOptions) -> Option<Kami> {
    frame
        .row_of(id)
        .filter(|e| frame.has(IS_KAMI, *e))
        .map(|e| get_kami(frame, e, options))
}

/// The kami with `index`, or the zero-identity kami.
pub fn get_kami_or_sentinel(frame: &Frame<'_, '_>, index: u32, options: &KamiOptions) -> Kami {
    get_kami_by_index(frame, index, options).unwrap_or_default()
}

/// Every kami owned by `owner`, ordered by index.
pub fn get_kamis_by_owner(
    frame: &Frame<'_, '_>,
    owner: EntityId,
    options: &KamiOptions,
) -> Vec<Kami> {
    let mut kamis: Vec<Kami> = frame
        .kamis_owned_by(owner)
        .into_iter()
        .map(|e| get_kami(frame, e, options))
        .collect();
    kamis.sort_by_key(|k| k.index);
    kamis
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{AccountSeed, HarvestSeed, KamiSeed, NodeSeed, Seeder};

    const NOW: u64 = 1_700_000_000;

    fn setup_world() -> kami_store::world::World {
        let mut seed = Seeder::new();
        seed.default_config();
        seed.trait_entry("BODY", 1, "Bulb", "EERIE");
        seed.trait_entry("HAND", 2, "Claws", "SCRAP");
        let owner = seed.account(AccountSeed {
            index: 1,
            name: "ava".into(),
            room: 4,
            ..Default::default()
        });
        let node = seed.node(NodeSeed {
            index: 9,
            name: "Bog".into(),
            affinity: "EERIE".into(),
            room: 12,
            ..Default::default()
        });
        seed.kami(KamiSeed {
            index: 1,
            owner,
            name: "Rest".into(),
            health: 100,
            health_sync: 50,
            harmony: 10,
            last_time: NOW - 3600,
            body: Some(1),
            hand: Some(2),
            ..Default::default()
        });
        let worker = seed.kami(KamiSeed {
            index: 2,
            owner,
            name: "Work".into(),
            state: "HARVESTING".into(),
            health: 100,
            health_sync: 80,
            power: 20,
            harmony: 10,
            violence: 10,
            body: Some(1),
            hand: Some(2),
            ..Default::default()
        });
        seed.harvest(HarvestSeed {
            kami: worker,
            node,
            balance: 10,
            start: NOW - 600,
            last: NOW - 600,
            reset: NOW - 600,
            ..Default::default()
        });
        seed.into_world()
    }

    #[test]
    fn state_parses_and_defaults() {
        assert_eq!("721_EXTERNAL".parse::<KamiState>().unwrap(), KamiState::External);
        assert!("SLEEPING".parse::<KamiState>().is_err());
        assert_eq!(KamiState::parse_lenient("SLEEPING"), KamiState::Resting);
        assert_eq!(KamiState::parse_lenient(""), KamiState::Resting);
    }

    #[test]
    fn empty_options_populate_only_base() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let kami = get_kami_by_index(&frame, 2, &KamiOptions::default()).unwrap();
        assert_eq!(kami.name, "Work");
        assert!(kami.harvest.is_none());
        assert!(kami.traits.is_none());
        assert!(kami.skills.is_none());
        assert!(kami.flags.is_none());
    }

    #[test]
    fn harvest_branch_loads_traits_without_showing_them() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let with_traits = KamiOptions {
            harvest: true,
            traits: true,
            ..Default::default()
        };
        let without_traits = KamiOptions {
            harvest: true,
            ..Default::default()
        };
        let a = get_kami_by_index(&frame, 2, &with_traits).unwrap();
        let b = get_kami_by_index(&frame, 2, &without_traits).unwrap();
        assert!(b.traits.is_none());
        let (ha, hb) = (a.harvest.unwrap(), b.harvest.unwrap());
        assert_eq!(ha.rate, hb.rate);
        assert_eq!(ha.current_balance, hb.current_balance);
        assert!(ha.current_balance > 10);
    }

    #[test]
    fn resting_kami_regenerates_and_takes_owner_room() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let kami = get_kami_by_index(&frame, 1, &KamiOptions::default()).unwrap();
        assert!(kami.current_health > 50);
        assert!(kami.current_health <= 100);
        assert_eq!(kami.room, 4);
    }

    #[test]
    fn harvesting_kami_loses_health_and_sits_on_node_room() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let kami = get_kami_by_index(&frame, 2, &KamiOptions::default()).unwrap();
        assert!(kami.current_health < 80);
        assert_eq!(kami.room, 12);
    }

    #[test]
    fn stopped_harvest_is_not_exposed() {
        let mut seed = Seeder::new();
        seed.default_config();
        let node = seed.node(NodeSeed {
            index: 1,
            room: 3,
            ..Default::default()
        });
        let kami = seed.kami(KamiSeed {
            index: 1,
            health: 100,
            health_sync: 100,
            ..Default::default()
        });
        seed.harvest(HarvestSeed {
            kami,
            node,
            state: "INACTIVE".into(),
            balance: 25,
            start: NOW - 600,
            last: NOW - 600,
            reset: NOW - 600,
        });
        let world = seed.into_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let opts = KamiOptions {
            harvest: true,
            ..Default::default()
        };
        let kami = get_kami_by_index(&frame, 1, &opts).unwrap();
        assert_eq!(kami.state, KamiState::Resting);
        assert!(kami.harvest.is_none());
    }

    #[test]
    fn health_rate_follows_state() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let resting = get_kami_by_index(&frame, 1, &KamiOptions::default()).unwrap();
        let working = get_kami_by_index(&frame, 2, &KamiOptions::default()).unwrap();
        assert!(resting.health_rate > 0.0);
        assert!(working.health_rate < 0.0);
    }

    #[test]
    fn extreme_metabolism_bonus_saturates_health() {
        let mut seed = Seeder::new();
        seed.default_config();
        let id = seed.kami(KamiSeed {
            index: 1,
            health: 100,
            health_sync: 10,
            harmony: 10,
            last_time: NOW - 60,
            ..Default::default()
        });
        seed.bonus(id, "REST_METABOLISM_BOOST", i64::MAX);
        seed.bonus(id, "REST_METABOLISM_BOOST", i64::MAX);
        let world = seed.into_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let kami = get_kami_by_index(&frame, 1, &KamiOptions::default()).unwrap();
        assert_eq!(kami.bonuses.rest_metabolism_boost, i64::MAX);
        assert_eq!(kami.current_health, 100);
    }

    #[test]
    fn traits_resolve_from_registry() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let opts = KamiOptions {
            traits: true,
            ..Default::default()
        };
        let traits = get_kami_by_index(&frame, 1, &opts).unwrap().traits.unwrap();
        assert_eq!(traits.body_affinity(), Affinity::Eerie);
        assert_eq!(traits.hand_affinity(), Affinity::Scrap);
        assert!(traits.face.is_none());
    }

    #[test]
    fn missing_kami_is_sentinel() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        assert!(get_kami_by_index(&frame, 99, &KamiOptions::default()).is_none());
        let kami = get_kami_or_sentinel(&frame, 99, &KamiOptions::default());
        assert!(kami.is_sentinel());
        assert!(kami.entity.is_none());
    }

    #[test]
    fn repeated_assembly_is_value_equal() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let opts = KamiOptions {
            harvest: true,
            traits: true,
            skills: true,
            flags: true,
            harvest_node: true,
        };
        let a = get_kami_by_index(&frame, 2, &opts);
        let b = get_kami_by_index(&frame, 2, &opts);
        assert_eq!(a, b);
    }

    #[test]
    fn owner_lists_kamis_in_index_order() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let owner = session.entity_id(session.account_by_index(1).unwrap());
        let kamis = get_kamis_by_owner(&frame, owner, &KamiOptions::default());
        let names: Vec<_> = kamis.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["Rest", "Work"]);
    }
}
