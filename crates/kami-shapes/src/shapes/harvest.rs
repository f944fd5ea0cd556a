//! Harvest assembly.
//!
//! A harvest is addressed by `("harvest", kami id)` and links to its kami
//! through `SourceID` and to its node through `NodeID`. Balances and rates
//! are evaluated at the frame's `now`.

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::affinity::Affinity;
use crate::components::*;
use crate::formulas::harvest::{HarvestInputs, HarvestModel};
use crate::session::{Frame, Session};
use crate::shapes::kami::{self, get_kami, Kami};
use crate::shapes::node::{get_node, Node};
use crate::shapes::options::{HarvestOptions, KamiOptions, NodeOptions};

pub const ACTIVE: &str = "ACTIVE";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestTime {
    pub start: u64,
    /// Last balance sync.
    pub last: u64,
    /// Last intensity reset.
    pub reset: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub state: String,
    /// Balance as of the last sync.
    pub balance: u64,
    /// Accrued since the last sync, not yet collected.
    pub bounty: u64,
    pub current_balance: u64,
    /// Yield per second at the frame's instant.
    pub rate: f64,
    pub fertility: f64,
    pub intensity: f64,
    pub time: HarvestTime,
    pub node_id: Option<EntityId>,
    pub kami_id: Option<EntityId>,

    pub kami: Option<Box<Kami>>,
    pub node: Option<Box<Node>>,
}

impl Harvest {
    pub fn is_active(&self) -> bool {
        self.state == ACTIVE
    }
}

/// Row of the harvest belonging to kami `kami`.
pub(crate) fn harvest_of(session: &Session<'_>, kami: EntityId) -> Option<EntityIndex> {
    session.resolve("harvest", &[kami.into()])
}

/// Build a harvest with its kami's inputs already in hand.
pub(crate) fn assemble(
    frame: &Frame<'_, '_>,
    entity: EntityIndex,
    mut inputs: HarvestInputs,
    options: &HarvestOptions,
) -> Harvest {
    let session = frame.session();
    let state = session.string_of(STATE, entity);
    let balance = session.u64_of(VALUE, entity);
    let time = HarvestTime {
        start: session.u64_of(START_TIME, entity),
        last: session.u64_of(LAST_TIME, entity),
        reset: session.u64_of(RESET_TIME, entity),
    };
    let node_id = session.id_of(NODE_ID, entity);
    let kami_id = session.id_of(SOURCE_ID, entity);
    let node_row = node_id.and_then(|n| session.row_of(n));

    inputs.node_affinity = node_row
        .map(|n| Affinity::parse_lenient(&session.string_of(AFFINITY, n)))
        .unwrap_or_default();
    let model = HarvestModel::new(&inputs);

    let now = frame.now();
    let (bounty, rate, intensity) = if state == ACTIVE {
        let tau = now.saturating_sub(time.reset);
        (
            model.bounty(time.reset, time.last, now),
            model.rate_at(tau),
            model.intensity_at(tau),
        )
    } else {
        (0, 0.0, 0.0)
    };

    let kami = if options.kami {
        kami_id
            .and_then(|k| session.row_of(k))
            .map(|k| Box::new(get_kami(frame, k, &KamiOptions::default())))
    } else {
        None
    };
    let node = if options.node {
        node_row.map(|n| Box::new(get_node(frame, n, &NodeOptions::default())))
    } else {
        None
    };

    Harvest {
        id: session.entity_id(entity),
        entity,
        state,
        balance,
        bounty,
        current_balance: balance.saturating_add(bounty),
        rate,
        fertility: model.fertility,
        intensity,
        time,
        node_id,
        kami_id,
        kami,
        node,
    }
}

/// Assemble the harvest at `entity`, reading its kami's stats, traits and
/// bonuses from the store.
pub fn get_harvest(frame: &Frame<'_, '_>, entity: EntityIndex, options: &HarvestOptions) -> Harvest {
    let inputs = frame
        .id_of(SOURCE_ID, entity)
        .and_then(|k| frame.row_of(k))
        .map(|k| kami::harvest_inputs(frame, k))
        .unwrap_or_default();
    assemble(frame, entity, inputs, options)
}

/// The harvest of kami `kami`, if it has ever harvested.
pub fn get_harvest_for_kami(
    frame: &Frame<'_, '_>,
    kami: EntityId,
    options: &HarvestOptions,
) -> Option<Harvest> {
    harvest_of(frame, kami).map(|e| get_harvest(frame, e, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{HarvestSeed, KamiSeed, NodeSeed, Seeder};

    const NOW: u64 = 1_700_000_000;

    fn setup_world(state: &str) -> (kami_store::world::World, EntityId) {
        let mut seed = Seeder::new();
        seed.default_config();
        let node = seed.node(NodeSeed {
            index: 3,
            name: "Grove".into(),
            affinity: "INSECT".into(),
            room: 7,
            ..Default::default()
        });
        let kami = seed.kami(KamiSeed {
            index: 5,
            name: "Moth".into(),
            state: "HARVESTING".into(),
            health: 50,
            health_sync: 50,
            power: 30,
            harmony: 5,
            violence: 5,
            ..Default::default()
        });
        seed.harvest(HarvestSeed {
            kami,
            node,
            state: state.into(),
            balance: 7,
            start: NOW - 3600,
            last: NOW - 1800,
            reset: NOW - 3600,
        });
        (seed.into_world(), kami)
    }

    #[test]
    fn active_harvest_accrues() {
        let (world, kami) = setup_world(ACTIVE);
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let harvest = get_harvest_for_kami(&frame, kami, &HarvestOptions::default()).unwrap();
        assert!(harvest.is_active());
        assert!(harvest.bounty > 0);
        assert_eq!(harvest.current_balance, 7 + harvest.bounty);
        assert!(harvest.rate > harvest.fertility);
        assert!(harvest.kami.is_none());
        assert!(harvest.node.is_none());
    }

    #[test]
    fn stopped_harvest_is_frozen() {
        let (world, kami) = setup_world("INACTIVE");
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let harvest = get_harvest_for_kami(&frame, kami, &HarvestOptions::default()).unwrap();
        assert_eq!(harvest.bounty, 0);
        assert_eq!(harvest.current_balance, 7);
        assert_eq!(harvest.rate, 0.0);
    }

    #[test]
    fn branches_populate_kami_and_node() {
        let (world, kami) = setup_world(ACTIVE);
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let opts = HarvestOptions {
            kami: true,
            node: true,
        };
        let harvest = get_harvest_for_kami(&frame, kami, &opts).unwrap();
        assert_eq!(harvest.kami.as_ref().map(|k| k.name.as_str()), Some("Moth"));
        assert_eq!(harvest.node.as_ref().map(|n| n.room), Some(7));
        // the nested kami carries no branches of its own
        assert!(harvest.kami.unwrap().harvest.is_none());
    }

    #[test]
    fn standalone_and_nested_agree() {
        let (world, kami) = setup_world(ACTIVE);
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let standalone = get_harvest_for_kami(&frame, kami, &HarvestOptions::default()).unwrap();
        let nested = crate::shapes::kami::get_kami_by_index(
            &frame,
            5,
            &KamiOptions {
                harvest: true,
                ..Default::default()
            },
        )
        .and_then(|k| k.harvest)
        .unwrap();
        assert_eq!(standalone, *nested);
    }

    #[test]
    fn kami_without_harvest_has_none() {
        let mut seed = Seeder::new();
        let kami = seed.kami(KamiSeed {
            index: 1,
            ..Default::default()
        });
        let world = seed.into_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        assert!(get_harvest_for_kami(&frame, kami, &HarvestOptions::default()).is_none());
    }
}
