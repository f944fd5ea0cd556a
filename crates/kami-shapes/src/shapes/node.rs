//! Harvest node assembly.

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::affinity::Affinity;
use crate::components::*;
use crate::ids::Arg;
use crate::session::{Frame, Session};
use crate::shapes::condition::{Allo, Condition};
use crate::shapes::kami::{get_kami, Kami};
use crate::shapes::options::{KamiOptions, NodeOptions};

/// One weighted entry of a node's drop table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDrop {
    pub item: u32,
    pub weight: u64,
}

/// The scavenge bar of a node: points fill it, each full bar pays out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScavBar {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub node_index: u32,
    /// Points per payout.
    pub cost: u64,
    pub rewards: Vec<Allo>,
    /// Points a given holder has accumulated, when one was asked for.
    pub points: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: EntityId,
    pub entity: EntityIndex,
    pub index: u32,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub affinity: Affinity,
    pub room: u32,

    /// Kamis harvesting here right now.
    pub kamis: Option<Vec<Kami>>,
    pub drops: Option<Vec<NodeDrop>>,
    pub requirements: Option<Vec<Condition>>,
    pub scav: Option<ScavBar>,
}

impl Node {
    pub fn is_sentinel(&self) -> bool {
        self.id.is_zero()
    }
}

/// Anchor under which the requirements of node `index` hang.
pub fn node_requirement_anchor(session: &Session<'_>, index: u32) -> Option<EntityId> {
    session.content_id("node.requirement", &[Arg::U32(index)])
}

impl Session<'_> {
    pub fn scav_bar(&self, node_index: u32) -> Option<ScavBar> {
        let entity = self.resolve("registry.scavenge", &[Arg::Str("NODE"), Arg::U32(node_index)])?;
        let id = self.entity_id(entity);
        let rewards = self
            .content_id("scavenge.reward", &[id.into()])
            .map(|anchor| self.allos_for(anchor))
            .unwrap_or_default();
        Some(ScavBar {
            id,
            entity,
            node_index,
            cost: self.u64_of(VALUE, entity),
            rewards,
            points: None,
        })
    }

    /// The scavenge bar of `node_index` with `holder`'s points filled in.
    pub fn scav_bar_for(&self, node_index: u32, holder: EntityId) -> Option<ScavBar> {
        let mut bar = self.scav_bar(node_index)?;
        bar.points = Some(self.scav_points(node_index, holder));
        Some(bar)
    }

    /// Scavenge points `holder` has accumulated on node `node_index`.
    pub fn scav_points(&self, node_index: u32, holder: EntityId) -> u64 {
        self.resolve(
            "scavenge.instance",
            &[Arg::Str("NODE"), Arg::U32(node_index), holder.into()],
        )
        .map(|e| self.u64_of(VALUE, e))
        .unwrap_or(0)
    }
}

fn drops(session: &Session<'_>, entity: EntityIndex) -> Vec<NodeDrop> {
    let keys = session.u64_array_of(KEYS, entity);
    let weights = session.u64_array_of(WEIGHTS, entity);
    if keys.len() != weights.len() {
        tracing::warn!(
            node = %entity,
            keys = keys.len(),
            weights = weights.len(),
            "drop table keys and weights differ in length -- truncating"
        );
    }
    keys.into_iter()
        .zip(weights)
        .map(|(item, weight)| NodeDrop {
            item: u32::try_from(item).unwrap_or(u32::MAX),
            weight,
        })
        .collect()
}

fn harvesting_kamis(frame: &Frame<'_, '_>, node: EntityId) -> Vec<Kami> {
    let mut kamis: Vec<Kami> = frame
        .harvests_on_node(node)
        .into_iter()
        .filter_map(|h| frame.id_of(SOURCE_ID, h))
        .filter_map(|k| frame.row_of(k))
        .map(|k| get_kami(frame, k, &KamiOptions::default()))
        .collect();
    kamis.sort_by_key(|k| k.index);
    kamis
}

pub fn get_node(frame: &Frame<'_, '_>, entity: EntityIndex, options: &NodeOptions) -> Node {
    let session = frame.session();
    let id = session.entity_id(entity);
    let index = session.u32_of(INDEX, entity);

    Node {
        id,
        entity,
        index,
        name: session.string_of(NAME, entity),
        description: session.string_of(DESCRIPTION, entity),
        kind: session.string_of(TYPE, entity),
        affinity: Affinity::parse_lenient(&session.string_of(AFFINITY, entity)),
        room: session.u32_of(ROOM_INDEX, entity),
        kamis: options.kamis.then(|| harvesting_kamis(frame, id)),
        drops: options.drops.then(|| drops(session, entity)),
        requirements: options.requirements.then(|| {
            node_requirement_anchor(session, index)
                .map(|anchor| session.conditions_for(anchor))
                .unwrap_or_default()
        }),
        scav: match (options.scav, options.scav_holder) {
            (false, _) => None,
            (true, Some(holder)) => session.scav_bar_for(index, holder),
            (true, None) => session.scav_bar(index),
        },
    }
}

pub fn get_node_by_index(frame: &Frame<'_, '_>, index: u32, options: &NodeOptions) -> Option<Node> {
    frame
        .node_by_index(index)
        .map(|e| get_node(frame, e, options))
}

pub fn get_node_or_sentinel(frame: &Frame<'_, '_>, index: u32, options: &NodeOptions) -> Node {
    get_node_by_index(frame, index, options).unwrap_or_default()
}

/// Nodes in room `room`, ordered by index.
pub fn get_nodes_in_room(frame: &Frame<'_, '_>, room: u32, options: &NodeOptions) -> Vec<Node> {
    let mut nodes: Vec<Node> = frame
        .nodes_in_room(room)
        .into_iter()
        .map(|e| get_node(frame, e, options))
        .collect();
    nodes.sort_by_key(|n| n.index);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ConditionSeed, HarvestSeed, KamiSeed, NodeSeed, Seeder};

    const NOW: u64 = 1_700_000_000;

    fn setup_world() -> (kami_store::world::World, EntityId) {
        let mut seed = Seeder::new();
        seed.default_config();
        let node = seed.node(NodeSeed {
            index: 2,
            name: "Marsh".into(),
            affinity: "SCRAP".into(),
            room: 8,
            kind: "HARVEST".into(),
            drops: vec![(1, 70), (11, 30)],
        });
        for (index, state) in [(1, "HARVESTING"), (2, "HARVESTING"), (3, "RESTING")] {
            let kami = seed.kami(KamiSeed {
                index,
                name: format!("k{index}"),
                state: state.into(),
                ..Default::default()
            });
            seed.harvest(HarvestSeed {
                kami,
                node,
                state: if state == "HARVESTING" { "ACTIVE" } else { "INACTIVE" }.into(),
                ..Default::default()
            });
        }
        let anchor = seed.node_requirement_anchor(2);
        seed.condition(ConditionSeed {
            parent: anchor,
            logic: "CURR_MIN".into(),
            kind: "LEVEL".into(),
            value: Some(3),
            ..Default::default()
        });
        let bar = seed.scavenge(2, 100);
        seed.scavenge_reward(bar, "ITEM", Some(11), 1);
        let holder = EntityId::from(0x77u64);
        seed.scavenge_points(2, holder, 40);
        (seed.into_world(), holder)
    }

    #[test]
    fn base_node_has_no_branches() {
        let (world, _) = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let node = get_node_by_index(&frame, 2, &NodeOptions::default()).unwrap();
        assert_eq!(node.affinity, Affinity::Scrap);
        assert_eq!(node.room, 8);
        assert!(node.kamis.is_none() && node.drops.is_none());
        assert!(node.requirements.is_none() && node.scav.is_none());
    }

    #[test]
    fn branches_populate() {
        let (world, holder) = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let opts = NodeOptions {
            kamis: true,
            drops: true,
            requirements: true,
            scav: true,
            scav_holder: None,
        };
        let node = get_node_by_index(&frame, 2, &opts).unwrap();
        let names: Vec<_> = node.kamis.unwrap().into_iter().map(|k| k.name).collect();
        assert_eq!(names, ["k1", "k2"]);
        assert_eq!(node.drops.unwrap()[1], NodeDrop { item: 11, weight: 30 });
        assert_eq!(node.requirements.unwrap()[0].target.kind, "LEVEL");
        let scav = node.scav.unwrap();
        assert_eq!(scav.cost, 100);
        assert_eq!(scav.rewards.len(), 1);
        assert_eq!(scav.points, None);
        assert_eq!(session.scav_points(2, holder), 40);
        assert_eq!(session.scav_points(3, holder), 0);
    }

    #[test]
    fn scav_bar_carries_holder_points() {
        let (world, holder) = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let opts = NodeOptions {
            scav: true,
            scav_holder: Some(holder),
            ..Default::default()
        };
        let scav = get_node_by_index(&frame, 2, &opts).unwrap().scav.unwrap();
        assert_eq!(scav.points, Some(40));

        let stranger = EntityId::from(0x78u64);
        let scav = session.scav_bar_for(2, stranger).unwrap();
        assert_eq!(scav.points, Some(0));
        assert!(session.scav_bar_for(3, holder).is_none());
    }

    #[test]
    fn missing_node_is_sentinel() {
        let (world, _) = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        assert!(get_node_or_sentinel(&frame, 40, &NodeOptions::default()).is_sentinel());
        assert_eq!(get_nodes_in_room(&frame, 8, &NodeOptions::default()).len(), 1);
    }
}
