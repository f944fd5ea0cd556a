//! Typed selection sets for the assemblers.
//!
//! A base shape is always built. Each option flag adds exactly one relational
//! branch; nothing cascades beyond what is asked for. Where a branch needs
//! data from another (harvest rates read trait affinities), the dependency
//! is declared here and the assembler loads the prerequisite itself without
//! populating its branch.

use kami_store::entity::EntityId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Kami
// ---------------------------------------------------------------------------

/// An optional branch of a kami.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KamiBranch {
    Traits,
    Harvest,
    Skills,
    Flags,
}

impl KamiBranch {
    /// Branches whose data must be loaded before this one.
    pub const fn requires(self) -> &'static [KamiBranch] {
        match self {
            KamiBranch::Harvest => &[KamiBranch::Traits],
            KamiBranch::Traits | KamiBranch::Skills | KamiBranch::Flags => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KamiOptions {
    pub harvest: bool,
    /// Populate the harvest's node (only with `harvest`).
    pub harvest_node: bool,
    pub traits: bool,
    pub skills: bool,
    pub flags: bool,
}

impl KamiOptions {
    /// Branches the caller asked to see.
    pub fn requested(&self) -> Vec<KamiBranch> {
        let mut out = Vec::new();
        if self.traits {
            out.push(KamiBranch::Traits);
        }
        if self.harvest {
            out.push(KamiBranch::Harvest);
        }
        if self.skills {
            out.push(KamiBranch::Skills);
        }
        if self.flags {
            out.push(KamiBranch::Flags);
        }
        out
    }

    /// Branches to load, prerequisites first, each once.
    pub fn load_order(&self) -> Vec<KamiBranch> {
        fn visit(branch: KamiBranch, out: &mut Vec<KamiBranch>) {
            if out.contains(&branch) {
                return;
            }
            for dep in branch.requires() {
                visit(*dep, out);
            }
            out.push(branch);
        }
        let mut out = Vec::new();
        for branch in self.requested() {
            visit(branch, &mut out);
        }
        out
    }

    /// Whether trait data is needed, to show or to feed another branch.
    pub fn loads(&self, branch: KamiBranch) -> bool {
        self.load_order().contains(&branch)
    }

    pub fn shows(&self, branch: KamiBranch) -> bool {
        self.requested().contains(&branch)
    }
}

// ---------------------------------------------------------------------------
// Account / Harvest / Node
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountOptions {
    pub kamis: bool,
    /// Options passed to each kami when `kamis` is set.
    pub kami: KamiOptions,
    pub friends: bool,
    pub inventory: bool,
    pub stats: bool,
    pub flags: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestOptions {
    pub kami: bool,
    pub node: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeOptions {
    /// Kamis currently harvesting here.
    pub kamis: bool,
    pub drops: bool,
    pub requirements: bool,
    pub scav: bool,
    /// Fill the scavenge bar's `points` for this holder (only with `scav`).
    pub scav_holder: Option<EntityId>,
}
