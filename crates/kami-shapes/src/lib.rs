//! Kami Shapes -- read-side projection of a Kamigotchi entity store.
//!
//! Turns the sparse tag-and-field rows of a [`kami_store::Store`] into typed,
//! nested shapes ([`Account`](shapes::account::Account),
//! [`Kami`](shapes::kami::Kami), [`Harvest`](shapes::harvest::Harvest),
//! [`Node`](shapes::node::Node), ...) and evaluates the game formulas that
//! depend on them. Nothing here writes to the store.
//!
//! Layers, leaves first:
//!
//! - [`ids`]: deterministic content addressing (keccak over packed args).
//! - [`codec`]: packed [`Stat`](codec::Stat) words and config arrays.
//! - [`session`], [`cache`], [`query`]: the per-store context, its 1:1
//!   lookup caches and typed queries.
//! - [`formulas`]: pure health / harvest / liquidation / progression math.
//! - [`shapes`]: assemblers driven by typed option sets.
//! - [`conditions`]: the declarative requirement evaluator.
//!
//! # Quick Start
//!
//! ```
//! use kami_shapes::prelude::*;
//!
//! let mut seed = Seeder::new();
//! seed.default_config();
//! let owner = seed.account(AccountSeed { index: 1, name: "ava".into(), ..Default::default() });
//! seed.kami(KamiSeed { index: 7, owner, name: "Zephyr".into(), ..Default::default() });
//! let world = seed.into_world();
//!
//! let session = Session::new(&world);
//! let frame = session.frame(1_700_000_000);
//! let kami = get_kami_by_index(&frame, 7, &KamiOptions::default()).unwrap();
//! assert_eq!(kami.name, "Zephyr");
//! assert!(kami.harvest.is_none());
//! ```

#![deny(unsafe_code)]

pub mod affinity;
pub mod bonus;
pub mod cache;
pub mod codec;
pub mod components;
pub mod conditions;
pub mod config;
pub mod fixtures;
pub mod formulas;
pub mod ids;
pub mod query;
pub mod session;
pub mod shapes;

/// Re-export the store crate for convenience.
pub use kami_store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while parsing enumerations read from the store.
///
/// Absence is never an error in this crate: a missing entity or relationship
/// is `None` (or a zero-identity sentinel). These variants only surface from
/// `FromStr` impls; assemblers log them and fall back to a neutral value.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// An affinity string outside the known set.
    #[error("unknown affinity '{value}'. Expected one of: [NORMAL, EERIE, SCRAP, INSECT]")]
    UnknownAffinity { value: String },

    /// A kami state string outside the known set.
    #[error("unknown kami state '{value}'. Expected one of: [RESTING, HARVESTING, DEAD, 721_EXTERNAL]")]
    UnknownState { value: String },

    /// A condition logic string that is not `<HANDLER>_<OPERATOR>`.
    #[error("invalid condition logic '{logic}': {reason}")]
    InvalidLogic { logic: String, reason: String },

    /// A bonus type outside the known set.
    #[error("unknown bonus type '{value}'")]
    UnknownBonus { value: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use kami_store::prelude::*;

    pub use crate::affinity::{Affinity, Matchup};
    pub use crate::bonus::{BonusType, KamiBonuses};
    pub use crate::codec::{unpack_config_array, Precise, Stat};
    pub use crate::conditions::{
        check, check_all, check_with_snapshot, ConditionStatus, Handler, Holder, Logic, Operator,
    };
    pub use crate::config::{AccountConfig, KamiConfig};
    pub use crate::fixtures::{
        demo_world, AccountSeed, ConditionSeed, HarvestSeed, KamiSeed, NodeSeed, Seeder,
    };
    pub use crate::formulas::liquidation::{analyze_liquidation, LiquidationReport};
    pub use crate::ids::{Arg, IdResolver};
    pub use crate::session::{DiagnosticsReport, Frame, Session};
    pub use crate::shapes::account::{
        get_account, get_account_by_index, get_account_by_owner, get_account_or_sentinel, Account,
    };
    pub use crate::shapes::condition::{Allo, Condition, Target};
    pub use crate::shapes::harvest::{get_harvest, get_harvest_for_kami, Harvest};
    pub use crate::shapes::item::{Inventory, Item};
    pub use crate::shapes::kami::{
        get_kami, get_kami_by_index, get_kami_or_sentinel, Kami, KamiState,
    };
    pub use crate::shapes::node::{get_node, get_node_by_index, get_node_or_sentinel, Node};
    pub use crate::shapes::options::{
        AccountOptions, HarvestOptions, KamiBranch, KamiOptions, NodeOptions,
    };
    pub use crate::shapes::trade::{get_listing, get_trade, Listing, Trade};
    pub use crate::ShapeError;
}
