//! kami-inspect: print assembled Kamigotchi shapes from a store snapshot.
//!
//! Usage:
//!   kami-inspect seed --out world.json
//!   kami-inspect --world world.json kami 2 --harvest --traits
//!   kami-inspect --world world.json liquidation 3 2
//!   kami-inspect requirements listing 1 11 --account 1
//!
//! Without `--world` every command runs against the built-in demo world.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use kami_shapes::fixtures::DEMO_NOW;
use kami_shapes::prelude::*;
use kami_shapes::shapes::account::get_account_by_name;
use kami_shapes::shapes::node::node_requirement_anchor;
use kami_shapes::shapes::trade::get_listing_by;

/// Inspect the read-side projection of a Kamigotchi world
#[derive(Parser, Debug)]
#[command(name = "kami-inspect")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// World snapshot (JSON); the demo world when omitted
    #[arg(short, long, global = true, value_name = "PATH")]
    world: Option<PathBuf>,

    /// As-of unix timestamp; the demo instant for the demo world, else now
    #[arg(long, global = true)]
    now: Option<u64>,

    /// Print session diagnostics to stderr when done
    #[arg(long, global = true)]
    diagnostics: bool,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the demo world as a snapshot
    Seed {
        /// Output file (default: stdout)
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Assemble an account by index, owner address or name
    Account {
        #[arg(required_unless_present_any = ["owner", "name"])]
        index: Option<u32>,

        /// Owner address (hex)
        #[arg(long, conflicts_with = "index")]
        owner: Option<String>,

        #[arg(long, conflicts_with_all = ["index", "owner"])]
        name: Option<String>,

        #[command(flatten)]
        branches: AccountBranches,
    },

    /// Assemble a kami by index
    Kami {
        index: u32,

        #[command(flatten)]
        branches: KamiBranches,
    },

    /// Assemble a node by index
    Node {
        index: u32,

        /// Include harvesting kamis, drops, requirements and the scavenge bar
        #[arg(long)]
        all: bool,

        /// Show this account's scavenge points on the bar (with --all)
        #[arg(long, value_name = "INDEX")]
        account: Option<u32>,
    },

    /// Liquidation math of one kami against another
    Liquidation { attacker: u32, defender: u32 },

    /// Evaluate the requirements of a node or listing
    Requirements {
        #[command(subcommand)]
        target: RequirementTarget,
    },
}

#[derive(Subcommand, Debug)]
enum RequirementTarget {
    /// Node requirements, checked against a kami
    Node {
        node: u32,
        #[arg(long)]
        kami: u32,
    },
    /// Listing requirements, checked against an account
    Listing {
        npc: u32,
        item: u32,
        #[arg(long)]
        account: u32,
    },
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct KamiBranches {
    #[arg(long)]
    harvest: bool,
    /// Nest the node inside the harvest
    #[arg(long)]
    harvest_node: bool,
    #[arg(long)]
    traits: bool,
    #[arg(long)]
    skills: bool,
    #[arg(long)]
    flags: bool,
    /// Every branch
    #[arg(long)]
    all: bool,
}

impl KamiBranches {
    fn options(self) -> KamiOptions {
        KamiOptions {
            harvest: self.all || self.harvest || self.harvest_node,
            harvest_node: self.all || self.harvest_node,
            traits: self.all || self.traits,
            skills: self.all || self.skills,
            flags: self.all || self.flags,
        }
    }
}

#[derive(clap::Args, Debug, Clone, Copy)]
struct AccountBranches {
    /// Owned kamis, with traits and harvests
    #[arg(long)]
    kamis: bool,
    #[arg(long)]
    friends: bool,
    #[arg(long)]
    inventory: bool,
    #[arg(long)]
    stats: bool,
    #[arg(long)]
    flags: bool,
    /// Every branch
    #[arg(long)]
    all: bool,
}

impl AccountBranches {
    fn options(self) -> AccountOptions {
        AccountOptions {
            kamis: self.all || self.kamis,
            kami: KamiOptions {
                harvest: true,
                traits: true,
                ..Default::default()
            },
            friends: self.all || self.friends,
            inventory: self.all || self.inventory,
            stats: self.all || self.stats,
            flags: self.all || self.flags,
        }
    }
}

/// One evaluated requirement.
#[derive(Debug, Serialize)]
struct RequirementReport<'a> {
    condition: &'a Condition,
    status: ConditionStatus,
}

#[derive(Debug, Serialize)]
struct RequirementsReport<'a> {
    passed: bool,
    requirements: Vec<RequirementReport<'a>>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn wall_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn load_world(path: Option<&Path>) -> anyhow::Result<World> {
    let Some(path) = path else {
        tracing::debug!("no snapshot given -- using the demo world");
        return Ok(demo_world());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let snapshot: WorldSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a world snapshot", path.display()))?;
    let world = World::from_snapshot(&snapshot)
        .with_context(|| format!("failed to restore {}", path.display()))?;
    tracing::info!(path = %path.display(), entities = world.len(), "world loaded");
    Ok(world)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn evaluate<'a>(
    frame: &Frame<'_, '_>,
    holder: Holder<'_>,
    conditions: &'a [Condition],
) -> RequirementsReport<'a> {
    let requirements: Vec<_> = conditions
        .iter()
        .map(|condition| RequirementReport {
            condition,
            status: check(frame, holder, condition),
        })
        .collect();
    RequirementsReport {
        passed: requirements.iter().all(|r| r.status.completable),
        requirements,
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn write_seed(out: Option<&Path>) -> anyhow::Result<()> {
    let snapshot = demo_world().capture_snapshot();
    let json = serde_json::to_string_pretty(&snapshot)?;
    match out {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "wrote {} entities to {}",
                snapshot.entities.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run(command: Commands, frame: &Frame<'_, '_>) -> anyhow::Result<()> {
    match command {
        Commands::Seed { .. } => bail!("seed does not read a world"),

        Commands::Account {
            index,
            owner,
            name,
            branches,
        } => {
            let options = branches.options();
            let account = match (index, owner, name) {
                (Some(index), _, _) => get_account_by_index(frame, index, &options),
                (_, Some(owner), _) => {
                    let owner: EntityId = owner
                        .parse()
                        .with_context(|| format!("invalid owner address '{owner}'"))?;
                    get_account_by_owner(frame, owner.as_u256(), &options)
                }
                (_, _, Some(name)) => get_account_by_name(frame, &name, &options),
                _ => bail!("an index, --owner or --name is required"),
            };
            let Some(account) = account else {
                bail!("no such account");
            };
            print_json(&account)
        }

        Commands::Kami { index, branches } => {
            let Some(kami) = get_kami_by_index(frame, index, &branches.options()) else {
                bail!("no kami with index {index}");
            };
            print_json(&kami)
        }

        Commands::Node {
            index,
            all,
            account,
        } => {
            let scav_holder = match account {
                Some(account) => match frame.account_by_index(account) {
                    Some(row) => Some(frame.entity_id(row)),
                    None => bail!("no account with index {account}"),
                },
                None => None,
            };
            let options = NodeOptions {
                kamis: all,
                drops: all,
                requirements: all,
                scav: all,
                scav_holder,
            };
            let Some(node) = get_node_by_index(frame, index, &options) else {
                bail!("no node with index {index}");
            };
            print_json(&node)
        }

        Commands::Liquidation { attacker, defender } => {
            let Some(attacker_row) = frame.kami_by_index(attacker) else {
                bail!("no kami with index {attacker}");
            };
            let Some(defender_row) = frame.kami_by_index(defender) else {
                bail!("no kami with index {defender}");
            };
            print_json(&analyze_liquidation(frame, attacker_row, defender_row))
        }

        Commands::Requirements { target } => match target {
            RequirementTarget::Node { node, kami } => {
                let Some(kami) = get_kami_by_index(frame, kami, &KamiOptions::default()) else {
                    bail!("no kami with index {kami}");
                };
                let conditions = node_requirement_anchor(frame, node)
                    .map(|anchor| frame.conditions_for(anchor))
                    .unwrap_or_default();
                print_json(&evaluate(frame, Holder::Kami(&kami), &conditions))
            }
            RequirementTarget::Listing { npc, item, account } => {
                let Some(listing) = get_listing_by(frame, npc, item) else {
                    bail!("merchant {npc} does not list item {item}");
                };
                let Some(account) =
                    get_account_by_index(frame, account, &AccountOptions::default())
                else {
                    bail!("no account with index {account}");
                };
                print_json(&evaluate(
                    frame,
                    Holder::Account(&account),
                    &listing.requirements,
                ))
            }
        },
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Seed { out } = &cli.command {
        return write_seed(out.as_deref());
    }

    let world = load_world(cli.world.as_deref())?;
    let now = cli.now.unwrap_or_else(|| {
        if cli.world.is_some() {
            wall_clock()
        } else {
            DEMO_NOW
        }
    });
    let session = Session::new(&world);
    let frame = session.frame(now);
    tracing::debug!(now, "assembling");

    run(cli.command, &frame)?;

    if cli.diagnostics {
        eprintln!("{}", serde_json::to_string_pretty(&session.diagnostics())?);
    }
    Ok(())
}
