//! Elemental affinities and matchups.
//!
//! Harvesting compares a kami's trait affinities against the node's: a match
//! helps, a mismatch hurts, and NORMAL on either side is neutral. Combat uses
//! a three-way cycle instead: EERIE beats SCRAP beats INSECT beats EERIE.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ShapeError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Affinity {
    #[default]
    Normal,
    Eerie,
    Scrap,
    Insect,
}

/// How one affinity fares against another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Matchup {
    Neutral,
    Advantage,
    Disadvantage,
}

impl Affinity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Affinity::Normal => "NORMAL",
            Affinity::Eerie => "EERIE",
            Affinity::Scrap => "SCRAP",
            Affinity::Insect => "INSECT",
        }
    }

    /// Parse, treating an empty or unknown string as NORMAL.
    pub fn parse_lenient(raw: &str) -> Affinity {
        if raw.trim().is_empty() {
            return Affinity::Normal;
        }
        raw.parse().unwrap_or_else(|err: ShapeError| {
            tracing::warn!(affinity = %raw, error = %err, "unparseable affinity -- treating as NORMAL");
            Affinity::Normal
        })
    }

    /// The affinity this one beats in combat, if any.
    pub fn beats(&self) -> Option<Affinity> {
        match self {
            Affinity::Eerie => Some(Affinity::Scrap),
            Affinity::Scrap => Some(Affinity::Insect),
            Affinity::Insect => Some(Affinity::Eerie),
            Affinity::Normal => None,
        }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Affinity {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(Affinity::Normal),
            "EERIE" => Ok(Affinity::Eerie),
            "SCRAP" => Ok(Affinity::Scrap),
            "INSECT" => Ok(Affinity::Insect),
            _ => Err(ShapeError::UnknownAffinity {
                value: s.to_owned(),
            }),
        }
    }
}

/// Matchup of a kami trait against a node when harvesting.
pub fn harvest_matchup(kami: Affinity, node: Affinity) -> Matchup {
    if kami == Affinity::Normal || node == Affinity::Normal {
        Matchup::Neutral
    } else if kami == node {
        Matchup::Advantage
    } else {
        Matchup::Disadvantage
    }
}

/// Matchup of an attacker's hand against a defender's body.
pub fn combat_matchup(attacker: Affinity, defender: Affinity) -> Matchup {
    if attacker.beats() == Some(defender) {
        Matchup::Advantage
    } else if defender.beats() == Some(attacker) {
        Matchup::Disadvantage
    } else {
        Matchup::Neutral
    }
}
