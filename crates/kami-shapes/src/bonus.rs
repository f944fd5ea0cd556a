//! Bonuses: signed modifiers attached to a holder.
//!
//! A bonus entity carries `HolderID`, `Type` and a signed `Value`. The bonus
//! of a type is the sum over all of the holder's bonus entities of that type,
//! expressed in the precision of the config term it modifies.

use std::fmt;
use std::str::FromStr;

use kami_store::entity::EntityId;
use serde::{Deserialize, Serialize};

use crate::components::{TYPE, VALUE};
use crate::session::Session;
use crate::ShapeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BonusType {
    RestMetabolismBoost,
    HarvFertilityBoost,
    HarvIntensityBoost,
    HarvStrainBoost,
    AtkThresholdRatio,
    AtkThresholdShift,
    DefThresholdShift,
    DefSalvageRatio,
    AtkSpoilsRatio,
    StndCooldownShift,
}

impl BonusType {
    pub const ALL: [BonusType; 10] = [
        BonusType::RestMetabolismBoost,
        BonusType::HarvFertilityBoost,
        BonusType::HarvIntensityBoost,
        BonusType::HarvStrainBoost,
        BonusType::AtkThresholdRatio,
        BonusType::AtkThresholdShift,
        BonusType::DefThresholdShift,
        BonusType::DefSalvageRatio,
        BonusType::AtkSpoilsRatio,
        BonusType::StndCooldownShift,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BonusType::RestMetabolismBoost => "REST_METABOLISM_BOOST",
            BonusType::HarvFertilityBoost => "HARV_FERTILITY_BOOST",
            BonusType::HarvIntensityBoost => "HARV_INTENSITY_BOOST",
            BonusType::HarvStrainBoost => "HARV_STRAIN_BOOST",
            BonusType::AtkThresholdRatio => "ATK_THRESHOLD_RATIO",
            BonusType::AtkThresholdShift => "ATK_THRESHOLD_SHIFT",
            BonusType::DefThresholdShift => "DEF_THRESHOLD_SHIFT",
            BonusType::DefSalvageRatio => "DEF_SALVAGE_RATIO",
            BonusType::AtkSpoilsRatio => "ATK_SPOILS_RATIO",
            BonusType::StndCooldownShift => "STND_COOLDOWN_SHIFT",
        }
    }
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BonusType {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BonusType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ShapeError::UnknownBonus {
                value: s.to_owned(),
            })
    }
}

/// Summed bonuses of one kami, raw (unscaled) values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamiBonuses {
    pub rest_metabolism_boost: i64,
    pub harv_fertility_boost: i64,
    pub harv_intensity_boost: i64,
    pub harv_strain_boost: i64,
    pub atk_threshold_ratio: i64,
    pub atk_threshold_shift: i64,
    pub def_threshold_shift: i64,
    pub def_salvage_ratio: i64,
    pub atk_spoils_ratio: i64,
    pub stnd_cooldown_shift: i64,
}

impl KamiBonuses {
    pub fn get(&self, kind: BonusType) -> i64 {
        match kind {
            BonusType::RestMetabolismBoost => self.rest_metabolism_boost,
            BonusType::HarvFertilityBoost => self.harv_fertility_boost,
            BonusType::HarvIntensityBoost => self.harv_intensity_boost,
            BonusType::HarvStrainBoost => self.harv_strain_boost,
            BonusType::AtkThresholdRatio => self.atk_threshold_ratio,
            BonusType::AtkThresholdShift => self.atk_threshold_shift,
            BonusType::DefThresholdShift => self.def_threshold_shift,
            BonusType::DefSalvageRatio => self.def_salvage_ratio,
            BonusType::AtkSpoilsRatio => self.atk_spoils_ratio,
            BonusType::StndCooldownShift => self.stnd_cooldown_shift,
        }
    }

    fn slot(&mut self, kind: BonusType) -> &mut i64 {
        match kind {
            BonusType::RestMetabolismBoost => &mut self.rest_metabolism_boost,
            BonusType::HarvFertilityBoost => &mut self.harv_fertility_boost,
            BonusType::HarvIntensityBoost => &mut self.harv_intensity_boost,
            BonusType::HarvStrainBoost => &mut self.harv_strain_boost,
            BonusType::AtkThresholdRatio => &mut self.atk_threshold_ratio,
            BonusType::AtkThresholdShift => &mut self.atk_threshold_shift,
            BonusType::DefThresholdShift => &mut self.def_threshold_shift,
            BonusType::DefSalvageRatio => &mut self.def_salvage_ratio,
            BonusType::AtkSpoilsRatio => &mut self.atk_spoils_ratio,
            BonusType::StndCooldownShift => &mut self.stnd_cooldown_shift,
        }
    }

    /// Add `value` to the running sum of `kind`.
    pub fn add(&mut self, kind: BonusType, value: i64) {
        let slot = self.slot(kind);
        *slot = slot.saturating_add(value);
    }
}

impl Session<'_> {
    /// Sum every bonus held by `holder`. Types this crate does not model are
    /// skipped.
    pub fn bonuses(&self, holder: EntityId) -> KamiBonuses {
        let mut sums = KamiBonuses::default();
        for e in self.bonuses_of(holder) {
            let raw = self.string_of(TYPE, e);
            match raw.parse::<BonusType>() {
                Ok(kind) => sums.add(kind, self.i64_of(VALUE, e)),
                Err(_) => tracing::trace!(bonus = %raw, holder = %holder, "unmodeled bonus type"),
            }
        }
        sums
    }
}
