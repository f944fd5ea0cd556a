//! Harvest yield.
//!
//! Output per second is `fertility + intensity(τ)`, where fertility is
//! constant for a kami on a node and intensity grows linearly with `τ`, the
//! seconds since the harvest was last reset. Bounty over an interval is the
//! exact integral of that rate.

use serde::{Deserialize, Serialize};

use crate::affinity::{harvest_matchup, Affinity, Matchup};
use crate::bonus::KamiBonuses;
use crate::config::{Efficacy, KamiConfig, RatioBoost};
use crate::formulas::{floor_u64, SECONDS_PER_HOUR};

/// Efficacy shift from trait affinities against the node, summed over traits.
pub fn affinity_shift(traits: &[Affinity], node: Affinity, efficacy: &Efficacy) -> f64 {
    traits
        .iter()
        .map(|t| match harvest_matchup(*t, node) {
            Matchup::Advantage => efficacy.up(),
            Matchup::Disadvantage => -efficacy.down(),
            Matchup::Neutral => 0.0,
        })
        .sum()
}

/// Constant yield per second: `power * ratio * (boost + bonus + shift) / 3600`.
pub fn fertility_rate(power_total: f64, config: &RatioBoost, bonus: i64, shift: f64) -> f64 {
    power_total * config.ratio.to_f64() * (config.boost.plus_raw(bonus) + shift) / SECONDS_PER_HOUR
}

/// Growth coefficient `k` of the intensity term: yield per second per second
/// of harvest age.
pub fn intensity_coefficient(violence_total: f64, config: &RatioBoost, bonus: i64) -> f64 {
    violence_total * config.ratio.to_f64() * config.boost.plus_raw(bonus)
        / (60.0 * SECONDS_PER_HOUR)
}

/// The inputs a harvest needs from its kami and node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestInputs {
    pub power_total: f64,
    pub violence_total: f64,
    /// Body and hand trait affinities; empty when unknown.
    pub affinities: Vec<Affinity>,
    pub node_affinity: Affinity,
    pub config: KamiConfig,
    pub bonuses: KamiBonuses,
}

/// The resolved yield model of one harvest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestModel {
    /// Constant yield per second.
    pub fertility: f64,
    /// Intensity growth per second of harvest age.
    pub intensity_k: f64,
}

impl HarvestModel {
    pub fn new(inputs: &HarvestInputs) -> Self {
        let config = &inputs.config;
        let shift = affinity_shift(
            &inputs.affinities,
            inputs.node_affinity,
            &config.harvest_efficacy,
        );
        Self {
            fertility: fertility_rate(
                inputs.power_total,
                &config.fertility,
                inputs.bonuses.harv_fertility_boost,
                shift,
            ),
            intensity_k: intensity_coefficient(
                inputs.violence_total,
                &config.intensity,
                inputs.bonuses.harv_intensity_boost,
            ),
        }
    }

    /// Intensity per second at harvest age `tau`.
    pub fn intensity_at(&self, tau: u64) -> f64 {
        self.intensity_k * tau as f64
    }

    /// Total yield per second at harvest age `tau`.
    pub fn rate_at(&self, tau: u64) -> f64 {
        self.fertility + self.intensity_at(tau)
    }

    /// Yield accrued over `[last, now]` for a harvest reset at `reset`,
    /// floored. Zero if `now <= last`.
    pub fn bounty(&self, reset: u64, last: u64, now: u64) -> u64 {
        if now <= last {
            return 0;
        }
        let dt = (now - last) as f64;
        let tau_last = last.saturating_sub(reset) as f64;
        let tau_now = now.saturating_sub(reset) as f64;
        let fertile = self.fertility * dt;
        let intense = self.intensity_k * (tau_now * tau_now - tau_last * tau_last) / 2.0;
        floor_u64(fertile + intense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Precise;

    fn efficacy() -> Efficacy {
        Efficacy {
            precision: 3,
            base: 1000,
            up: 500,
            down: 250,
        }
    }

    #[test]
    fn affinity_shift_sums_traits() {
        let e = efficacy();
        let both_match = affinity_shift(&[Affinity::Eerie, Affinity::Eerie], Affinity::Eerie, &e);
        assert_eq!(both_match, 1.0);
        let mixed = affinity_shift(&[Affinity::Eerie, Affinity::Scrap], Affinity::Eerie, &e);
        assert_eq!(mixed, 0.25);
        let normal_node = affinity_shift(&[Affinity::Eerie, Affinity::Scrap], Affinity::Normal, &e);
        assert_eq!(normal_node, 0.0);
        assert_eq!(affinity_shift(&[], Affinity::Insect, &e), 0.0);
    }

    #[test]
    fn fertility_scales_with_power() {
        let config = RatioBoost {
            ratio: Precise::new(1, 0),
            boost: Precise::new(1000, 3),
        };
        assert_eq!(fertility_rate(3600.0, &config, 0, 0.0), 1.0);
        assert_eq!(fertility_rate(3600.0, &config, 0, 0.5), 1.5);
        assert_eq!(fertility_rate(7200.0, &config, 0, 0.0), 2.0);
    }

    #[test]
    fn bounty_integrates_intensity_exactly() {
        let model = HarvestModel {
            fertility: 1.0,
            intensity_k: 0.5,
        };
        // τ from 0 to 10: 10 * 1 + 0.5 * 100 / 2 = 35
        assert_eq!(model.bounty(0, 0, 10), 35);
        // split intervals sum to the whole (up to flooring)
        assert_eq!(model.bounty(0, 0, 4) + model.bounty(0, 4, 10), 35);
        assert_eq!(model.rate_at(10), 6.0);
        assert_eq!(model.bounty(0, 10, 10), 0);
        assert_eq!(model.bounty(0, 10, 5), 0);
    }

    #[test]
    fn missing_inputs_yield_nothing() {
        let model = HarvestModel::new(&HarvestInputs::default());
        assert_eq!(model, HarvestModel::default());
        assert_eq!(model.bounty(0, 0, 1_000), 0);
    }
}
