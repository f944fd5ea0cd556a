//! Liquidation: when one kami may defeat a harvesting kami, and what each
//! side takes away.
//!
//! The threshold is a fraction of the defender's max health:
//!
//! ```text
//! animosity = Φ(ln(V / H) / σ) * ratio
//! threshold = (animosity * efficacy + shift) * defender.health.total
//! ```
//!
//! with `V` the attacker's violence, `H` the defender's harmony and `Φ` the
//! standard normal CDF. Efficacy comes from the attacker's hand affinity
//! against the defender's body affinity.

use kami_store::entity::EntityIndex;
use serde::{Deserialize, Serialize};

use crate::affinity::{combat_matchup, Affinity, Matchup};
use crate::codec::Precise;
use crate::config::{AnimosityConfig, Efficacy};
use crate::formulas::floor_u64;
use crate::session::Frame;
use crate::shapes::kami::{get_kami, Kami, KamiState};
use crate::shapes::options::KamiOptions;

// ---------------------------------------------------------------------------
// Normal distribution
// ---------------------------------------------------------------------------

/// Error function, Abramowitz & Stegun 7.1.26 (|error| < 1.5e-7).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal cumulative distribution.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

// ---------------------------------------------------------------------------
// Threshold terms
// ---------------------------------------------------------------------------

/// Log-normal CDF of `violence / harmony`, scaled by the animosity ratio.
pub fn animosity(
    attacker_violence: f64,
    defender_harmony: f64,
    config: &AnimosityConfig,
    ratio_bonus: i64,
) -> f64 {
    let ratio = config.ratio.plus_raw(ratio_bonus);
    if attacker_violence <= 0.0 {
        return 0.0;
    }
    if defender_harmony <= 0.0 {
        return ratio;
    }
    let z = (attacker_violence / defender_harmony).ln();
    let sigma = config.sigma.to_f64();
    let p = if sigma > 0.0 {
        normal_cdf(z / sigma)
    } else if z > 0.0 {
        1.0
    } else if z < 0.0 {
        0.0
    } else {
        0.5
    };
    p * ratio
}

/// Efficacy of the attacker's hand against the defender's body.
pub fn efficacy(attacker_hand: Affinity, defender_body: Affinity, config: &Efficacy) -> f64 {
    match combat_matchup(attacker_hand, defender_body) {
        Matchup::Advantage => config.base() + config.up(),
        Matchup::Disadvantage => config.base() - config.down(),
        Matchup::Neutral => config.base(),
    }
}

/// Health below which the defender can be liquidated. Never negative.
pub fn threshold(
    animosity: f64,
    efficacy: f64,
    shift: &Precise,
    shift_bonus: i64,
    defender_health_total: f64,
) -> u64 {
    floor_u64((animosity * efficacy + shift.plus_raw(shift_bonus)) * defender_health_total)
}

/// Whether a defender at `current_health` may be liquidated.
pub fn can_liquidate(current_health: i64, threshold: u64, defender_harvesting: bool) -> bool {
    defender_harvesting && current_health >= 0 && (current_health as u64) < threshold
}

// ---------------------------------------------------------------------------
// Payouts
// ---------------------------------------------------------------------------

fn clamped_ratio(config: &Precise, bonus: i64) -> f64 {
    config.plus_raw(bonus).clamp(0.0, 1.0)
}

/// Share of the defender's harvest returned to the defender's owner.
pub fn salvage(balance: u64, config: &Precise, defender_bonus: i64) -> u64 {
    floor_u64(balance as f64 * clamped_ratio(config, defender_bonus))
}

/// Share of what remains after salvage that goes to the attacker.
pub fn spoils(balance: u64, salvage: u64, config: &Precise, attacker_bonus: i64) -> u64 {
    let remaining = balance.saturating_sub(salvage);
    floor_u64(remaining as f64 * clamped_ratio(config, attacker_bonus))
}

/// Recoil damage to the attacker.
pub fn karma(defender_violence: f64, attacker_harmony: f64, config: &Precise) -> u64 {
    floor_u64((defender_violence - attacker_harmony).max(0.0) * config.to_f64())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationReport {
    pub attacker: String,
    pub defender: String,
    pub animosity: f64,
    pub efficacy: f64,
    pub threshold: u64,
    pub defender_health: i64,
    pub can_liquidate: bool,
    pub bounty: u64,
    pub salvage: u64,
    pub spoils: u64,
    pub karma: u64,
}

/// Liquidation math between two assembled kamis.
///
/// Missing traits count as NORMAL and a missing harvest as an empty,
/// non-harvesting one. Config is read from the defender.
pub fn liquidation_between(attacker: &Kami, defender: &Kami) -> LiquidationReport {
    let config = &defender.config;
    let hand = attacker
        .traits
        .as_ref()
        .map_or(Affinity::Normal, |t| t.hand_affinity());
    let body = defender
        .traits
        .as_ref()
        .map_or(Affinity::Normal, |t| t.body_affinity());

    let animosity = animosity(
        attacker.stats.violence.total,
        defender.stats.harmony.total,
        &config.animosity,
        attacker.bonuses.atk_threshold_ratio,
    );
    let efficacy = efficacy(hand, body, &config.liquidation_efficacy);
    let threshold = threshold(
        animosity,
        efficacy,
        &config.threshold_shift,
        attacker
            .bonuses
            .atk_threshold_shift
            .saturating_sub(defender.bonuses.def_threshold_shift),
        defender.stats.health.total,
    );
    let harvesting =
        defender.state == KamiState::Harvesting && defender.harvest.is_some();
    let bounty = defender.harvest.as_ref().map_or(0, |h| h.current_balance);
    let salvage = salvage(bounty, &config.salvage, defender.bonuses.def_salvage_ratio);
    let spoils = spoils(bounty, salvage, &config.spoils, attacker.bonuses.atk_spoils_ratio);
    let karma = karma(
        defender.stats.violence.total,
        attacker.stats.harmony.total,
        &config.karma,
    );

    LiquidationReport {
        attacker: attacker.name.clone(),
        defender: defender.name.clone(),
        animosity,
        efficacy,
        threshold,
        defender_health: defender.current_health,
        can_liquidate: can_liquidate(defender.current_health, threshold, harvesting),
        bounty,
        salvage,
        spoils,
        karma,
    }
}

/// Assemble both kamis with the branches liquidation reads, then compare.
pub fn analyze_liquidation(
    frame: &Frame<'_, '_>,
    attacker: EntityIndex,
    defender: EntityIndex,
) -> LiquidationReport {
    let options = KamiOptions {
        harvest: true,
        traits: true,
        ..Default::default()
    };
    let attacker = get_kami(frame, attacker, &options);
    let defender = get_kami(frame, defender, &options);
    liquidation_between(&attacker, &defender)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
