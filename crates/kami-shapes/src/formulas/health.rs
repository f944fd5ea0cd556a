//! Health over time: regeneration while resting, strain while harvesting.

use crate::codec::Stat;
use crate::config::{RatioBoost, StrainConfig};
use crate::formulas::SECONDS_PER_HOUR;

/// Resting regeneration in health per second:
/// `harmony * ratio * (boost + bonus) / 3600`.
pub fn metabolism_rate(harmony_total: f64, config: &RatioBoost, bonus: i64) -> f64 {
    harmony_total * config.ratio.to_f64() * config.boost.plus_raw(bonus) / SECONDS_PER_HOUR
}

/// Health after resting `elapsed` seconds from the synced value.
pub fn resting_health(health: &Stat, rate: f64, elapsed: u64) -> i64 {
    let ceiling = health.total.max(0.0);
    let raw = health.sync as f64 + rate * elapsed as f64;
    let bounded = raw.clamp(0.0, ceiling);
    if bounded.is_finite() {
        bounded.floor() as i64
    } else {
        0
    }
}

/// Strain caused by producing `amount`, unrounded:
/// `amount * ratio * (boost + bonus) / (harmony + nudge)`.
pub fn strain(amount: f64, harmony_total: f64, config: &StrainConfig, bonus: i64) -> f64 {
    let denominator = harmony_total + config.nudge.to_f64();
    if denominator <= 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    amount * config.ratio.to_f64() * config.boost.plus_raw(bonus) / denominator
}

/// One-shot strain deduction, rounded up.
pub fn calc_strain(amount: u64, harmony_total: f64, config: &StrainConfig, bonus: i64) -> u64 {
    let s = strain(amount as f64, harmony_total, config, bonus);
    if s.is_finite() && s > 0.0 {
        s.ceil() as u64
    } else {
        0
    }
}

/// Continuous drain in health per second while producing at `harvest_rate`.
/// Negative (or zero); never rounded.
pub fn drain_rate(harvest_rate: f64, harmony_total: f64, config: &StrainConfig, bonus: i64) -> f64 {
    -strain(harvest_rate, harmony_total, config, bonus)
}

/// Health of a harvesting kami after losing `strain` from its synced value.
pub fn harvesting_health(health: &Stat, strain: u64) -> i64 {
    let strain = i64::try_from(strain).unwrap_or(i64::MAX);
    health
        .sync
        .saturating_sub(strain)
        .clamp(0, health.total_floor().max(0))
}
