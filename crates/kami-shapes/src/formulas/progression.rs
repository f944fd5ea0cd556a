//! Cooldowns, levels, stamina and merchant prices.

use crate::codec::{Precise, Stat};
use crate::formulas::floor_u64;

/// Seconds until a kami may act again.
pub fn cooldown_remaining(last_action: u64, cooldown: u64, shift: i64, now: u64) -> u64 {
    let ready_at = i128::from(last_action) + i128::from(cooldown) + i128::from(shift);
    let remaining = ready_at - i128::from(now);
    u64::try_from(remaining.max(0)).unwrap_or(u64::MAX)
}

/// Experience needed to go from `level` to `level + 1`:
/// `floor(base * mult^(level - 1))`.
pub fn level_cost(base: u64, mult: &Precise, level: u32) -> u64 {
    let exponent = level.saturating_sub(1);
    let factor = mult.to_f64().powi(exponent.min(i32::MAX as u32) as i32);
    floor_u64(base as f64 * factor)
}

pub fn can_level(experience: u64, cost: u64) -> bool {
    experience >= cost
}

/// Stamina recovered since `last`: one point per `period` seconds, capped at
/// the stat's total. A zero period means no recovery.
pub fn current_stamina(stamina: &Stat, period: u64, last: u64, now: u64) -> i64 {
    let ceiling = stamina.total_floor().max(0);
    if period == 0 {
        return stamina.sync.min(ceiling);
    }
    let recovered = i64::try_from(now.saturating_sub(last) / period).unwrap_or(i64::MAX);
    stamina.sync.saturating_add(recovered).min(ceiling)
}

/// What a merchant pays for an item it sells at `buy`, with `scale` in
/// per-mille. `None` when the merchant does not buy.
pub fn sell_price(buy: u64, scale: u64) -> Option<u64> {
    if scale == 0 {
        return None;
    }
    let price = u128::from(buy) * u128::from(scale) / 1000;
    Some(u64::try_from(price).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_counts_down_to_zero() {
        assert_eq!(cooldown_remaining(100, 180, 0, 100), 180);
        assert_eq!(cooldown_remaining(100, 180, -30, 200), 50);
        assert_eq!(cooldown_remaining(100, 180, 0, 1_000), 0);
    }

    #[test]
    fn level_cost_compounds() {
        let mult = Precise::new(1500, 3);
        assert_eq!(level_cost(40, &mult, 1), 40);
        assert_eq!(level_cost(40, &mult, 2), 60);
        assert_eq!(level_cost(40, &mult, 3), 90);
        assert_eq!(level_cost(40, &mult, 0), 40);
        assert!(can_level(60, 60));
        assert!(!can_level(59, 60));
    }

    #[test]
    fn level_cost_saturates_at_huge_levels() {
        let mult = Precise::new(1500, 3);
        assert_eq!(level_cost(40, &mult, u32::MAX), u64::MAX);
        assert!(!can_level(u64::MAX - 1, level_cost(40, &mult, 5_000)));
    }

    #[test]
    fn stamina_recovers_per_period() {
        let stamina = Stat::new(20, 0, 0, 5);
        assert_eq!(current_stamina(&stamina, 60, 0, 59), 5);
        assert_eq!(current_stamina(&stamina, 60, 0, 600), 15);
        assert_eq!(current_stamina(&stamina, 60, 0, 60_000), 20);
        assert_eq!(current_stamina(&stamina, 0, 0, 60_000), 5);
    }

    #[test]
    fn sell_price_scales_buy_price() {
        assert_eq!(sell_price(100, 500), Some(50));
        assert_eq!(sell_price(99, 333), Some(32));
        assert_eq!(sell_price(100, 0), None);
    }
}
