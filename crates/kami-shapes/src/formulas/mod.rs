//! Derived-state calculators.
//!
//! Pure functions of (config, bonuses, stats, elapsed time). None of them
//! reads the clock: the caller passes `now` (usually a
//! [`Frame`](crate::session::Frame)'s), and elapsed time saturates at zero.
//! Missing inputs arrive as zero and produce a neutral result.

pub mod harvest;
pub mod health;
pub mod liquidation;
pub mod progression;

pub(crate) const SECONDS_PER_HOUR: f64 = 3600.0;

/// Floor a non-negative float into `u64`; negatives and NaN become zero,
/// anything past the range (including +inf) saturates at `u64::MAX`.
pub(crate) fn floor_u64(x: f64) -> u64 {
    if x.is_nan() || x <= 0.0 {
        0
    } else {
        // `as` saturates out-of-range floats
        x.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_saturates_at_both_ends() {
        assert_eq!(floor_u64(2.9), 2);
        assert_eq!(floor_u64(-4.0), 0);
        assert_eq!(floor_u64(f64::NAN), 0);
        assert_eq!(floor_u64(f64::NEG_INFINITY), 0);
        assert_eq!(floor_u64(f64::INFINITY), u64::MAX);
        assert_eq!(floor_u64(1e30), u64::MAX);
    }
}
