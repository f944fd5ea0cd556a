//! Packed-field codec.
//!
//! Two packed layouts live in single 256-bit words:
//!
//! - a [`Stat`]: four signed 64-bit lanes, most significant first:
//!   `base | shift | boost | sync`.
//! - a config array: eight signed 32-bit lanes, lane 0 least significant.
//!
//! Both are read-only here. Lanes are two's complement so shifts and boosts
//! may be negative (debuffs).

use kami_store::value::Value;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

const MASK64: u64 = u64::MAX;
const MASK32: u64 = u32::MAX as u64;

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// A decoded stat with its derived total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub base: i64,
    pub shift: i64,
    /// Per-mille multiplier: `1000` doubles the total.
    pub boost: i64,
    /// Last synced current value, bounded to `[0, total]`.
    pub sync: i64,
    pub total: f64,
}

/// The four raw lanes of a stat word: `[base, shift, boost, sync]`.
pub fn decode_lanes(word: U256) -> [i64; 4] {
    let mut lanes = [0i64; 4];
    for (i, lane) in lanes.iter_mut().enumerate() {
        let raw = (word >> (64 * (3 - i))).low_u64() & MASK64;
        *lane = raw as i64;
    }
    lanes
}

/// `(1 + boost/1000) * (base + shift)`.
pub fn stat_total(base: i64, shift: i64, boost: i64) -> f64 {
    (1.0 + boost as f64 / 1000.0) * (base as f64 + shift as f64)
}

impl Stat {
    /// Decode a packed word. The all-zero word is the all-zero stat.
    pub fn decode(word: U256) -> Stat {
        let [base, shift, boost, sync] = decode_lanes(word);
        Stat::new(base, shift, boost, sync)
    }

    /// Build from lanes, recomputing the total and bounding `sync`.
    pub fn new(base: i64, shift: i64, boost: i64, sync: i64) -> Stat {
        let total = stat_total(base, shift, boost);
        let ceiling = if total.is_finite() && total > 0.0 {
            total.floor() as i64
        } else {
            0
        };
        Stat {
            base,
            shift,
            boost,
            sync: sync.clamp(0, ceiling),
            total,
        }
    }

    /// Decode a store value; anything missing or non-numeric is zero.
    pub fn from_value(value: Option<&Value>) -> Stat {
        value
            .and_then(Value::as_u256)
            .map(Stat::decode)
            .unwrap_or_default()
    }

    /// The total rounded down, as used for hit points and stamina caps.
    pub fn total_floor(&self) -> i64 {
        if self.total.is_finite() {
            self.total.floor() as i64
        } else {
            0
        }
    }
}

// ---------------------------------------------------------------------------
// Config arrays
// ---------------------------------------------------------------------------

/// The eight signed 32-bit lanes of a config word, lane 0 least significant.
pub fn unpack_config_array(word: U256) -> [i32; 8] {
    let mut lanes = [0i32; 8];
    for (i, lane) in lanes.iter_mut().enumerate() {
        let raw = (word >> (32 * i)).low_u64() & MASK32;
        *lane = raw as u32 as i32;
    }
    lanes
}

/// A fixed-point number: `value / 10^precision`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precise {
    pub value: i64,
    pub precision: u32,
}

impl Precise {
    pub fn new(value: i64, precision: u32) -> Self {
        Self { value, precision }
    }

    /// Build from a `(precision, value)` lane pair. Negative precision is 0.
    pub fn from_lanes(precision: i32, value: i32) -> Self {
        Self {
            value: i64::from(value),
            precision: precision.max(0) as u32,
        }
    }

    /// `10^precision` as a float.
    pub fn scale(&self) -> f64 {
        10f64.powi(self.precision as i32)
    }

    pub fn to_f64(&self) -> f64 {
        self.value as f64 / self.scale()
    }

    /// This value plus a raw addend expressed in the same precision. The sum
    /// is taken in floating point so extreme addends cannot overflow.
    pub fn plus_raw(&self, addend: i64) -> f64 {
        (self.value as f64 + addend as f64) / self.scale()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(base: i64, shift: i64, boost: i64, sync: i64) -> U256 {
        [base, shift, boost, sync]
            .iter()
            .fold(U256::zero(), |acc, lane| (acc << 64usize) | U256::from(*lane as u64))
    }

    #[test]
    fn zero_word_is_zero_stat() {
        let s = Stat::decode(U256::zero());
        assert_eq!(s, Stat::default());
        assert_eq!(s.total, 0.0);
    }

    #[test]
    fn boundary_lanes_decode_signed() {
        let word = pack(i64::MAX, -1, 0, 0);
        assert_eq!(decode_lanes(word), [i64::MAX, -1, 0, 0]);
        let word = pack(0, 0, -1, 7);
        assert_eq!(decode_lanes(word), [0, 0, -1, 7]);
    }

    #[test]
    fn total_follows_boost() {
        let plain = Stat::decode(pack(100, 20, 0, 50));
        assert_eq!(plain.total, 120.0);
        assert_eq!(plain.sync, 50);

        let wiped = Stat::decode(pack(100, 20, -1000, 50));
        assert_eq!(wiped.total, 0.0);
        assert_eq!(wiped.sync, 0);

        let boosted = Stat::decode(pack(100, 0, 500, 0));
        assert_eq!(boosted.total, 150.0);
    }

    #[test]
    fn sync_is_bounded_by_total() {
        let s = Stat::new(10, 0, 0, 99);
        assert_eq!(s.sync, 10);
        let s = Stat::new(10, 0, 0, -3);
        assert_eq!(s.sync, 0);
    }

    #[test]
    fn config_lanes_are_little_end_first() {
        let word = (U256::from(0xffff_fffeu64) << 32usize) | U256::from(3u64);
        let lanes = unpack_config_array(word);
        assert_eq!(lanes[0], 3);
        assert_eq!(lanes[1], -2);
        assert!(lanes[2..].iter().all(|l| *l == 0));
    }

    #[test]
    fn precise_scales() {
        let p = Precise::from_lanes(3, 1500);
        assert_eq!(p.to_f64(), 1.5);
        assert_eq!(p.plus_raw(500), 2.0);
        assert_eq!(Precise::from_lanes(-2, 7).to_f64(), 7.0);
    }

    #[test]
    fn plus_raw_survives_extreme_addends() {
        let p = Precise::new(1000, 3);
        assert!(p.plus_raw(i64::MAX) > 9.0e15);
        assert!(p.plus_raw(i64::MIN) < -9.0e15);
        assert_eq!(Precise::new(i64::MAX, 0).plus_raw(i64::MAX), 2.0 * i64::MAX as f64);
    }

    #[test]
    fn missing_value_is_zero_stat() {
        assert_eq!(Stat::from_value(None), Stat::default());
        assert_eq!(Stat::from_value(Some(&Value::from("junk"))), Stat::default());
    }
}
