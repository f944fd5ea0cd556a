//! Loosely typed field values.
//!
//! The store does not know the schema of its fields: a value may be a small
//! integer, a float, a 256-bit word rendered as hex text, a display string or
//! an array of any of these. [`Value`] keeps the raw shape and offers
//! defensive coercions that never panic. A coercion that cannot make sense of
//! the value returns `None`; callers decide the default.

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A single field value as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Array(Vec<Value>),
}

/// Bit 255 of a 256-bit word; set when the word encodes a negative number.
fn sign_bit_set(word: &U256) -> bool {
    word.bit(255)
}

/// Two's-complement negation in 256 bits.
fn negate(word: U256) -> U256 {
    (!word).overflowing_add(U256::one()).0
}

/// Parse text as a 256-bit word: `0x` hex, unsigned decimal or a negative
/// decimal (mapped to its two's-complement form).
fn parse_word(text: &str) -> Option<U256> {
    let t = text.trim();
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        return U256::from_str_radix(hex, 16).ok();
    }
    if let Some(magnitude) = t.strip_prefix('-') {
        let m = U256::from_dec_str(magnitude).ok()?;
        return Some(negate(m));
    }
    if t.is_empty() {
        return None;
    }
    U256::from_dec_str(t).ok()
}

impl Value {
    /// Interpret the value as an unsigned 256-bit word.
    ///
    /// Negative integers come back in two's-complement form so that packed
    /// words written as signed decimals survive the trip.
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Value::Bool(b) => Some(U256::from(u8::from(*b))),
            Value::Int(i) if *i >= 0 => Some(U256::from(*i as u64)),
            Value::Int(i) => Some(negate(U256::from(i.unsigned_abs()))),
            Value::Float(f) if f.is_finite() && *f >= 0.0 => Some(U256::from(f.floor() as u128)),
            Value::Float(_) => None,
            Value::Text(s) => parse_word(s),
            Value::Array(_) => None,
        }
    }

    /// Interpret the value as a `u64`, saturating words wider than 64 bits.
    /// Negative numbers are rejected.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Float(f) if f.is_finite() && *f >= 0.0 => Some(f.floor() as u64),
            Value::Float(_) => None,
            Value::Text(s) if s.trim_start().starts_with('-') => None,
            other => other.as_u256().map(|w| {
                if w.bits() > 64 {
                    u64::MAX
                } else {
                    w.low_u64()
                }
            }),
        }
    }

    /// Interpret the value as a signed `i64`.
    ///
    /// 256-bit words with the sign bit set are read as two's-complement
    /// negatives. Magnitudes outside the `i64` range saturate.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::Float(_) => None,
            Value::Text(s) => {
                let word = parse_word(s)?;
                if sign_bit_set(&word) {
                    let magnitude = negate(word);
                    if magnitude.bits() > 63 {
                        Some(i64::MIN)
                    } else {
                        Some(-(magnitude.low_u64() as i64))
                    }
                } else if word.bits() > 63 {
                    Some(i64::MAX)
                } else {
                    Some(word.low_u64() as i64)
                }
            }
            Value::Array(_) => None,
        }
    }

    /// Interpret the value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .or_else(|| self.as_i64().map(|i| i as f64)),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Borrow the value as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a boolean. Numbers are truthy when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Float(f) => Some(*f != 0.0),
            Value::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                other => parse_word(other).map(|w| !w.is_zero()),
            },
            Value::Array(_) => None,
        }
    }

    /// Borrow the value as an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Interpret the value as a content ID.
    pub fn as_entity_id(&self) -> Option<EntityId> {
        self.as_u256().map(EntityId::from)
    }

    /// Equality used by query predicates.
    ///
    /// Numeric-like values (integers, booleans, numeric text) compare by their
    /// 256-bit word, floats compare as floats, other text compares exactly.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) if a == b => true,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_eq(y))
            }
            (Value::Array(_), _) | (_, Value::Array(_)) => false,
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                matches!((self.as_f64(), other.as_f64()), (Some(a), Some(b)) if a == b)
            }
            _ => matches!((self.as_u256(), other.as_u256()), (Some(a), Some(b)) if a == b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Text(format!("0x{v:x}")),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        if v.bits() <= 63 {
            Value::Int(v.low_u64() as i64)
        } else {
            Value::Text(format!("0x{v:x}"))
        }
    }
}

impl From<EntityId> for Value {
    fn from(v: EntityId) -> Self {
        Value::Text(v.to_hex())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
