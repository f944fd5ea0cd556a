//! Entity identifiers.
//!
//! Two notions of identity exist and must not be conflated:
//!
//! - [`EntityId`] is the stable content ID: a 256-bit value derived by hashing
//!   or assigned by the authoritative side. It is what callers reason about and
//!   what cross-references between entities hold.
//! - [`EntityIndex`] is a transient row handle, valid only within one store
//!   instance. It gives O(1) field access and is never persisted.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::StoreError;

// ---------------------------------------------------------------------------
// EntityIndex
// ---------------------------------------------------------------------------

/// A row handle into one store instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityIndex(pub u32);

impl EntityIndex {
    /// Placeholder handle carried by null-object shapes. Never allocated.
    pub const NONE: EntityIndex = EntityIndex(u32::MAX);

    /// Whether this is the placeholder handle.
    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// The raw row number.
    #[inline]
    pub fn row(self) -> usize {
        self.0 as usize
    }
}

impl Default for EntityIndex {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Debug for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityIndex({})", self.0)
    }
}

impl fmt::Display for EntityIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A stable 256-bit content ID.
///
/// Rendered as a fixed-width, `0x`-prefixed, 64-digit lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId(U256);

impl EntityId {
    /// The all-zero ID. Never a valid entity; used as the null-object identity.
    pub const ZERO: EntityId = EntityId(U256([0; 4]));

    /// Wrap a raw 256-bit value.
    #[inline]
    pub fn new(raw: U256) -> Self {
        Self(raw)
    }

    /// The raw 256-bit value.
    #[inline]
    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// Whether this is the zero ID.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Big-endian bytes, as used by packed hashing.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    /// Build from big-endian bytes (e.g. a keccak digest).
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        Self(U256::from_big_endian(bytes))
    }

    /// Fixed-width hex rendering.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(66);
        out.push_str("0x");
        for byte in self.to_be_bytes() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl From<U256> for EntityId {
    fn from(raw: U256) -> Self {
        Self(raw)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(U256::from(raw))
    }
}

impl FromStr for EntityId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() => U256::from_str_radix(hex, 16).ok(),
            Some(_) => None,
            None => U256::from_dec_str(trimmed).ok(),
        };
        parsed
            .map(Self)
            .ok_or_else(|| StoreError::InvalidId(s.to_owned()))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.to_hex())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_rendering_is_fixed_width() {
        let id = EntityId::from(255u64);
        let hex = id.to_hex();
        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("0x"));
        assert!(hex.ends_with("ff"));
        assert_eq!(id.to_string(), hex);
    }

    #[test]
    fn parse_accepts_hex_and_decimal() {
        let from_hex: EntityId = "0x2a".parse().unwrap();
        let from_dec: EntityId = "42".parse().unwrap();
        assert_eq!(from_hex, from_dec);
        assert_eq!(from_hex, EntityId::from(42u64));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("0x".parse::<EntityId>().is_err());
        assert!("kami".parse::<EntityId>().is_err());
        assert!("".parse::<EntityId>().is_err());
    }

    #[test]
    fn bytes_roundtrip() {
        let id = EntityId::from(0xdead_beef_u64);
        let bytes = id.to_be_bytes();
        assert_eq!(bytes[28..], [0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(EntityId::from_be_bytes(&bytes), id);
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = EntityId::from(1u64);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn default_row_handle_is_placeholder() {
        assert!(EntityIndex::default().is_none());
        assert!(!EntityIndex(0).is_none());
    }

    #[test]
    fn zero_is_zero() {
        assert!(EntityId::ZERO.is_zero());
        assert!(!EntityId::from(1u64).is_zero());
        assert_eq!(EntityId::default(), EntityId::ZERO);
    }
}
