//! Deterministic content addressing.
//!
//! Relationship and derived entities (an account's inventory slot, a kami's
//! harvest, a config value) have no foreign key pointing at them. Their
//! content ID is instead a hash of a namespace and the IDs/indices that define
//! them:
//!
//! ```text
//! id = keccak256(abi.encodePacked(namespace, arg1, arg2, ...))
//! ```
//!
//! Packed encoding matches Solidity exactly: strings are raw UTF-8, `uint256`
//! is 32 big-endian bytes, `uint32` is 4 big-endian bytes and `bool` is one
//! byte. The 32-byte digest read big-endian is the ID.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Write as _;

use kami_store::entity::{EntityId, EntityIndex};
use kami_store::Store;
use primitive_types::U256;
use sha3::{Digest, Keccak256};

// ---------------------------------------------------------------------------
// Arg
// ---------------------------------------------------------------------------

/// One typed hashing argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    Str(&'a str),
    Word(U256),
    U32(u32),
    Bool(bool),
    /// An argument whose value is not known. Resolution refuses to hash it.
    Null,
}

impl Arg<'_> {
    /// Whether this argument may take part in hashing.
    pub fn is_valid(&self) -> bool {
        match self {
            Arg::Null => false,
            Arg::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Arg::Str(s) => out.extend_from_slice(s.as_bytes()),
            Arg::Word(w) => {
                let mut buf = [0u8; 32];
                w.to_big_endian(&mut buf);
                out.extend_from_slice(&buf);
            }
            Arg::U32(n) => out.extend_from_slice(&n.to_be_bytes()),
            Arg::Bool(b) => out.push(u8::from(*b)),
            Arg::Null => {}
        }
    }

    fn key_into(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            Arg::Str(s) => write!(out, "|s:{s}"),
            Arg::Word(w) => write!(out, "|u:{w:x}"),
            Arg::U32(n) => write!(out, "|w:{n}"),
            Arg::Bool(b) => write!(out, "|b:{}", u8::from(*b)),
            Arg::Null => write!(out, "|null"),
        };
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Str(s)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(s: &'a String) -> Self {
        Arg::Str(s)
    }
}

impl From<U256> for Arg<'_> {
    fn from(w: U256) -> Self {
        Arg::Word(w)
    }
}

impl From<EntityId> for Arg<'_> {
    fn from(id: EntityId) -> Self {
        Arg::Word(id.as_u256())
    }
}

impl From<u32> for Arg<'_> {
    fn from(n: u32) -> Self {
        Arg::U32(n)
    }
}

impl From<bool> for Arg<'_> {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl<'a, T: Into<Arg<'a>>> From<Option<T>> for Arg<'a> {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Arg::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Pure functions
// ---------------------------------------------------------------------------

/// Solidity `abi.encodePacked(namespace, args...)`, or `None` if the
/// namespace is empty or any argument is invalid.
pub fn encode_packed(namespace: &str, args: &[Arg<'_>]) -> Option<Vec<u8>> {
    if namespace.is_empty() || !args.iter().all(Arg::is_valid) {
        return None;
    }
    let mut out = Vec::with_capacity(namespace.len() + args.len() * 32);
    out.extend_from_slice(namespace.as_bytes());
    for arg in args {
        arg.encode_into(&mut out);
    }
    Some(out)
}

/// Type-tagged cache key, e.g. `inventory.instance|u:2a|w:1`.
pub fn cache_key(namespace: &str, args: &[Arg<'_>]) -> String {
    let mut key = String::with_capacity(namespace.len() + args.len() * 16);
    key.push_str(namespace);
    for arg in args {
        arg.key_into(&mut key);
    }
    key
}

pub(crate) fn keccak(bytes: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Hash without caching. `None` for invalid input.
pub fn hash_id(namespace: &str, args: &[Arg<'_>]) -> Option<EntityId> {
    encode_packed(namespace, args).map(|bytes| EntityId::from_be_bytes(&keccak(&bytes)))
}

// ---------------------------------------------------------------------------
// IdResolver
// ---------------------------------------------------------------------------

/// Memoizing content-ID resolver.
///
/// The cache is append-only: a hash of fixed inputs never changes, so no
/// entry ever goes stale. Only the store lookup that follows is live.
#[derive(Debug, Default)]
pub struct IdResolver {
    cache: RefCell<HashMap<String, EntityId>>,
    hashes: Cell<u64>,
    hits: Cell<u64>,
}

impl IdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The content ID for `(namespace, args)`.
    ///
    /// Invalid input (empty namespace, a `Null` or empty-string argument)
    /// returns `None` without hashing.
    pub fn id(&self, namespace: &str, args: &[Arg<'_>]) -> Option<EntityId> {
        if namespace.is_empty() || !args.iter().all(Arg::is_valid) {
            return None;
        }
        let key = cache_key(namespace, args);
        if let Some(id) = self.cache.borrow().get(&key) {
            self.hits.set(self.hits.get() + 1);
            return Some(*id);
        }

        let id = hash_id(namespace, args)?;
        self.hashes.set(self.hashes.get() + 1);
        self.cache.borrow_mut().insert(key, id);
        Some(id)
    }

    /// The content ID looked up in `store`'s identifier index.
    pub fn resolve(
        &self,
        store: &dyn Store,
        namespace: &str,
        args: &[Arg<'_>],
    ) -> Option<EntityIndex> {
        self.id(namespace, args)
            .and_then(|id| store.entity_index(&id))
    }

    /// Number of times the hash function actually ran.
    pub fn hash_count(&self) -> u64 {
        self.hashes.get()
    }

    /// Number of lookups served from the cache.
    pub fn cache_hits(&self) -> u64 {
        self.hits.get()
    }

    /// Number of cached IDs.
    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
