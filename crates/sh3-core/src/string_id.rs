//! Deterministic 64-bit string identifiers
//!
//! Scene, mesh, texture and entity names never cross the tool boundary as
//! strings. Everything downstream compares `StringId`s, so this hash must stay
//! bit-identical to the engine's FNV-1a implementation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// FNV-1a 64-bit offset basis
pub const STRING_HASH_BASIS: u64 = 14_695_981_039_346_656_037;

/// FNV-1a 64-bit prime
pub const STRING_HASH_PRIME: u64 = 1_099_511_628_211;

/// Hash a string with FNV-1a over its Unicode code points.
///
/// Each `char` is mixed in as its scalar value, not byte-wise as UTF-8, so
/// non-ASCII names hash the same way the authoring-side scripts did.
pub fn string_hash(s: &str) -> u64 {
    s.chars().fold(STRING_HASH_BASIS, |hash, c| {
        (hash ^ u64::from(c)).wrapping_mul(STRING_HASH_PRIME)
    })
}

/// Hashed name used as the sole cross-reference key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringId(u64);

impl StringId {
    /// Hash a name
    pub fn new(s: &str) -> Self {
        Self(string_hash(s))
    }

    /// Wrap an already computed hash
    pub const fn from_hash(hash: u64) -> Self {
        Self(hash)
    }

    /// Get the raw hash value
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StringId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StringId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<StringId> for u64 {
    fn from(id: StringId) -> Self {
        id.0
    }
}
