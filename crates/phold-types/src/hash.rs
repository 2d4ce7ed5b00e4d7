use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of a [`ContentHash`] in raw bytes (SHA-1).
const HASH_LEN: usize = 20;

/// Length of a [`ContentHash`] rendered as hex.
pub const HASH_HEX_LEN: usize = HASH_LEN * 2;

/// Git object hash a placeholder is pinned to.
///
/// Always renders as exactly [`HASH_HEX_LEN`] lowercase hex characters, which
/// is what lets the on-disk add record put the hash after a variable-length
/// path without any escaping. The all-zero hash is reserved for directory
/// placeholders.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Sentinel hash recorded for directory placeholders.
    pub const ZERO: Self = Self([0u8; HASH_LEN]);

    /// Create a `ContentHash` from raw digest bytes.
    pub const fn from_raw(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns `true` if this is the directory sentinel.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex representation, always [`HASH_HEX_LEN`] chars.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string of exactly [`HASH_HEX_LEN`] characters.
    ///
    /// Upper- and lowercase digits are both accepted.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != HASH_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: HASH_HEX_LEN,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for ContentHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}
