use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Largest digest an [`ObjectId`] can hold (BLAKE3 / SHA-256 width).
pub const MAX_DIGEST_LEN: usize = 32;

/// Content-addressed identifier for a stored object.
///
/// Native objects are identified by their BLAKE3 hash. Identifiers coming
/// from other stores (e.g. 20-byte git SHA-1 ids) are carried with their
/// original width so that equality and display stay faithful to the source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    hash: [u8; MAX_DIGEST_LEN],
    len: u8,
}

impl ObjectId {
    /// Compute an `ObjectId` from raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_hash(*blake3::hash(data).as_bytes())
    }

    /// Create an `ObjectId` from a pre-computed 32-byte hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self {
            hash,
            len: MAX_DIGEST_LEN as u8,
        }
    }

    /// Wrap a digest produced by another hash function.
    pub fn from_digest(digest: &[u8]) -> Result<Self, TypeError> {
        if digest.is_empty() || digest.len() > MAX_DIGEST_LEN {
            return Err(TypeError::InvalidLength {
                expected: MAX_DIGEST_LEN,
                actual: digest.len(),
            });
        }
        let mut hash = [0u8; MAX_DIGEST_LEN];
        hash[..digest.len()].copy_from_slice(digest);
        Ok(Self {
            hash,
            len: digest.len() as u8,
        })
    }

    /// The null object ID (all zeros). Represents "no object".
    pub const fn null() -> Self {
        Self {
            hash: [0u8; MAX_DIGEST_LEN],
            len: MAX_DIGEST_LEN as u8,
        }
    }

    /// Returns `true` if this is the null object ID.
    pub fn is_null(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }

    /// The digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.hash[..self.len as usize]
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_digest(&bytes)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(bytes: [u8; 32]) -> Self {
        Self::from_hash(bytes)
    }
}
