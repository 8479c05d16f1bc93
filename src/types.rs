//! Core types for the gitstore object model.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Hash: raw 256-bit digest value
pub type Hash = [u8; 32];

/// ObjectId: BLAKE3 digest of an object's canonical encoding
///
/// Identifies blobs, trees and commits alike. Two objects with identical
/// content always share the same ObjectId.
///
/// Serializes as raw bytes in binary formats and as hex in human-readable
/// ones (JSON, TOML).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Hash);

impl ObjectId {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: Hash) -> Self {
        ObjectId(bytes)
    }

    /// Build an id from a byte slice read back from storage.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: Hash = bytes.try_into().ok()?;
        Some(ObjectId(arr))
    }

    /// Digest of an already-encoded object.
    pub fn digest(encoded: &[u8]) -> Self {
        ObjectId(*blake3::hash(encoded).as_bytes())
    }

    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated form used in log lines and CLI output
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short())
    }
}

impl FromStr for ObjectId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(ObjectId(arr))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let raw = String::deserialize(deserializer)?;
            raw.parse().map_err(serde::de::Error::custom)
        } else {
            Hash::deserialize(deserializer).map(ObjectId)
        }
    }
}
