use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha512Trunc256};
use std::fmt;

pub const HASH_SIZE: usize = 32;

/// A SHA-512/256 digest, the hash used throughout the consensus layer for
/// transactions, blocks and address derivation.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub fn digest(data: &[u8]) -> Self {
        Self::digest_parts(&[data])
    }

    pub fn digest_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha512Trunc256::new();
        for part in parts {
            hasher.update(part);
        }
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(&hasher.finalize());
        Hash(out)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != HASH_SIZE {
            return None;
        }
        let mut out = [0u8; HASH_SIZE];
        out.copy_from_slice(bytes);
        Some(Hash(out))
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        hex::decode(s).ok().and_then(|b| Self::from_slice(&b))
    }

    /// The hash of empty input, used by the node to mark events that are not
    /// owned by any transaction.
    pub fn empty() -> Self {
        Self::digest(&[])
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::empty() || self.0 == [0u8; HASH_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

struct HashVisitor;

impl<'de> Visitor<'de> for HashVisitor {
    type Value = Hash;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a {} byte hash", HASH_SIZE)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
        // An empty byte string is how some node versions encode "no hash".
        if v.is_empty() {
            return Ok(Hash::default());
        }
        Hash::from_slice(v).ok_or_else(|| E::invalid_length(v.len(), &self))
    }

    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
        self.visit_bytes(&v)
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_bytes(HashVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_hash_is_detected() {
        assert!(Hash::empty().is_empty());
        assert!(Hash::default().is_empty());
        assert!(!Hash::digest(b"tx").is_empty());
    }

    #[test]
    fn digest_parts_matches_concatenation() {
        assert_eq!(
            Hash::digest_parts(&[&b"oasis-core"[..], &b"/"[..], &b"hash"[..]]),
            Hash::digest(b"oasis-core/hash")
        );
    }

    #[test]
    fn hex_text_form() {
        let h = Hash::digest(b"block");
        assert_eq!(h.to_string().len(), 2 * HASH_SIZE);
        assert_eq!(Hash::from_hex(&h.to_string()), Some(h));
        assert_eq!(Hash::from_hex("abcd"), None);
    }

    #[test]
    fn cbor_encoding_is_a_byte_string() {
        let h = Hash::digest(b"cbor");
        let bytes = serde_cbor::to_vec(&h).unwrap();
        // Major type 2, one byte length follows.
        assert_eq!(bytes[0], 0x58);
        assert_eq!(bytes[1] as usize, HASH_SIZE);
        let back: Hash = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(back, h);
    }
}
