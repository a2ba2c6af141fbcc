//! The digest type used by SkyDB (blake3, 32 bytes).
//!
//! Used for content digests inside content links, for data-key digests
//! and for the canonical entry digest that gets signed.

use std::{fmt, str::FromStr};

/// A 32-byte blake3 digest.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Hash(blake3::Hash);

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.to_hex()).finish()
    }
}

/// Error returned when a hex string is not a 32-byte digest.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hex digest: {0}")]
pub struct HashParseError(String);

impl Hash {
    /// The all-zero digest. Never produced by hashing; used as filler in
    /// sentinel payloads.
    pub const ZERO: Hash = Hash::from_bytes([0u8; 32]);

    /// The size of the digest in bytes.
    pub const SIZE: usize = 32;

    /// Hash the provided bytes.
    pub fn new(buf: impl AsRef<[u8]>) -> Self {
        Hash(blake3::hash(buf.as_ref()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from_bytes(bytes))
    }

    /// Lowercase hex, the form used on the registry wire.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let bytes = hex::decode(s).map_err(|e| HashParseError(e.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| HashParseError(format!("expected 32 bytes, got {}", b.len())))?;
        Ok(Self::from_bytes(array))
    }

    /// First 5 bytes as hex, for log lines.
    pub fn fmt_short(&self) -> String {
        data_encoding::HEXLOWER.encode(&self.as_bytes()[..5])
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<blake3::Hash> for Hash {
    fn from(value: blake3::Hash) -> Self {
        Hash(value)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(value: [u8; 32]) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Hash> for [u8; 32] {
    fn from(value: Hash) -> Self {
        *value.as_bytes()
    }
}

impl PartialOrd for Hash {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Hash {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_value() {
        let hash = Hash::new(b"hello");
        assert_eq!(
            hash.to_hex(),
            "ea8f163db38682925e4491c5e58d4bb3506ef8c14eb78a86e908c5624a67200f"
        );
    }

    #[test]
    fn hex_roundtrip() {
        let hash = Hash::new(b"data key");
        let parsed: Hash = hash.to_hex().parse().unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("zz").is_err());
    }

    #[test]
    fn fmt_short_is_prefix() {
        let hash = Hash::new(b"hello");
        let short = hash.fmt_short();
        assert_eq!(short.len(), 10);
        assert!(hash.to_hex().starts_with(&short));
    }

    #[test]
    fn zero_is_all_zero() {
        assert_eq!(Hash::ZERO.as_bytes(), &[0u8; 32]);
        assert_ne!(Hash::new(b""), Hash::ZERO);
    }
}
