//! Registry entry types.
//!
//! A registry entry is a `(data key, data, revision)` triple living under a
//! public key. Registries only keep the entry with the highest revision, and
//! refuse writes whose revision is not strictly greater than the stored one,
//! which turns the revision into the guard against stale overwrites.

use std::fmt;

use bytes::Bytes;

use crate::{
    Hash,
    crypto::{self, Signature},
    hash::HashParseError,
    link::RAW_CONTENT_LINK_SIZE,
};

/// Maximum length of an entry's `data` field. Writes above it are rejected
/// before any network round trip.
pub const MAX_ENTRY_DATA_SIZE: usize = 70;

/// Entry data marking an entry as deleted: the length of a raw content link,
/// all zeros.
pub const DELETION_ENTRY_DATA: [u8; RAW_CONTENT_LINK_SIZE] = [0u8; RAW_CONTENT_LINK_SIZE];

/// Errors that can occur while constructing an entry.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EntryError {
    #[error("entry data too large: {size} bytes (max: {max})")]
    DataTooLarge { size: usize, max: usize },

    #[error("invalid data key: {0}")]
    InvalidDataKey(#[from] HashParseError),
}

/// The key of an entry below a public key.
///
/// Plain keys are hashed with [`crypto::data_key_digest`] before use;
/// `Hashed` keys are already digests, e.g. taken from an entry link.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum DataKey {
    Plain(String),
    Hashed(Hash),
}

impl DataKey {
    pub fn digest(&self) -> Hash {
        match self {
            DataKey::Plain(key) => crypto::data_key_digest(key),
            DataKey::Hashed(hash) => *hash,
        }
    }

    /// A pre-hashed key given as 64 hex characters.
    pub fn from_hex(s: &str) -> Result<Self, EntryError> {
        Ok(DataKey::Hashed(Hash::from_hex(s)?))
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKey::Plain(key) => f.debug_tuple("Plain").field(key).finish(),
            DataKey::Hashed(hash) => f.debug_tuple("Hashed").field(&hash.to_hex()).finish(),
        }
    }
}

impl From<&str> for DataKey {
    fn from(value: &str) -> Self {
        DataKey::Plain(value.to_owned())
    }
}

impl From<String> for DataKey {
    fn from(value: String) -> Self {
        DataKey::Plain(value)
    }
}

impl From<&String> for DataKey {
    fn from(value: &String) -> Self {
        DataKey::Plain(value.clone())
    }
}

impl From<Hash> for DataKey {
    fn from(value: Hash) -> Self {
        DataKey::Hashed(value)
    }
}

impl From<&DataKey> for DataKey {
    fn from(value: &DataKey) -> Self {
        value.clone()
    }
}

/// An unsigned registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Digest of the data key.
    pub data_key: Hash,
    /// Payload, at most [`MAX_ENTRY_DATA_SIZE`] bytes.
    pub data: Bytes,
    pub revision: u64,
}

impl RegistryEntry {
    /// Creates an entry, enforcing the data size ceiling.
    pub fn new(
        data_key: &DataKey,
        data: impl Into<Bytes>,
        revision: u64,
    ) -> Result<Self, EntryError> {
        Self::from_digest(data_key.digest(), data, revision)
    }

    pub fn from_digest(
        data_key: Hash,
        data: impl Into<Bytes>,
        revision: u64,
    ) -> Result<Self, EntryError> {
        let data = data.into();
        check_data_size(&data)?;
        Ok(Self {
            data_key,
            data,
            revision,
        })
    }

    /// Canonical digest that gets signed.
    pub fn digest(&self) -> Hash {
        crypto::entry_digest(self)
    }

    /// True if the data is the deletion sentinel.
    pub fn is_deletion(&self) -> bool {
        self.data.as_ref() == DELETION_ENTRY_DATA
    }
}

/// Rejects data above [`MAX_ENTRY_DATA_SIZE`].
pub fn check_data_size(data: &[u8]) -> Result<(), EntryError> {
    if data.len() > MAX_ENTRY_DATA_SIZE {
        return Err(EntryError::DataTooLarge {
            size: data.len(),
            max: MAX_ENTRY_DATA_SIZE,
        });
    }
    Ok(())
}

/// An entry together with the signature over its digest.
///
/// Values of this type handed out by the registry client have been verified
/// against the public key they were requested for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRegistryEntry {
    pub entry: RegistryEntry,
    pub signature: Signature,
}
