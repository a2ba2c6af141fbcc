//! Entry signing and verification.
//!
//! ## Entry digest layout
//!
//! Signatures are made over a blake3 digest of this exact byte layout.
//! Entries signed by older clients are verified with the same construction,
//! so the layout must never change:
//!
//! | Field | Size (bytes) | Description |
//! |---|---|---|
//! | Data key digest | 32 | blake3 of the data key |
//! | Data | 0..=70 | Entry payload, no length prefix |
//! | Revision | 8 | Big-endian `u64` |
//!
//! The data field is the only variable-length field, so the concatenation
//! is unambiguous without a length prefix.

use std::{fmt, str::FromStr};

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

use crate::{Hash, entry::RegistryEntry, keys::KeyError};

pub use ed25519_dalek::Signature;

/// Size of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Domain separation context for seed-based key derivation.
const KEYPAIR_DERIVE_CONTEXT: &str = "skydb/keypair/ed25519";

/// An Ed25519 public key, the namespace of a set of registry entries.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        let array: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|b: Vec<u8>| {
            KeyError::InvalidPublicKey(format!("expected 32 bytes, got {}", b.len()))
        })?;
        Ok(Self(array))
    }

    /// Decompresses the key. Fails for byte strings that are not a valid
    /// curve point.
    pub fn verifying_key(&self) -> Result<VerifyingKey, KeyError> {
        VerifyingKey::from_bytes(&self.0).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(value: VerifyingKey) -> Self {
        Self(value.to_bytes())
    }
}

/// An Ed25519 keypair. The secret half is zeroized on drop by
/// `ed25519-dalek`.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Keypair {
    /// Derives a keypair from arbitrary seed bytes. The same seed always
    /// yields the same keys.
    pub fn derive(seed: impl AsRef<[u8]>) -> Self {
        let secret = blake3::derive_key(KEYPAIR_DERIVE_CONTEXT, seed.as_ref());
        Self::from_secret_bytes(&secret)
    }

    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.signing_key.verifying_key().into()
    }

    /// Signs a digest. See [`sign`].
    pub fn sign(&self, digest: &Hash) -> Signature {
        sign(self, digest)
    }
}

/// Digest of a data key as used on the wire and inside entry links.
pub fn data_key_digest(data_key: &str) -> Hash {
    Hash::new(data_key.as_bytes())
}

/// Canonical digest of a registry entry, see the module docs for the layout.
pub fn entry_digest(entry: &RegistryEntry) -> Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(entry.data_key.as_bytes());
    hasher.update(&entry.data);
    hasher.update(&entry.revision.to_be_bytes());
    hasher.finalize().into()
}

pub fn sign(keypair: &Keypair, digest: &Hash) -> Signature {
    keypair.signing_key.sign(digest.as_bytes())
}

/// Returns `false` for a bad signature and for public keys that do not
/// decode to a curve point.
pub fn verify(public_key: &PublicKey, digest: &Hash, signature: &Signature) -> bool {
    match public_key.verifying_key() {
        Ok(key) => key.verify_strict(digest.as_bytes(), signature).is_ok(),
        Err(_) => false,
    }
}

/// A fetched entry or blob that must not be used as data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrustError {
    #[error("signature verification failed for entry {data_key} of {public_key}")]
    InvalidSignature { public_key: PublicKey, data_key: Hash },

    #[error("malformed registry record for entry {data_key} of {public_key}: {reason}")]
    MalformedRecord {
        public_key: PublicKey,
        data_key: Hash,
        reason: String,
    },

    #[error("downloaded content hashes to {actual}, link expects {expected}")]
    ContentMismatch { expected: Hash, actual: Hash },
}
