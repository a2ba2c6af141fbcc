//! BIP39 seed phrase handling.
//!
//! ```text
//! seed_phrase (12 words BIP39)
//!     |
//!     v
//! mnemonic.to_seed("") -> 64 bytes
//!     |
//!     v
//! Keypair::derive(seed) -> blake3::derive_key("skydb/keypair/ed25519", seed)
//!     |
//!     +-> ed25519 signing key -> public key (registry namespace)
//! ```

use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroize;

use crate::crypto::Keypair;

/// Errors that can occur during key operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl Keypair {
    /// Derives the keypair belonging to a 12-word BIP39 seed phrase.
    pub fn from_seed_phrase(phrase: &str) -> Result<Self, KeyError> {
        let mnemonic = Mnemonic::parse_in(Language::English, phrase)
            .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
        let mut seed = mnemonic.to_seed("");
        let keypair = Keypair::derive(seed);
        seed.zeroize();
        Ok(keypair)
    }
}

/// Generates a new random 12-word BIP39 seed phrase.
pub fn generate_seed_phrase() -> Result<String, KeyError> {
    let mnemonic = Mnemonic::generate_in(Language::English, 12)
        .map_err(|e| KeyError::InvalidMnemonic(e.to_string()))?;
    Ok(mnemonic.to_string())
}

pub fn validate_seed_phrase(phrase: &str) -> bool {
    Mnemonic::parse_in(Language::English, phrase).is_ok()
}
