//! Core SkyDB types and traits.
//!
//! This crate defines the shared types used by all SkyDB crates.
//!
//! ## Protocol types (wire-stable)
//!
//! The following modules define byte layouts that are shared with every
//! other client of the registry and must not change:
//!
//! - Content and entry links (`link::ContentLink`, `link::EntryLink`)
//! - The signed entry digest (`crypto::entry_digest`)
//! - Data-key digests (`crypto::data_key_digest`)
//!
//! Changing any of them breaks links handed out earlier or the verification
//! of entries signed by older clients.
//!
//! ## Seams
//!
//! - `RegistryTransport`: moves registry records to and from a registry
//!   service; implementations in `skydb_registry` (`MemoryRegistry`)
//! - `BlobsRead` / `BlobsWrite`: immutable blob storage; implementation in
//!   `skydb_store_memory` (`MemoryBlobStore`)

pub mod blob;
pub mod crypto;
pub mod entry;
pub mod hash;
pub mod keys;
pub mod link;
pub mod transport;

// Test utilities (behind feature flag)
#[cfg(feature = "testutil")]
pub mod testutil;

pub use blob::{BlobStore, BlobsRead, BlobsWrite};
pub use crypto::{Keypair, PublicKey, Signature, TrustError};
pub use entry::{
    DELETION_ENTRY_DATA, DataKey, EntryError, MAX_ENTRY_DATA_SIZE, RegistryEntry,
    SignedRegistryEntry,
};
pub use hash::Hash;
pub use keys::KeyError;
pub use link::{ContentLink, EntryLink, Link, LinkError, ParsedLink, PathMode};
pub use transport::{PublishRequest, RegistryRecord, RegistryTransport, TransportError};
