//! SkyDB: mutable JSON documents on top of a signed registry and an
//! immutable blob store.
//!
//! A document lives under a `(public key, data key)` pair. Its bytes are
//! stored as an immutable blob and the registry entry for the pair holds the
//! content link of the current version. Every write bumps the entry's
//! revision; registries refuse revisions that do not increase.
//!
//! - [`SkyDb`]: read and write documents and raw entry data
//! - [`RevisionCache`]: per-entry revision tracking and write serialization
//! - [`EntryLinkResolver`]: entry link to content link resolution
//!
//! # Example
//!
//! ```ignore
//! use skydb::{SkyDb, SkyDbConfig};
//! use skydb_core::Keypair;
//! use skydb_registry::MemoryRegistry;
//! use skydb_store_memory::MemoryBlobStore;
//!
//! async fn demo() -> skydb::Result<()> {
//!     let db = SkyDb::new(SkyDbConfig::default(), MemoryBlobStore::new(), MemoryRegistry::new())?;
//!     let keypair = Keypair::derive(b"my seed");
//!
//!     db.set_json(&keypair, "app/settings", &serde_json::json!({"theme": "dark"})).await?;
//!     let doc = db.get_json(&keypair.public_key(), "app/settings").await?;
//!     assert_eq!(doc.data.unwrap()["theme"], "dark");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
mod db;
pub mod error;
mod resolver;

pub use cache::{CachedRevision, RevisionCache};
pub use config::{GetJsonOptions, SkyDbConfig};
pub use db::{JsonData, SkyDb};
pub use error::{Error, Result};
pub use resolver::EntryLinkResolver;
