//! Registry access for SkyDB.
//!
//! - [`RegistryClient`]: fetches and publishes single signed entries through
//!   any [`skydb_core::RegistryTransport`], re-verifying every fetched entry
//!   before handing it out.
//! - [`MemoryRegistry`]: in-process registry enforcing the same revision
//!   rules as a real registry service. Useful for tests and single-process
//!   setups.

mod client;
mod memory;

pub use client::{RegistryClient, RegistryError, verify_record};
pub use memory::MemoryRegistry;
