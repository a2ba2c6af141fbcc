//! The registry transport seam.
//!
//! A [`RegistryTransport`] moves single registry records between this
//! process and a registry service. It does no verification of its own: the
//! registry client re-verifies everything a transport hands back.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Hash, crypto::PublicKey};

/// A registry record as returned by a transport, not yet verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRecord {
    pub data: Bytes,
    pub revision: u64,
    /// Raw signature bytes. Length is checked during verification.
    pub signature: Bytes,
}

/// A signed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub public_key: PublicKey,
    /// Digest of the data key.
    pub data_key: Hash,
    pub data: Bytes,
    pub revision: u64,
    pub signature: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The registry refused the revision because it already stores an equal
    /// or higher one.
    #[error("registry rejected revision {revision}: {reason}")]
    Rejected { revision: u64, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Interface to a registry service.
///
/// # Semantics
///
/// - `lookup` returns `Ok(None)` when the registry has no entry for the key.
/// - `publish` must fail with [`TransportError::Rejected`] when the stored
///   revision is greater than or equal to the published one. Every other
///   failure is [`TransportError::Other`].
#[async_trait]
pub trait RegistryTransport: std::fmt::Debug + Send + Sync {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError>;

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError>;
}

#[async_trait]
impl<T: RegistryTransport + ?Sized + Send + Sync> RegistryTransport for std::sync::Arc<T> {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        (**self).lookup(public_key, data_key).await
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError> {
        (**self).publish(request).await
    }
}

#[async_trait]
impl<T: RegistryTransport + ?Sized + Send + Sync> RegistryTransport for Box<T> {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        (**self).lookup(public_key, data_key).await
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError> {
        (**self).publish(request).await
    }
}
