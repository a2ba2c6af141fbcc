//! Test utilities for `RegistryTransport` implementations.
//!
//! This module provides a conformance suite that can be run against any
//! `RegistryTransport` implementation to verify the revision rules the
//! client layer relies on.
//!
//! # Usage
//!
//! In your registry crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! skydb_core = { workspace = true, features = ["testutil"] }
//! ```
//!
//! In your test file:
//!
//! ```ignore
//! use skydb_core::testutil::RegistryTransportTests;
//!
//! #[tokio::test]
//! async fn test_my_registry() {
//!     let registry = MyRegistry::new(...);
//!     RegistryTransportTests::new(&registry).run_all().await.unwrap();
//! }
//! ```

use bytes::Bytes;

use crate::{
    crypto::Keypair,
    entry::{DataKey, RegistryEntry},
    transport::{PublishRequest, RegistryTransport, TransportError},
};

/// Test suite for `RegistryTransport` implementations.
pub struct RegistryTransportTests<'a, T> {
    transport: &'a T,
    keypair: Keypair,
    /// Prefix for data keys to avoid conflicts on shared registries
    prefix: String,
}

impl<'a, T: RegistryTransport> RegistryTransportTests<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        let prefix = format!("_test_{}/", rand::random::<u32>());
        Self {
            transport,
            keypair: Keypair::derive(prefix.as_bytes()),
            prefix,
        }
    }

    /// Create a new test suite signing with a fixed keypair.
    pub fn with_keypair(transport: &'a T, keypair: Keypair) -> Self {
        Self {
            transport,
            keypair,
            prefix: format!("_test_{}/", rand::random::<u32>()),
        }
    }

    fn data_key(&self, name: &str) -> DataKey {
        DataKey::from(format!("{}{}", self.prefix, name))
    }

    /// Builds a correctly signed publish request.
    pub fn signed_request(
        &self,
        data_key: &DataKey,
        data: &'static [u8],
        revision: u64,
    ) -> PublishRequest {
        let entry = RegistryEntry::new(data_key, Bytes::from_static(data), revision)
            .expect("test data fits in an entry");
        let signature = self.keypair.sign(&entry.digest());
        PublishRequest {
            public_key: self.keypair.public_key(),
            data_key: entry.data_key,
            data: entry.data,
            revision: entry.revision,
            signature: Bytes::copy_from_slice(&signature.to_bytes()),
        }
    }

    /// Run all tests.
    pub async fn run_all(&self) -> Result<(), TransportError> {
        self.test_missing_entry().await?;
        self.test_publish_then_lookup().await?;
        self.test_equal_revision_rejected().await?;
        self.test_lower_revision_rejected().await?;
        self.test_higher_revision_replaces().await?;
        self.test_keys_are_independent().await?;
        Ok(())
    }

    pub async fn test_missing_entry(&self) -> Result<(), TransportError> {
        let key = self.data_key("missing");
        let record = self
            .transport
            .lookup(&self.keypair.public_key(), &key.digest())
            .await?;
        assert!(record.is_none(), "unknown entry should look up as None");
        Ok(())
    }

    pub async fn test_publish_then_lookup(&self) -> Result<(), TransportError> {
        let key = self.data_key("roundtrip");
        let request = self.signed_request(&key, b"hello", 0);
        self.transport.publish(request.clone()).await?;

        let record = self
            .transport
            .lookup(&self.keypair.public_key(), &key.digest())
            .await?
            .expect("published entry should be found");
        assert_eq!(record.data, request.data);
        assert_eq!(record.revision, 0);
        assert_eq!(record.signature, request.signature);
        Ok(())
    }

    pub async fn test_equal_revision_rejected(&self) -> Result<(), TransportError> {
        let key = self.data_key("equal");
        self.transport
            .publish(self.signed_request(&key, b"first", 3))
            .await?;

        let result = self
            .transport
            .publish(self.signed_request(&key, b"second", 3))
            .await;
        assert!(
            matches!(result, Err(TransportError::Rejected { revision: 3, .. })),
            "equal revision should be rejected, got {result:?}"
        );

        let record = self
            .transport
            .lookup(&self.keypair.public_key(), &key.digest())
            .await?
            .expect("entry should still exist");
        assert_eq!(record.data.as_ref(), b"first", "rejected write must not land");
        Ok(())
    }

    pub async fn test_lower_revision_rejected(&self) -> Result<(), TransportError> {
        let key = self.data_key("lower");
        self.transport
            .publish(self.signed_request(&key, b"new", 10))
            .await?;

        let result = self
            .transport
            .publish(self.signed_request(&key, b"old", 9))
            .await;
        assert!(
            matches!(result, Err(TransportError::Rejected { revision: 9, .. })),
            "lower revision should be rejected, got {result:?}"
        );
        Ok(())
    }

    pub async fn test_higher_revision_replaces(&self) -> Result<(), TransportError> {
        let key = self.data_key("higher");
        self.transport
            .publish(self.signed_request(&key, b"v1", 1))
            .await?;
        self.transport
            .publish(self.signed_request(&key, b"v2", 2))
            .await?;

        let record = self
            .transport
            .lookup(&self.keypair.public_key(), &key.digest())
            .await?
            .expect("entry should exist");
        assert_eq!(record.revision, 2);
        assert_eq!(record.data.as_ref(), b"v2");
        Ok(())
    }

    pub async fn test_keys_are_independent(&self) -> Result<(), TransportError> {
        let a = self.data_key("independent_a");
        let b = self.data_key("independent_b");
        self.transport
            .publish(self.signed_request(&a, b"a", 5))
            .await?;
        self.transport
            .publish(self.signed_request(&b, b"b", 0))
            .await?;

        let other = Keypair::derive(format!("{}other", self.prefix));
        let record = self.transport.lookup(&other.public_key(), &a.digest()).await?;
        assert!(record.is_none(), "entries are namespaced by public key");
        Ok(())
    }
}
