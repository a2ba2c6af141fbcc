use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use skydb_core::{
    DataKey, Hash, Keypair, MAX_ENTRY_DATA_SIZE, PublicKey, RegistryEntry, RegistryTransport,
    TransportError, TrustError,
    transport::{PublishRequest, RegistryRecord},
};
use skydb_registry::{MemoryRegistry, RegistryClient, RegistryError};

/// Transport that flips one signature byte on the way out.
#[derive(Debug)]
struct TamperingTransport {
    inner: MemoryRegistry,
}

#[async_trait]
impl RegistryTransport for TamperingTransport {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        Ok(self.inner.lookup(public_key, data_key).await?.map(|mut record| {
            let mut signature = record.signature.to_vec();
            signature[0] ^= 0x01;
            record.signature = Bytes::from(signature);
            record
        }))
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError> {
        self.inner.publish(request).await
    }
}

/// Transport that fails the test if it is ever called.
#[derive(Debug)]
struct UnreachableTransport;

#[async_trait]
impl RegistryTransport for UnreachableTransport {
    async fn lookup(
        &self,
        _public_key: &PublicKey,
        _data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        panic!("lookup must not be called");
    }

    async fn publish(&self, _request: PublishRequest) -> Result<(), TransportError> {
        panic!("publish must not be called");
    }
}

#[tokio::test]
async fn publish_then_get() {
    let client = RegistryClient::new(MemoryRegistry::new());
    let keypair = Keypair::derive(b"client");
    let key = DataKey::from("app/settings");

    assert!(client.get_entry(&keypair.public_key(), &key).await.unwrap().is_none());

    let entry = RegistryEntry::new(&key, Bytes::from_static(b"v0"), 0).unwrap();
    client.publish(&keypair, entry.clone()).await.unwrap();

    let fetched = client
        .get_entry(&keypair.public_key(), &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.entry, entry);
}

#[tokio::test]
async fn stale_revision_is_a_conflict() {
    let client = RegistryClient::new(MemoryRegistry::new());
    let keypair = Keypair::derive(b"client");
    let key = DataKey::from("k");

    let entry = RegistryEntry::new(&key, Bytes::from_static(b"a"), 5).unwrap();
    client.publish(&keypair, entry).await.unwrap();

    let stale = RegistryEntry::new(&key, Bytes::from_static(b"b"), 5).unwrap();
    let err = client.publish(&keypair, stale).await.unwrap_err();
    assert!(matches!(err, RegistryError::Conflict { revision: 5, .. }));
}

#[tokio::test]
async fn tampered_signature_is_a_trust_error() {
    let registry = Arc::new(TamperingTransport {
        inner: MemoryRegistry::new(),
    });
    let client = RegistryClient::from_arc(registry);
    let keypair = Keypair::derive(b"victim");
    let key = DataKey::from("k");

    let entry = RegistryEntry::new(&key, Bytes::from_static(b"payload"), 0).unwrap();
    client.publish(&keypair, entry).await.unwrap();

    let err = client.get_entry(&keypair.public_key(), &key).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Trust(TrustError::InvalidSignature { .. })
    ));
}

#[tokio::test]
async fn oversize_data_never_reaches_the_transport() {
    let client = RegistryClient::new(UnreachableTransport);
    let keypair = Keypair::derive(b"client");
    let entry = RegistryEntry {
        data_key: DataKey::from("k").digest(),
        data: Bytes::from(vec![1u8; MAX_ENTRY_DATA_SIZE + 1]),
        revision: 0,
    };
    let signature = RegistryClient::sign_entry(&keypair, &entry);
    let err = client
        .set_entry(&keypair.public_key(), &entry, &signature)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Entry(_)));
}

#[tokio::test]
async fn entry_link_is_deterministic() {
    let pk = Keypair::derive(b"links").public_key();
    let a = RegistryClient::entry_link(&pk, &DataKey::from("k")).to_string();
    let b = RegistryClient::entry_link(&pk, &DataKey::from("k")).to_string();
    assert_eq!(a, b);
    assert_ne!(a, RegistryClient::entry_link(&pk, &DataKey::from("j")).to_string());
}
