#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use skydb::{SkyDb, SkyDbConfig};
use skydb_core::{
    Hash, PublicKey, RegistryTransport, TransportError,
    transport::{PublishRequest, RegistryRecord},
};
use skydb_registry::MemoryRegistry;
use skydb_store_memory::MemoryBlobStore;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A SkyDb over fresh in-memory collaborators, returned alongside them so
/// tests can share or inspect them.
pub fn memory_db() -> (SkyDb, Arc<MemoryBlobStore>, Arc<RecordingRegistry>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let registry = Arc::new(RecordingRegistry::default());
    let db = SkyDb::new(SkyDbConfig::default(), blobs.clone(), registry.clone()).unwrap();
    (db, blobs, registry)
}

/// A second SkyDb sharing collaborators but with its own revision cache,
/// standing in for another process.
pub fn other_process(blobs: &Arc<MemoryBlobStore>, registry: &Arc<RecordingRegistry>) -> SkyDb {
    SkyDb::new(SkyDbConfig::default(), blobs.clone(), registry.clone()).unwrap()
}

/// Memory registry that records every accepted publish.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    pub inner: MemoryRegistry,
    published: Mutex<Vec<(Hash, u64)>>,
}

impl RecordingRegistry {
    /// Revisions accepted for `data_key`, in publish order.
    pub fn revisions(&self, data_key: &Hash) -> Vec<u64> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key == data_key)
            .map(|(_, revision)| *revision)
            .collect()
    }
}

#[async_trait]
impl RegistryTransport for RecordingRegistry {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        self.inner.lookup(public_key, data_key).await
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError> {
        let key = (request.data_key, request.revision);
        self.inner.publish(request).await?;
        self.published.lock().unwrap().push(key);
        Ok(())
    }
}

/// Registry whose lookups return records with one signature byte flipped.
#[derive(Debug, Default)]
pub struct TamperingRegistry {
    pub inner: MemoryRegistry,
}

#[async_trait]
impl RegistryTransport for TamperingRegistry {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        Ok(self
            .inner
            .lookup(public_key, data_key)
            .await?
            .map(|mut record| {
                let mut signature = record.signature.to_vec();
                signature[17] ^= 0x80;
                record.signature = Bytes::from(signature);
                record
            }))
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError> {
        self.inner.publish(request).await
    }
}
