use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use skydb_core::{
    Hash, PublicKey, RegistryTransport, TransportError,
    transport::{PublishRequest, RegistryRecord},
};
use tracing::debug;

use crate::client::verify_record;

/// In-memory registry.
///
/// Behaves like a registry service: it checks the signature of every
/// publish and only accepts revisions strictly greater than the stored one.
/// The check and the write happen under the same map shard lock.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: DashMap<(PublicKey, Hash), RegistryRecord>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RegistryTransport for MemoryRegistry {
    async fn lookup(
        &self,
        public_key: &PublicKey,
        data_key: &Hash,
    ) -> Result<Option<RegistryRecord>, TransportError> {
        Ok(self
            .entries
            .get(&(*public_key, *data_key))
            .map(|record| record.value().clone()))
    }

    async fn publish(&self, request: PublishRequest) -> Result<(), TransportError> {
        let record = RegistryRecord {
            data: request.data,
            revision: request.revision,
            signature: request.signature,
        };
        verify_record(&request.public_key, request.data_key, record.clone())
            .map_err(anyhow::Error::from)?;

        match self.entries.entry((request.public_key, request.data_key)) {
            Entry::Occupied(mut slot) => {
                let stored = slot.get().revision;
                if record.revision <= stored {
                    return Err(TransportError::Rejected {
                        revision: record.revision,
                        reason: format!("stored revision is {stored}"),
                    });
                }
                slot.insert(record);
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        debug!(
            public_key = %request.public_key,
            data_key = %request.data_key.fmt_short(),
            revision = request.revision,
            "memory registry stored entry"
        );
        Ok(())
    }
}
