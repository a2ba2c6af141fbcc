use anyhow::anyhow;
use bytes::Bytes;
use dashmap::DashMap;
use skydb_core::{
    ContentLink, Hash,
    blob::{BlobResult, BlobsRead, BlobsWrite},
};

/// Content-addressed blob store kept in process memory.
#[derive(Debug)]
pub struct MemoryBlobStore {
    blobs: DashMap<Hash, Bytes>,
}

impl MemoryBlobStore {
    /// Creates a new, empty `MemoryBlobStore`.
    pub fn new() -> Self {
        Self {
            blobs: DashMap::new(),
        }
    }

    /// Checks if a blob with the given content digest is stored.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.blobs.contains_key(hash)
    }

    /// Replaces the bytes stored under `hash` without rehashing.
    ///
    /// Lets tests simulate a store that serves the wrong content.
    pub fn corrupt(&self, hash: Hash, bytes: Bytes) {
        self.blobs.insert(hash, bytes);
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BlobsWrite for MemoryBlobStore {
    /// Stores the bytes under their blake3 digest.
    async fn blob_upload_bytes(&self, bytes: Bytes) -> BlobResult<ContentLink> {
        let hash = Hash::new(&bytes);
        self.blobs.insert(hash, bytes);
        Ok(ContentLink::new(hash))
    }
}

#[async_trait::async_trait]
impl BlobsRead for MemoryBlobStore {
    /// Returns the stored bytes. Does not check them against the link.
    async fn blob_download(&self, link: &ContentLink) -> BlobResult<Bytes> {
        self.blobs
            .get(&link.hash())
            .map(|blob| blob.value().clone())
            .ok_or_else(|| anyhow!("blob {} not found", link.hash().fmt_short()))
    }
}
