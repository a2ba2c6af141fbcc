//! Immutable blob store seam.
//!
//! Blobs are addressed by content links. How bytes travel to and from the
//! store is up to the implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::link::ContentLink;

pub type BlobResult<T> = anyhow::Result<T>;

/// Async read interface for content-addressed blobs.
#[async_trait]
pub trait BlobsRead: Sync + Send {
    /// Downloads a full blob into memory.
    async fn blob_download(&self, link: &ContentLink) -> BlobResult<Bytes>;
}

/// Async write interface for content-addressed blobs.
#[async_trait]
pub trait BlobsWrite: Sync + Send {
    /// Uploads a blob and returns the content link addressing it.
    async fn blob_upload_bytes(&self, bytes: Bytes) -> BlobResult<ContentLink>;
}

/// A store that can both read and write blobs.
pub trait BlobStore: BlobsRead + BlobsWrite + std::fmt::Debug {}

impl<T: BlobsRead + BlobsWrite + std::fmt::Debug> BlobStore for T {}

#[async_trait]
impl<T: BlobsRead + ?Sized> BlobsRead for std::sync::Arc<T> {
    async fn blob_download(&self, link: &ContentLink) -> BlobResult<Bytes> {
        (**self).blob_download(link).await
    }
}

#[async_trait]
impl<T: BlobsWrite + ?Sized> BlobsWrite for std::sync::Arc<T> {
    async fn blob_upload_bytes(&self, bytes: Bytes) -> BlobResult<ContentLink> {
        (**self).blob_upload_bytes(bytes).await
    }
}
