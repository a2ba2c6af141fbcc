use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use skydb_core::{
    BlobStore, ContentLink, DELETION_ENTRY_DATA, DataKey, EntryLink, Hash, Keypair, PublicKey,
    RegistryEntry, RegistryTransport, SignedRegistryEntry, TrustError, entry::check_data_size,
};
use skydb_registry::{RegistryClient, RegistryError};
use tracing::{debug, warn};

use crate::{
    cache::RevisionCache,
    config::{GetJsonOptions, SkyDbConfig},
    error::{Error, Result},
    resolver::EntryLinkResolver,
};

/// Envelope version written by [`SkyDb::set_json`].
const ENVELOPE_VERSION: u64 = 2;
const ENVELOPE_DATA_FIELD: &str = "_data";
const ENVELOPE_VERSION_FIELD: &str = "_v";

/// A document read from or written to SkyDB.
///
/// Both fields are `None` when the entry does not exist or was deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonData {
    pub data: Option<Value>,
    pub link: Option<ContentLink>,
}

/// JSON documents and raw entry data under `(public key, data key)`.
///
/// Writes to the same entry from one `SkyDb` (or its clones) are serialized
/// through a shared [`RevisionCache`]. Each write runs on a spawned task,
/// so dropping the returned future does not abort a publish halfway.
#[derive(Debug, Clone)]
pub struct SkyDb {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    blobs: Arc<dyn BlobStore>,
    registry: RegistryClient,
    cache: RevisionCache,
    config: SkyDbConfig,
}

impl SkyDb {
    pub fn new<B, T>(config: SkyDbConfig, blobs: B, transport: T) -> Result<Self>
    where
        B: BlobStore + 'static,
        T: RegistryTransport + 'static,
    {
        Self::from_parts(config, Arc::new(blobs), RegistryClient::new(transport))
    }

    pub fn from_parts(
        config: SkyDbConfig,
        blobs: Arc<dyn BlobStore>,
        registry: RegistryClient,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                blobs,
                registry,
                cache: RevisionCache::new(),
                config,
            }),
        })
    }

    pub fn config(&self) -> &SkyDbConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &RegistryClient {
        &self.inner.registry
    }

    pub fn revision_cache(&self) -> &RevisionCache {
        &self.inner.cache
    }

    /// A resolver sharing this instance's registry client.
    pub fn resolver(&self) -> EntryLinkResolver {
        EntryLinkResolver::new(self.inner.registry.clone())
    }

    /// The entry link for `(public_key, data_key)`. No network access.
    pub fn entry_link(&self, public_key: &PublicKey, data_key: impl Into<DataKey>) -> EntryLink {
        RegistryClient::entry_link(public_key, &data_key.into())
    }

    pub async fn get_json(
        &self,
        public_key: &PublicKey,
        data_key: impl Into<DataKey>,
    ) -> Result<JsonData> {
        self.get_json_with(public_key, data_key, &GetJsonOptions::default())
            .await
    }

    pub async fn get_json_with(
        &self,
        public_key: &PublicKey,
        data_key: impl Into<DataKey>,
        options: &GetJsonOptions,
    ) -> Result<JsonData> {
        let data_key = data_key.into();
        let Some(link) = self.inner.content_link(public_key, &data_key).await? else {
            return Ok(JsonData::default());
        };

        if options.cached_data_link == Some(link) {
            debug!(link = %link, "document unchanged, skipping download");
            return Ok(JsonData {
                data: None,
                link: Some(link),
            });
        }

        let bytes = self.inner.download(&link).await?;
        let data = self.inner.decode_document(&bytes)?;
        Ok(JsonData {
            data: Some(data),
            link: Some(link),
        })
    }

    /// Uploads `json` and points the entry at it with the next revision.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        keypair: &Keypair,
        data_key: impl Into<DataKey>,
        json: &T,
    ) -> Result<JsonData> {
        let value = serde_json::to_value(json)?;
        let document = self.inner.encode_document(&value)?;
        let link = self
            .inner
            .blobs
            .blob_upload_bytes(document)
            .await
            .map_err(Error::Blob)?;

        self.write_entry(keypair, data_key.into(), Bytes::copy_from_slice(&link.to_bytes()))
            .await?;
        Ok(JsonData {
            data: Some(value),
            link: Some(link),
        })
    }

    /// Marks the entry deleted. Reads report it like a missing entry.
    pub async fn delete_json(&self, keypair: &Keypair, data_key: impl Into<DataKey>) -> Result<()> {
        self.write_entry(
            keypair,
            data_key.into(),
            Bytes::from_static(&DELETION_ENTRY_DATA),
        )
        .await?;
        Ok(())
    }

    /// Points the entry at an already uploaded blob.
    ///
    /// The all-zero link encodes like the deletion marker and is refused.
    pub async fn set_data_link(
        &self,
        keypair: &Keypair,
        data_key: impl Into<DataKey>,
        link: &ContentLink,
    ) -> Result<()> {
        let data = link.to_bytes();
        if data == DELETION_ENTRY_DATA {
            return Err(Error::ReservedData);
        }
        self.write_entry(keypair, data_key.into(), Bytes::copy_from_slice(&data))
            .await?;
        Ok(())
    }

    /// Downloads the blob the entry points at, without interpreting it.
    pub async fn get_raw_bytes(
        &self,
        public_key: &PublicKey,
        data_key: impl Into<DataKey>,
    ) -> Result<Option<Bytes>> {
        let data_key = data_key.into();
        match self.inner.content_link(public_key, &data_key).await? {
            Some(link) => Ok(Some(self.inner.download(&link).await?)),
            None => Ok(None),
        }
    }

    /// Stores up to [`skydb_core::MAX_ENTRY_DATA_SIZE`] bytes directly in the
    /// entry.
    pub async fn set_entry_data(
        &self,
        keypair: &Keypair,
        data_key: impl Into<DataKey>,
        data: impl Into<Bytes>,
    ) -> Result<()> {
        let data = data.into();
        if data.as_ref() == DELETION_ENTRY_DATA {
            return Err(Error::ReservedData);
        }
        self.write_entry(keypair, data_key.into(), data).await?;
        Ok(())
    }

    /// The raw data of the entry. `None` if missing or deleted.
    pub async fn get_entry_data(
        &self,
        public_key: &PublicKey,
        data_key: impl Into<DataKey>,
    ) -> Result<Option<Bytes>> {
        let data_key = data_key.into();
        Ok(self
            .inner
            .fetch_entry(public_key, &data_key)
            .await?
            .filter(|signed| !signed.entry.is_deletion())
            .map(|signed| signed.entry.data))
    }

    pub async fn delete_entry_data(
        &self,
        keypair: &Keypair,
        data_key: impl Into<DataKey>,
    ) -> Result<()> {
        self.delete_json(keypair, data_key).await
    }

    /// Publishes `data` at the next revision and returns that revision.
    async fn write_entry(&self, keypair: &Keypair, data_key: DataKey, data: Bytes) -> Result<u64> {
        check_data_size(&data)?;
        let inner = self.inner.clone();
        let keypair = keypair.clone();
        tokio::spawn(async move { inner.write_entry(keypair, data_key, data).await }).await?
    }
}

impl Inner {
    async fn fetch_entry(
        &self,
        public_key: &PublicKey,
        data_key: &DataKey,
    ) -> Result<Option<SignedRegistryEntry>> {
        let entry = self.registry.get_entry(public_key, data_key).await?;
        if let Some(signed) = &entry {
            self.cache
                .observe(public_key, &signed.entry.data_key, signed.entry.revision);
        }
        Ok(entry)
    }

    /// The content link stored in the entry, `None` if missing or deleted.
    async fn content_link(
        &self,
        public_key: &PublicKey,
        data_key: &DataKey,
    ) -> Result<Option<ContentLink>> {
        let Some(signed) = self.fetch_entry(public_key, data_key).await? else {
            return Ok(None);
        };
        if signed.entry.is_deletion() {
            return Ok(None);
        }
        Ok(Some(ContentLink::from_bytes(&signed.entry.data)?))
    }

    async fn download(&self, link: &ContentLink) -> Result<Bytes> {
        let bytes = self.blobs.blob_download(link).await.map_err(Error::Blob)?;
        if self.config.verify_content {
            let actual = Hash::new(&bytes);
            if actual != link.hash() {
                warn!(expected = %link.hash(), %actual, "downloaded blob does not match its link");
                return Err(TrustError::ContentMismatch {
                    expected: link.hash(),
                    actual,
                }
                .into());
            }
        }
        Ok(bytes)
    }

    fn encode_document(&self, value: &Value) -> Result<Bytes> {
        let bytes = if self.config.envelope {
            let mut envelope = Map::new();
            envelope.insert(ENVELOPE_DATA_FIELD.to_owned(), value.clone());
            envelope.insert(ENVELOPE_VERSION_FIELD.to_owned(), ENVELOPE_VERSION.into());
            serde_json::to_vec(&envelope)?
        } else {
            serde_json::to_vec(value)?
        };
        let size = bytes.len() as u64;
        if size > self.config.max_document_size {
            return Err(Error::DocumentTooLarge {
                size,
                max: self.config.max_document_size,
            });
        }
        Ok(Bytes::from(bytes))
    }

    /// Accepts both enveloped and bare documents.
    fn decode_document(&self, bytes: &[u8]) -> Result<Value> {
        match serde_json::from_slice(bytes)? {
            Value::Object(mut object)
                if object.contains_key(ENVELOPE_VERSION_FIELD)
                    && object.contains_key(ENVELOPE_DATA_FIELD) =>
            {
                Ok(object.remove(ENVELOPE_DATA_FIELD).unwrap_or(Value::Null))
            }
            value => Ok(value),
        }
    }

    async fn write_entry(&self, keypair: Keypair, data_key: DataKey, data: Bytes) -> Result<u64> {
        let public_key = keypair.public_key();
        let digest = data_key.digest();
        let data_key = &data_key;
        let keypair = &keypair;

        self.cache
            .with_lock(
                public_key,
                digest,
                || async {
                    let remote = self.registry.get_entry(&public_key, data_key).await?;
                    Ok::<_, Error>(remote.map(|signed| signed.entry.revision))
                },
                |current| async move {
                    let revision = next_revision(current)?;
                    let entry = RegistryEntry::from_digest(digest, data, revision)?;

                    match self.registry.publish(keypair, entry).await {
                        Ok(_) => {
                            debug!(
                                %public_key,
                                data_key = %digest.fmt_short(),
                                revision,
                                "entry written"
                            );
                            Ok((revision, Some(revision)))
                        }
                        Err(RegistryError::Conflict { revision, reason }) => {
                            warn!(
                                %public_key,
                                data_key = %digest.fmt_short(),
                                revision,
                                "write rejected, refreshing revision"
                            );
                            let remote_revision = self
                                .fetch_entry(&public_key, data_key)
                                .await?
                                .map(|signed| signed.entry.revision);
                            Err(Error::Conflict {
                                revision,
                                reason,
                                remote_revision,
                            })
                        }
                        Err(err) => Err(err.into()),
                    }
                },
            )
            .await
    }
}

/// Revision for the next write: 0 for a new entry, otherwise one more than
/// the latest known. Never wraps.
fn next_revision(current: Option<u64>) -> Result<u64> {
    match current {
        None => Ok(0),
        Some(revision) => revision
            .checked_add(1)
            .ok_or(Error::RevisionOverflow { revision }),
    }
}
