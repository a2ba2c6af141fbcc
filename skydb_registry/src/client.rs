use std::{fmt, sync::Arc};

use bytes::Bytes;
use skydb_core::{
    DataKey, EntryError, EntryLink, Hash, Keypair, MAX_ENTRY_DATA_SIZE, PublicKey,
    RegistryEntry, RegistryTransport, Signature, SignedRegistryEntry, TransportError, TrustError,
    crypto::{self, SIGNATURE_SIZE},
    entry::check_data_size,
    transport::{PublishRequest, RegistryRecord},
};
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    /// A fetched record failed verification. Never retried, never skipped.
    #[error(transparent)]
    Trust(#[from] TrustError),

    /// The registry refused the revision as stale or duplicate.
    #[error("registry rejected revision {revision}: {reason}")]
    Conflict { revision: u64, reason: String },

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Transport(anyhow::Error),
}

impl From<TransportError> for RegistryError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected { revision, reason } => {
                RegistryError::Conflict { revision, reason }
            }
            TransportError::Other(err) => RegistryError::Transport(err),
        }
    }
}

/// Client for single registry entries.
///
/// Every entry returned by [`RegistryClient::get_entry`] has had its
/// signature checked against the public key it was requested for.
#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn RegistryTransport>,
}

impl fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryClient")
            .field("transport", &self.transport)
            .finish()
    }
}

impl RegistryClient {
    pub fn new<T: RegistryTransport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_arc(transport: Arc<dyn RegistryTransport>) -> Self {
        Self { transport }
    }

    /// Fetches and verifies the entry at `(public_key, data_key)`.
    ///
    /// `Ok(None)` means the registry has no entry. A record that does not
    /// verify is reported as [`RegistryError::Trust`].
    pub async fn get_entry(
        &self,
        public_key: &PublicKey,
        data_key: &DataKey,
    ) -> Result<Option<SignedRegistryEntry>, RegistryError> {
        let data_key = data_key.digest();
        let Some(record) = self.transport.lookup(public_key, &data_key).await? else {
            debug!(%public_key, data_key = %data_key.fmt_short(), "registry entry not found");
            return Ok(None);
        };

        let entry = verify_record(public_key, data_key, record).inspect_err(|err| {
            warn!(
                %public_key,
                data_key = %data_key.fmt_short(),
                "rejecting registry record: {err}"
            );
        })?;
        debug!(
            %public_key,
            data_key = %data_key.fmt_short(),
            revision = entry.entry.revision,
            "fetched registry entry"
        );
        Ok(Some(entry))
    }

    /// Publishes a signed entry.
    ///
    /// Data above [`MAX_ENTRY_DATA_SIZE`] is refused before the transport is
    /// touched.
    pub async fn set_entry(
        &self,
        public_key: &PublicKey,
        entry: &RegistryEntry,
        signature: &Signature,
    ) -> Result<(), RegistryError> {
        check_data_size(&entry.data)?;

        let request = PublishRequest {
            public_key: *public_key,
            data_key: entry.data_key,
            data: entry.data.clone(),
            revision: entry.revision,
            signature: Bytes::copy_from_slice(&signature.to_bytes()),
        };
        self.transport.publish(request).await?;
        debug!(
            %public_key,
            data_key = %entry.data_key.fmt_short(),
            revision = entry.revision,
            "published registry entry"
        );
        Ok(())
    }

    pub fn sign_entry(keypair: &Keypair, entry: &RegistryEntry) -> Signature {
        crypto::sign(keypair, &entry.digest())
    }

    /// Signs `entry` with `keypair` and publishes it.
    pub async fn publish(
        &self,
        keypair: &Keypair,
        entry: RegistryEntry,
    ) -> Result<SignedRegistryEntry, RegistryError> {
        let signature = Self::sign_entry(keypair, &entry);
        self.set_entry(&keypair.public_key(), &entry, &signature)
            .await?;
        Ok(SignedRegistryEntry { entry, signature })
    }

    /// The entry link for `(public_key, data_key)`. No network access.
    pub fn entry_link(public_key: &PublicKey, data_key: &DataKey) -> EntryLink {
        EntryLink::new(*public_key, data_key)
    }
}

/// Checks a raw registry record against the key it was fetched for.
pub fn verify_record(
    public_key: &PublicKey,
    data_key: Hash,
    record: RegistryRecord,
) -> Result<SignedRegistryEntry, TrustError> {
    let malformed = |reason: String| TrustError::MalformedRecord {
        public_key: *public_key,
        data_key,
        reason,
    };

    if record.data.len() > MAX_ENTRY_DATA_SIZE {
        return Err(malformed(format!(
            "data is {} bytes, max is {MAX_ENTRY_DATA_SIZE}",
            record.data.len()
        )));
    }
    let signature: [u8; SIGNATURE_SIZE] = record.signature.as_ref().try_into().map_err(|_| {
        malformed(format!(
            "signature is {} bytes, expected {SIGNATURE_SIZE}",
            record.signature.len()
        ))
    })?;
    let signature = Signature::from_bytes(&signature);

    let entry = RegistryEntry {
        data_key,
        data: record.data,
        revision: record.revision,
    };
    if !crypto::verify(public_key, &entry.digest(), &signature) {
        return Err(TrustError::InvalidSignature {
            public_key: *public_key,
            data_key,
        });
    }
    Ok(SignedRegistryEntry { entry, signature })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_record(keypair: &Keypair, data: &'static [u8], revision: u64) -> RegistryRecord {
        let entry =
            RegistryEntry::new(&DataKey::from("k"), Bytes::from_static(data), revision).unwrap();
        let signature = keypair.sign(&entry.digest());
        RegistryRecord {
            data: entry.data,
            revision,
            signature: Bytes::copy_from_slice(&signature.to_bytes()),
        }
    }

    fn digest(data_key: &str) -> Hash {
        DataKey::from(data_key).digest()
    }

    #[test]
    fn valid_record_verifies() {
        let keypair = Keypair::derive(b"verify");
        let record = signed_record(&keypair, b"data", 7);
        let entry = verify_record(&keypair.public_key(), digest("k"), record).unwrap();
        assert_eq!(entry.entry.revision, 7);
        assert_eq!(entry.entry.data.as_ref(), b"data");
    }

    #[test]
    fn record_for_other_key_fails() {
        let keypair = Keypair::derive(b"verify");
        let record = signed_record(&keypair, b"data", 7);
        let err = verify_record(&keypair.public_key(), digest("j"), record).unwrap_err();
        assert!(matches!(err, TrustError::InvalidSignature { .. }));
    }

    #[test]
    fn tampered_revision_fails() {
        let keypair = Keypair::derive(b"verify");
        let mut record = signed_record(&keypair, b"data", 7);
        record.revision = 8;
        let err = verify_record(&keypair.public_key(), digest("k"), record).unwrap_err();
        assert!(matches!(err, TrustError::InvalidSignature { .. }));
    }

    #[test]
    fn short_signature_is_malformed() {
        let keypair = Keypair::derive(b"verify");
        let mut record = signed_record(&keypair, b"data", 7);
        record.signature = record.signature.slice(..63);
        let err = verify_record(&keypair.public_key(), digest("k"), record).unwrap_err();
        assert!(matches!(err, TrustError::MalformedRecord { .. }));
    }

    #[test]
    fn oversize_data_is_malformed() {
        let keypair = Keypair::derive(b"verify");
        let mut record = signed_record(&keypair, b"data", 7);
        record.data = Bytes::from(vec![0u8; MAX_ENTRY_DATA_SIZE + 1]);
        let err = verify_record(&keypair.public_key(), digest("k"), record).unwrap_err();
        assert!(matches!(err, TrustError::MalformedRecord { .. }));
    }

    #[test]
    fn transport_rejection_maps_to_conflict() {
        let err = RegistryError::from(TransportError::Rejected {
            revision: 4,
            reason: "stale".into(),
        });
        assert!(matches!(err, RegistryError::Conflict { revision: 4, .. }));
    }
}
