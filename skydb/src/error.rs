use skydb_core::{EntryError, EntryLink, LinkError, TrustError};
use skydb_registry::RegistryError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned by [`crate::SkyDb`] and [`crate::EntryLinkResolver`].
///
/// Absence of an entry is not an error; reads return `None` for it.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Format(#[from] LinkError),

    #[error(transparent)]
    Trust(#[from] TrustError),

    /// The registry refused the write. `remote_revision` is the revision
    /// found when the cache was refreshed afterwards.
    #[error("registry rejected revision {revision}: {reason}")]
    Conflict {
        revision: u64,
        reason: String,
        remote_revision: Option<u64>,
    },

    #[error(transparent)]
    Transport(anyhow::Error),

    #[error("entry link {0} does not point at any content")]
    NotFound(EntryLink),

    #[error("revision {revision} is the highest representable revision")]
    RevisionOverflow { revision: u64 },

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error("entry data must not equal the deletion marker")]
    ReservedData,

    #[error("document is {size} bytes, max is {max}")]
    DocumentTooLarge { size: u64, max: u64 },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Blob(anyhow::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("write task did not complete: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Trust(err) => Error::Trust(err),
            RegistryError::Conflict { revision, reason } => Error::Conflict {
                revision,
                reason,
                remote_revision: None,
            },
            RegistryError::Entry(err) => Error::Entry(err),
            RegistryError::Transport(err) => Error::Transport(err),
            err => Error::Transport(anyhow::Error::new(err)),
        }
    }
}
