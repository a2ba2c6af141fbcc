use serde::{Deserialize, Serialize};
use skydb_core::ContentLink;

use crate::error::{Error, Result};

/// Default ceiling for a stored JSON document: 16 MiB.
pub const DEFAULT_MAX_DOCUMENT_SIZE: u64 = 16 << 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SkyDbConfig {
    /// Wrap stored documents as `{"_data": <doc>, "_v": 2}`.
    pub envelope: bool,
    /// Check downloaded blobs against the digest in their content link.
    pub verify_content: bool,
    pub max_document_size: u64,
}

impl Default for SkyDbConfig {
    fn default() -> Self {
        Self {
            envelope: true,
            verify_content: true,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

impl SkyDbConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_document_size == 0 {
            return Err(Error::Config("max_document_size must be positive".into()));
        }
        Ok(())
    }
}

/// Per-call options for [`crate::SkyDb::get_json_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetJsonOptions {
    /// Link of a document the caller already holds. When the entry still
    /// points at it, the download is skipped and `data` is `None`.
    pub cached_data_link: Option<ContentLink>,
}
