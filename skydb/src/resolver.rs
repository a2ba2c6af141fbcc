use skydb_core::{ContentLink, DataKey, EntryLink, Link, LinkError, link};
use skydb_registry::RegistryClient;
use tracing::debug;

use crate::error::{Error, Result};

/// Turns entry links into the content links they currently point at.
///
/// Resolution is a single registry lookup. Entries pointing at another
/// entry link are rejected rather than followed.
#[derive(Debug, Clone)]
pub struct EntryLinkResolver {
    registry: RegistryClient,
}

impl EntryLinkResolver {
    pub fn new(registry: RegistryClient) -> Self {
        Self { registry }
    }

    pub async fn resolve(&self, entry_link: &EntryLink) -> Result<ContentLink> {
        let data_key = DataKey::Hashed(entry_link.data_key());
        let signed = self
            .registry
            .get_entry(&entry_link.public_key(), &data_key)
            .await?
            .filter(|signed| !signed.entry.is_deletion())
            .ok_or(Error::NotFound(*entry_link))?;

        match Link::from_bytes(&signed.entry.data)? {
            Link::Content(content_link) => {
                debug!(%entry_link, %content_link, "resolved entry link");
                Ok(content_link)
            }
            Link::Entry(_) => Err(LinkError::WrongVariant {
                expected: "a content",
            }
            .into()),
        }
    }

    /// Resolves a link given in any form [`link::parse`] accepts. Content
    /// links resolve to themselves.
    pub async fn resolve_str(&self, input: &str) -> Result<ContentLink> {
        let parsed =
            link::parse(input)?.ok_or_else(|| LinkError::NotALink(input.to_owned()))?;
        match parsed.link {
            Link::Content(content_link) => Ok(content_link),
            Link::Entry(entry_link) => self.resolve(&entry_link).await,
        }
    }
}
