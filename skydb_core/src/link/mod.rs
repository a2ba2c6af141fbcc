//! Binary link codec.
//!
//! Two link variants share one textual envelope and are told apart by the
//! version bits of a leading little-endian `u16` bitfield.
//!
//! ## Raw layouts
//!
//! | Variant | Field | Size (bytes) |
//! |---|---|---|
//! | Content | Bitfield (version bits `0b00`, metadata in the upper 14 bits) | 2 |
//! | Content | blake3 content digest | 32 |
//! | Entry | Bitfield (version bits `0b01`, all other bits zero) | 2 |
//! | Entry | Ed25519 public key | 32 |
//! | Entry | Data-key digest | 32 |
//!
//! ## Text encodings
//!
//! - canonical: base64url without padding (46 chars content, 88 chars entry)
//! - subdomain-safe: lowercase base32hex without padding (55 / 106 chars),
//!   accepted case-insensitively

mod parse;

pub use parse::{ParsedLink, PathMode, URI_SCHEME, parse, parse_as};

use std::{fmt, str::FromStr};

use data_encoding::{BASE32HEX_NOPAD, BASE64URL_NOPAD};

use crate::{
    Hash,
    crypto::{PUBLIC_KEY_SIZE, PublicKey},
    entry::DataKey,
};

/// Size of a raw content link.
pub const RAW_CONTENT_LINK_SIZE: usize = 2 + Hash::SIZE;

/// Size of a raw entry link.
pub const RAW_ENTRY_LINK_SIZE: usize = 2 + PUBLIC_KEY_SIZE + Hash::SIZE;

pub const BASE64_CONTENT_LINK_LEN: usize = 46;
pub const BASE64_ENTRY_LINK_LEN: usize = 88;
pub const BASE32_CONTENT_LINK_LEN: usize = 55;
pub const BASE32_ENTRY_LINK_LEN: usize = 106;

const VERSION_MASK: u16 = 0b11;
const CONTENT_LINK_VERSION_BITS: u16 = 0b00;
const ENTRY_LINK_VERSION_BITS: u16 = 0b01;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkError {
    #[error("invalid link encoding: {0}")]
    Encoding(#[from] data_encoding::DecodeError),

    #[error("invalid link length: {0} bytes")]
    InvalidLength(usize),

    #[error("unsupported link version {0}")]
    UnsupportedVersion(u8),

    #[error("link length {length} does not match version {version}")]
    VersionLengthMismatch { version: u8, length: usize },

    #[error("reserved bits set in entry link bitfield: {0:#06x}")]
    ReservedBits(u16),

    #[error("expected {expected} link")]
    WrongVariant { expected: &'static str },

    #[error("not a link: {0:?}")]
    NotALink(String),
}

/// Version number as written in docs and errors (bits `0b00` are version 1).
fn version_of(bitfield: u16) -> u8 {
    (bitfield & VERSION_MASK) as u8 + 1
}

/// Link to immutable content.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContentLink {
    bitfield: u16,
    hash: Hash,
}

impl ContentLink {
    /// Link to a whole blob with the given content digest.
    pub fn new(hash: Hash) -> Self {
        Self { bitfield: 0, hash }
    }

    /// Link with explicit metadata bits. The version bits must be `0b00`.
    pub fn with_bitfield(bitfield: u16, hash: Hash) -> Result<Self, LinkError> {
        if bitfield & VERSION_MASK != CONTENT_LINK_VERSION_BITS {
            return Err(LinkError::UnsupportedVersion(version_of(bitfield)));
        }
        Ok(Self { bitfield, hash })
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn bitfield(&self) -> u16 {
        self.bitfield
    }

    pub fn to_bytes(&self) -> [u8; RAW_CONTENT_LINK_SIZE] {
        let mut out = [0u8; RAW_CONTENT_LINK_SIZE];
        out[..2].copy_from_slice(&self.bitfield.to_le_bytes());
        out[2..].copy_from_slice(self.hash.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LinkError> {
        match Link::from_bytes(bytes)? {
            Link::Content(link) => Ok(link),
            Link::Entry(_) => Err(LinkError::WrongVariant {
                expected: "a content",
            }),
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64URL_NOPAD.encode(&self.to_bytes())
    }

    pub fn to_base32(&self) -> String {
        encode_base32(&self.to_bytes())
    }
}

impl fmt::Debug for ContentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentLink")
            .field("bitfield", &self.bitfield)
            .field("hash", &self.hash)
            .finish()
    }
}

impl fmt::Display for ContentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for ContentLink {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode(s)?)
    }
}

/// Link to a registry entry, a pure function of `(public key, data key)`.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryLink {
    public_key: PublicKey,
    data_key: Hash,
}

impl EntryLink {
    pub fn new(public_key: PublicKey, data_key: &DataKey) -> Self {
        Self {
            public_key,
            data_key: data_key.digest(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Digest of the data key.
    pub fn data_key(&self) -> Hash {
        self.data_key
    }

    pub fn to_bytes(&self) -> [u8; RAW_ENTRY_LINK_SIZE] {
        let mut out = [0u8; RAW_ENTRY_LINK_SIZE];
        out[..2].copy_from_slice(&ENTRY_LINK_VERSION_BITS.to_le_bytes());
        out[2..2 + PUBLIC_KEY_SIZE].copy_from_slice(self.public_key.as_bytes());
        out[2 + PUBLIC_KEY_SIZE..].copy_from_slice(self.data_key.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LinkError> {
        match Link::from_bytes(bytes)? {
            Link::Entry(link) => Ok(link),
            Link::Content(_) => Err(LinkError::WrongVariant {
                expected: "an entry",
            }),
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64URL_NOPAD.encode(&self.to_bytes())
    }

    pub fn to_base32(&self) -> String {
        encode_base32(&self.to_bytes())
    }
}

impl fmt::Debug for EntryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryLink")
            .field("public_key", &self.public_key)
            .field("data_key", &self.data_key)
            .finish()
    }
}

impl fmt::Display for EntryLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for EntryLink {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(&decode(s)?)
    }
}

/// Either link variant.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Link {
    Content(ContentLink),
    Entry(EntryLink),
}

impl Link {
    /// Decodes and validates a raw link payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LinkError> {
        if bytes.len() < 2 {
            return Err(LinkError::InvalidLength(bytes.len()));
        }
        let bitfield = u16::from_le_bytes([bytes[0], bytes[1]]);

        match (bitfield & VERSION_MASK, bytes.len()) {
            (CONTENT_LINK_VERSION_BITS, RAW_CONTENT_LINK_SIZE) => {
                let hash: [u8; 32] = bytes[2..]
                    .try_into()
                    .map_err(|_| LinkError::InvalidLength(bytes.len()))?;
                Ok(Link::Content(ContentLink {
                    bitfield,
                    hash: hash.into(),
                }))
            }
            (ENTRY_LINK_VERSION_BITS, RAW_ENTRY_LINK_SIZE) => {
                if bitfield != ENTRY_LINK_VERSION_BITS {
                    return Err(LinkError::ReservedBits(bitfield));
                }
                let public_key: [u8; PUBLIC_KEY_SIZE] = bytes[2..2 + PUBLIC_KEY_SIZE]
                    .try_into()
                    .map_err(|_| LinkError::InvalidLength(bytes.len()))?;
                let data_key: [u8; 32] = bytes[2 + PUBLIC_KEY_SIZE..]
                    .try_into()
                    .map_err(|_| LinkError::InvalidLength(bytes.len()))?;
                Ok(Link::Entry(EntryLink {
                    public_key: PublicKey::from_bytes(public_key),
                    data_key: data_key.into(),
                }))
            }
            (CONTENT_LINK_VERSION_BITS | ENTRY_LINK_VERSION_BITS, length) => {
                Err(LinkError::VersionLengthMismatch {
                    version: version_of(bitfield),
                    length,
                })
            }
            _ => Err(LinkError::UnsupportedVersion(version_of(bitfield))),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Link::Content(link) => link.to_bytes().to_vec(),
            Link::Entry(link) => link.to_bytes().to_vec(),
        }
    }

    pub fn to_base64(&self) -> String {
        match self {
            Link::Content(link) => link.to_base64(),
            Link::Entry(link) => link.to_base64(),
        }
    }

    pub fn to_base32(&self) -> String {
        match self {
            Link::Content(link) => link.to_base32(),
            Link::Entry(link) => link.to_base32(),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl FromStr for Link {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Link::from_bytes(&decode(s)?)
    }
}

impl From<ContentLink> for Link {
    fn from(value: ContentLink) -> Self {
        Link::Content(value)
    }
}

impl From<EntryLink> for Link {
    fn from(value: EntryLink) -> Self {
        Link::Entry(value)
    }
}

/// Canonical string form of a raw link payload.
pub fn format(bytes: &[u8]) -> Result<String, LinkError> {
    Ok(Link::from_bytes(bytes)?.to_base64())
}

/// Subdomain-safe string form of a raw link payload.
pub fn format_base32(bytes: &[u8]) -> Result<String, LinkError> {
    Ok(Link::from_bytes(bytes)?.to_base32())
}

/// Raw payload of a bare link string in either encoding, suitable for an
/// entry's `data` field.
pub fn decode(link: &str) -> Result<Vec<u8>, LinkError> {
    let bytes = match Encoding::detect(link) {
        Some(Encoding::Base64) => BASE64URL_NOPAD.decode(link.as_bytes())?,
        Some(Encoding::Base32) => decode_base32(link)?,
        None => return Err(LinkError::NotALink(link.to_owned())),
    };
    Link::from_bytes(&bytes)?;
    Ok(bytes)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Encoding {
    Base64,
    Base32,
}

impl Encoding {
    /// Classifies a candidate by length and alphabet.
    fn detect(candidate: &str) -> Option<Self> {
        let len = candidate.len();
        if (len == BASE64_CONTENT_LINK_LEN || len == BASE64_ENTRY_LINK_LEN)
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Some(Encoding::Base64);
        }
        if (len == BASE32_CONTENT_LINK_LEN || len == BASE32_ENTRY_LINK_LEN)
            && candidate
                .bytes()
                .all(|b| b.is_ascii_digit() || matches!(b.to_ascii_lowercase(), b'a'..=b'v'))
        {
            return Some(Encoding::Base32);
        }
        None
    }
}

fn encode_base32(bytes: &[u8]) -> String {
    BASE32HEX_NOPAD.encode(bytes).to_ascii_lowercase()
}

fn decode_base32(s: &str) -> Result<Vec<u8>, LinkError> {
    Ok(BASE32HEX_NOPAD.decode(s.to_ascii_uppercase().as_bytes())?)
}
