//! Recognising links inside user input.
//!
//! Accepted shapes:
//!
//! ```text
//! <link>[/path][?query][#fragment]
//! sia:<link>[...]
//! sia://<link>[...]
//! https://portal.example/<link>[...]
//! https://<base32 link>.portal.example[/path]
//! ```

use url::Url;

use data_encoding::BASE64URL_NOPAD;

use super::{Encoding, Link, LinkError, decode_base32};

/// URI scheme accepted in front of a link.
pub const URI_SCHEME: &str = "sia";

/// Which part of a parsed link [`parse_as`] returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PathMode {
    /// The canonical link string only.
    #[default]
    LinkOnly,
    /// Canonical link string followed by the path, query and fragment.
    IncludePath,
    /// Path, query and fragment only.
    OnlyPath,
}

/// A link found in user input, together with whatever followed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLink {
    pub link: Link,
    /// Path including its leading `/`, plus query and fragment. Empty when
    /// nothing followed the link.
    pub path: String,
}

impl ParsedLink {
    pub fn select(&self, mode: PathMode) -> String {
        match mode {
            PathMode::LinkOnly => self.link.to_base64(),
            PathMode::IncludePath => format!("{}{}", self.link.to_base64(), self.path),
            PathMode::OnlyPath => self.path.clone(),
        }
    }
}

/// Finds a link in `input`.
///
/// `Ok(None)` means the input does not look like a link at all. An error is
/// only returned for input that has the shape of a link but does not decode
/// to a valid one.
pub fn parse(input: &str) -> Result<Option<ParsedLink>, LinkError> {
    let input = strip_scheme(input.trim());

    if input.starts_with("https://") || input.starts_with("http://") {
        return match Url::parse(input) {
            Ok(url) => parse_portal_url(&url),
            Err(_) => Ok(None),
        };
    }

    let split = input.find(['/', '?', '#']).unwrap_or(input.len());
    let (candidate, path) = input.split_at(split);
    Ok(decode_candidate(candidate)?.map(|link| ParsedLink {
        link,
        path: path.to_owned(),
    }))
}

/// [`parse`] followed by [`ParsedLink::select`].
pub fn parse_as(input: &str, mode: PathMode) -> Result<Option<String>, LinkError> {
    Ok(parse(input)?.map(|parsed| parsed.select(mode)))
}

fn strip_scheme(input: &str) -> &str {
    let Some(rest) = input
        .get(..URI_SCHEME.len())
        .filter(|scheme| scheme.eq_ignore_ascii_case(URI_SCHEME))
        .map(|_| &input[URI_SCHEME.len()..])
    else {
        return input;
    };
    if let Some(rest) = rest.strip_prefix("://") {
        rest
    } else if let Some(rest) = rest.strip_prefix(':') {
        rest
    } else {
        input
    }
}

fn parse_portal_url(url: &Url) -> Result<Option<ParsedLink>, LinkError> {
    let suffix = query_and_fragment(url);

    let subdomain = url
        .host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| Encoding::detect(label) == Some(Encoding::Base32));
    if let Some(label) = subdomain {
        let path = match url.path() {
            "/" => String::new(),
            path => path.to_owned(),
        };
        return Ok(decode_candidate(label)?.map(|link| ParsedLink {
            link,
            path: path + &suffix,
        }));
    }

    let path = url.path().trim_start_matches('/');
    let split = path.find('/').unwrap_or(path.len());
    let (candidate, rest) = path.split_at(split);
    Ok(decode_candidate(candidate)?.map(|link| ParsedLink {
        link,
        path: format!("{rest}{suffix}"),
    }))
}

fn query_and_fragment(url: &Url) -> String {
    let mut out = String::new();
    if let Some(query) = url.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

fn decode_candidate(candidate: &str) -> Result<Option<Link>, LinkError> {
    let bytes = match Encoding::detect(candidate) {
        Some(Encoding::Base64) => BASE64URL_NOPAD.decode(candidate.as_bytes())?,
        Some(Encoding::Base32) => decode_base32(candidate)?,
        None => return Ok(None),
    };
    Link::from_bytes(&bytes).map(Some)
}
