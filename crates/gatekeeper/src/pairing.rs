//! Pairing link parsing.
//!
//! Recognises `wc:<topic>@<version>?...` links, either bare or wrapped in an
//! app deep link such as `signer-agent://wc?uri=<percent-encoded wc link>`.

use crate::Session;
use url::Url;

const PAIRING_SCHEME: &str = "wc";

/// A parsed pairing link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingUri {
    /// The bare `wc:` link.
    pub link: String,
    pub topic: String,
    pub version: u32,
    pub relay_protocol: Option<String>,
    pub sym_key: String,
}

impl PairingUri {
    /// Parse a bare or deep-link-wrapped pairing link.
    ///
    /// Returns `None` for anything that is not a recognisable pairing link.
    pub fn parse(link: &str) -> Option<Self> {
        let trimmed = link.trim();
        let url = Url::parse(trimmed).ok()?;

        if url.scheme() == PAIRING_SCHEME {
            return Self::from_pairing_url(&url, trimmed);
        }

        let wraps_pairing = url.host_str() == Some(PAIRING_SCHEME)
            || url.path().trim_end_matches('/').ends_with("/wc");
        if !wraps_pairing {
            return None;
        }

        let inner = url
            .query_pairs()
            .find(|(key, _)| key == "uri")
            .map(|(_, value)| value.into_owned())?;
        let inner_url = Url::parse(inner.trim()).ok()?;
        if inner_url.scheme() != PAIRING_SCHEME {
            return None;
        }
        Self::from_pairing_url(&inner_url, inner.trim())
    }

    fn from_pairing_url(url: &Url, raw: &str) -> Option<Self> {
        let (topic, version) = url.path().split_once('@')?;
        if topic.is_empty()
            || !topic
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return None;
        }
        let version: u32 = version.parse().ok().filter(|v| *v >= 1)?;

        let mut relay_protocol = None;
        let mut sym_key = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "relay-protocol" => relay_protocol = Some(value.into_owned()),
                "symKey" | "key" => sym_key = Some(value.into_owned()),
                _ => {}
            }
        }
        let sym_key = sym_key.filter(|k| !k.is_empty())?;

        Some(Self {
            link: raw.to_string(),
            topic: topic.to_string(),
            version,
            relay_protocol,
            sym_key,
        })
    }
}

impl From<PairingUri> for Session {
    fn from(uri: PairingUri) -> Self {
        Session::new(uri.link, uri.topic)
    }
}
