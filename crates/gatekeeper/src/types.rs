//! Value types shared by the flows.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one authentication request, approval, or connect attempt.
///
/// Async results carry the id they were started with so late arrivals for a
/// settled or superseded request can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub(crate) fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// A wallet identity offered to the connecting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Account {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// An external connection request, produced by parsing a link.
///
/// Immutable once created; only the session protocol looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    link: String,
    topic: String,
}

impl Session {
    pub fn new(link: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            topic: topic.into(),
        }
    }

    /// The link the session was parsed from.
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Pairing topic identifying the session on the relay.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_unique() {
        let a = RequestId::next();
        let b = RequestId::next();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("req-"));
    }

    #[test]
    fn account_label_is_optional_in_json() {
        let json = serde_json::to_string(&Account::new("0xabc")).unwrap();
        assert_eq!(json, r#"{"address":"0xabc"}"#);

        let labelled = Account::new("0xabc").with_label("Main");
        assert_eq!(labelled.label.as_deref(), Some("Main"));
    }
}
