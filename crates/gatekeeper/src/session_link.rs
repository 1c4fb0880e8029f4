//! Session detection from links.

use crate::{LinkSource, Session, SessionProtocol};
use std::sync::Arc;

/// Turns link text into sessions through the session protocol.
#[derive(Clone)]
pub struct SessionLinkDetector {
    protocol: Arc<dyn SessionProtocol>,
}

impl SessionLinkDetector {
    pub fn new(protocol: Arc<dyn SessionProtocol>) -> Self {
        Self { protocol }
    }

    /// Parse an explicitly delivered link.
    pub fn parse(&self, link: &str) -> Option<Session> {
        let link = link.trim();
        if link.is_empty() {
            return None;
        }
        self.protocol.parse_link(link)
    }

    /// Look for a link in `source`. A recognised link is cleared from the
    /// source before returning so no later trigger picks it up again;
    /// anything else is left alone.
    pub fn detect(&self, source: &dyn LinkSource) -> Option<Session> {
        let text = source.read_text()?;
        let session = self.parse(&text)?;
        source.clear();
        tracing::info!(topic = %session.topic(), "Session link detected on shared source");
        Some(session)
    }
}
