//! Session protocol adapter without a relay transport.

use async_trait::async_trait;
use gatekeeper::{GateError, GateResult, PairingUri, Session, SessionProtocol};
use std::time::Duration;

const HANDSHAKE_DELAY: Duration = Duration::from_millis(500);

/// Validates pairing links and simulates the relay handshake locally.
///
/// Only v2 pairing links connect; v1 bridge links are refused.
pub struct LoopbackProtocol {
    handshake_delay: Duration,
}

impl LoopbackProtocol {
    pub fn new() -> Self {
        Self {
            handshake_delay: HANDSHAKE_DELAY,
        }
    }

    #[cfg(test)]
    fn instant() -> Self {
        Self {
            handshake_delay: Duration::ZERO,
        }
    }
}

impl Default for LoopbackProtocol {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProtocol for LoopbackProtocol {
    async fn connect(&self, session: &Session, address: &str) -> GateResult<bool> {
        let uri = PairingUri::parse(session.link())
            .ok_or_else(|| GateError::Protocol("session link is not a pairing link".to_string()))?;

        tracing::info!(
            topic = %uri.topic,
            version = uri.version,
            relay_protocol = ?uri.relay_protocol,
            address = %address,
            "Simulating relay handshake"
        );
        tokio::time::sleep(self.handshake_delay).await;

        Ok(uri.version >= 2)
    }
}
