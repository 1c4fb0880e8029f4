//! Session connect handshake for a chosen account.

use crate::agent::{AgentEvent, EventSender};
use crate::{Account, GateError, PresentationSurface, RequestId, Screen, Session, SessionProtocol};
use std::sync::Arc;
use std::time::Duration;

/// Message on the error screen after any failed connect.
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect";

/// Drives one connect attempt at a time. Failures are terminal for the
/// attempt; nothing is retried.
pub struct ConnectionFlowController {
    protocol: Arc<dyn SessionProtocol>,
    events: EventSender,
    timeout: Duration,
    in_flight: Option<RequestId>,
}

impl ConnectionFlowController {
    pub(crate) fn new(
        protocol: Arc<dyn SessionProtocol>,
        events: EventSender,
        timeout: Duration,
    ) -> Self {
        Self {
            protocol,
            events,
            timeout,
            in_flight: None,
        }
    }

    /// Show the waiting screen and start connecting `session` for `account`.
    /// The outcome comes back to the loop as a `ConnectFinished` event.
    pub fn connect(
        &mut self,
        session: Session,
        account: &Account,
        surface: &mut dyn PresentationSurface,
    ) -> RequestId {
        let id = RequestId::next();
        surface.show_new();
        surface.set_content(Screen::Connecting);

        tracing::info!(
            attempt = %id,
            topic = %session.topic(),
            address = %account.address,
            "Connecting session"
        );

        let protocol = Arc::clone(&self.protocol);
        let events = self.events.clone();
        let timeout = self.timeout;
        let address = account.address.clone();
        tokio::spawn(async move {
            let success =
                match tokio::time::timeout(timeout, protocol.connect(&session, &address)).await {
                    Ok(Ok(connected)) => connected,
                    Ok(Err(e)) => {
                        tracing::warn!(attempt = %id, error = %e, transient = e.is_transient(), "Session connect failed");
                        false
                    }
                    Err(_) => {
                        let e = GateError::Timeout;
                        tracing::warn!(attempt = %id, error = %e, timeout_secs = timeout.as_secs(), "Session connect failed");
                        false
                    }
                };
            let _ = events.send(AgentEvent::ConnectFinished {
                attempt: id,
                success,
            });
        });

        self.in_flight = Some(id);
        id
    }

    /// Show the outcome of `attempt`. Returns `false` for a stale result.
    pub(crate) fn finished(
        &mut self,
        attempt: RequestId,
        success: bool,
        surface: &mut dyn PresentationSurface,
    ) -> bool {
        if self.in_flight != Some(attempt) {
            tracing::debug!(attempt = %attempt, "Dropping stale connect result");
            return false;
        }
        self.in_flight = None;
        tracing::info!(attempt = %attempt, success, "Connect attempt finished");

        if success {
            surface.close_all_and_activate_caller();
        } else {
            surface.show_new();
            surface.set_content(Screen::error(CONNECT_FAILED_MESSAGE));
        }
        true
    }

    pub fn is_connecting(&self) -> bool {
        self.in_flight.is_some()
    }
}
