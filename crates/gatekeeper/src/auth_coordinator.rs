//! Unlock decisions: biometric evaluation raced against password entry.
//!
//! Whichever path produces a definitive result first settles the request,
//! the other path only does housekeeping. Settling fires the request's
//! [`CompletionLatch`] when it has one and is also reported to the caller on
//! the loop as a [`Settled`] value in the same call.
//! Biometric results are evaluated in a spawned task and come back through
//! the event loop tagged with the request id, so a late result for a settled
//! or superseded request is recognised and dropped.

use crate::agent::{AgentEvent, EventSender};
use crate::{
    AuthPolicy, BiometricEvaluator, CompletionLatch, PresentationSurface, RequestId, Screen,
    SecretStore,
};
use std::sync::Arc;

/// Error shown on the unlock screen after a wrong password.
pub const INCORRECT_PASSWORD: &str = "Incorrect password";

const VERIFY_FAILED: &str = "Could not verify password";

/// One unlock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    /// Human-readable reason, shown on the unlock screen and the biometric
    /// prompt.
    pub reason: String,
    /// Show the password screen even when biometrics are available.
    pub force_password_screen: bool,
    /// Screen to put back if the request fails.
    pub restore_to: Option<Screen>,
}

impl AuthenticationRequest {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            force_password_screen: false,
            restore_to: None,
        }
    }

    pub fn force_password_screen(mut self) -> Self {
        self.force_password_screen = true;
        self
    }

    pub fn restore_to(mut self, screen: Screen) -> Self {
        self.restore_to = Some(screen);
        self
    }
}

/// A request that just reached its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled {
    pub request: RequestId,
    pub outcome: bool,
}

struct InFlight {
    id: RequestId,
    reason: String,
    latch: Option<CompletionLatch<bool>>,
    password_screen_shown: bool,
    biometric_pending: bool,
    restore_to: Option<Screen>,
}

impl InFlight {
    fn password_screen(&self, error: Option<&str>) -> Screen {
        Screen::Unlock {
            reason: self.reason.clone(),
            interactive: !self.biometric_pending,
            error: error.map(str::to_string),
        }
    }
}

/// Runs at most one authentication request at a time.
pub struct AuthenticationCoordinator {
    evaluator: Arc<dyn BiometricEvaluator>,
    secrets: Arc<dyn SecretStore>,
    policy: AuthPolicy,
    events: EventSender,
    in_flight: Option<InFlight>,
}

impl AuthenticationCoordinator {
    pub(crate) fn new(
        evaluator: Arc<dyn BiometricEvaluator>,
        secrets: Arc<dyn SecretStore>,
        policy: AuthPolicy,
        events: EventSender,
    ) -> Self {
        Self {
            evaluator,
            secrets,
            policy,
            events,
            in_flight: None,
        }
    }

    /// Start an unlock attempt. `completion` fires exactly once.
    ///
    /// A request still pending is superseded and settles with `false`.
    pub fn authenticate(
        &mut self,
        request: AuthenticationRequest,
        completion: CompletionLatch<bool>,
        surface: &mut dyn PresentationSurface,
    ) -> RequestId {
        self.start(request, Some(completion), surface)
    }

    /// Start an attempt owned by the event loop. Its outcome is only reported
    /// through the [`Settled`] values returned by the input handlers, so the
    /// owner sees it before any later event is dispatched.
    ///
    /// The owner abandons any pending request first.
    pub(crate) fn authenticate_on_loop(
        &mut self,
        request: AuthenticationRequest,
        surface: &mut dyn PresentationSurface,
    ) -> RequestId {
        self.start(request, None, surface)
    }

    fn start(
        &mut self,
        request: AuthenticationRequest,
        completion: Option<CompletionLatch<bool>>,
        surface: &mut dyn PresentationSurface,
    ) -> RequestId {
        if let Some(previous) = self.in_flight.take() {
            tracing::info!(request_id = %previous.id, "Superseding pending authentication request");
            self.retire(previous);
        }

        let id = RequestId::next();
        let biometric_available = self.evaluator.can_evaluate(self.policy);
        let show_password_screen = !biometric_available || request.force_password_screen;

        let flight = InFlight {
            id,
            reason: request.reason,
            latch: completion,
            password_screen_shown: show_password_screen,
            biometric_pending: biometric_available,
            restore_to: request.restore_to,
        };

        if show_password_screen {
            surface.show_new();
            surface.set_content(flight.password_screen(None));
        }

        if biometric_available {
            let evaluator = Arc::clone(&self.evaluator);
            let events = self.events.clone();
            let policy = self.policy;
            let reason = flight.reason.clone();
            tokio::spawn(async move {
                let success = evaluator.evaluate(policy, &reason).await;
                let _ = events.send(AgentEvent::BiometricFinished {
                    request: id,
                    success,
                });
            });
        }

        tracing::info!(
            request_id = %id,
            reason = %flight.reason,
            biometric_available,
            show_password_screen,
            "Authentication started"
        );
        self.in_flight = Some(flight);
        id
    }

    /// Password entered on the unlock screen.
    pub fn password_submitted(
        &mut self,
        password: &str,
        surface: &mut dyn PresentationSurface,
    ) -> Option<Settled> {
        let Some(flight) = self.in_flight.as_ref() else {
            tracing::debug!("Password submitted with no pending request");
            return None;
        };
        if !flight.password_screen_shown || flight.biometric_pending {
            tracing::debug!(request_id = %flight.id, "Password input ignored while screen is not interactive");
            return None;
        }

        match self.secrets.verify_secret(password) {
            Ok(true) => self.settle(true, surface),
            Ok(false) => {
                tracing::info!(request_id = %flight.id, "Incorrect password entered");
                surface.set_content(flight.password_screen(Some(INCORRECT_PASSWORD)));
                None
            }
            Err(e) => {
                tracing::warn!(request_id = %flight.id, error = %e, "Password verification failed");
                surface.set_content(flight.password_screen(Some(VERIFY_FAILED)));
                None
            }
        }
    }

    /// User dismissed the unlock screen.
    pub fn cancelled(&mut self, surface: &mut dyn PresentationSurface) -> Option<Settled> {
        self.settle(false, surface)
    }

    pub(crate) fn biometric_finished(
        &mut self,
        id: RequestId,
        success: bool,
        surface: &mut dyn PresentationSurface,
    ) -> Option<Settled> {
        let Some(flight) = self.in_flight.as_mut().filter(|f| f.id == id) else {
            tracing::debug!(request_id = %id, success, "Dropping stale biometric result");
            return None;
        };
        flight.biometric_pending = false;
        tracing::info!(request_id = %id, success, "Biometric evaluation finished");

        if success {
            if flight.password_screen_shown {
                surface.set_content(flight.password_screen(None));
            }
            return self.settle(true, surface);
        }

        // Leave the password screen up so the request can still settle.
        if !flight.password_screen_shown {
            surface.show_new();
            flight.password_screen_shown = true;
        }
        surface.set_content(flight.password_screen(None));
        surface.activate();
        None
    }

    /// Settle the pending request without touching the surface.
    ///
    /// Used when whoever owns the window already closed it.
    pub fn abandon(&mut self) -> Option<RequestId> {
        let flight = self.in_flight.take()?;
        let id = flight.id;
        tracing::info!(request_id = %id, "Abandoning pending authentication request");
        self.retire(flight);
        Some(id)
    }

    /// Abandon only if `id` is still the pending request.
    pub fn abandon_request(&mut self, id: RequestId) -> bool {
        if self.pending_request() == Some(id) {
            self.abandon();
            true
        } else {
            false
        }
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.in_flight.as_ref().map(|f| f.id)
    }

    fn settle(&mut self, outcome: bool, surface: &mut dyn PresentationSurface) -> Option<Settled> {
        let mut flight = self.in_flight.take()?;
        if let Some(latch) = flight.latch.as_mut() {
            latch.fire(outcome);
        }

        if outcome || flight.biometric_pending {
            self.evaluator.invalidate();
        }
        if !outcome {
            match flight.restore_to.take() {
                Some(screen) => surface.set_content(screen),
                None if flight.password_screen_shown => surface.close_all(),
                None => {}
            }
        }

        tracing::info!(request_id = %flight.id, outcome, "Authentication settled");
        Some(Settled {
            request: flight.id,
            outcome,
        })
    }

    fn retire(&self, mut flight: InFlight) {
        if let Some(latch) = flight.latch.as_mut() {
            latch.fire(false);
        }
        if flight.biometric_pending {
            self.evaluator.invalidate();
        }
    }
}
