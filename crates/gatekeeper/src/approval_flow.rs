//! Caller-initiated approve/deny decisions gated by authentication.

use crate::{
    AuthenticationCoordinator, AuthenticationRequest, CompletionLatch, PresentationSurface,
    RequestId, Screen,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accepted but not on screen yet.
    Deferred,
    AwaitingDecision,
    Authenticating(RequestId),
}

struct PendingApproval {
    id: RequestId,
    title: String,
    detail: String,
    latch: CompletionLatch<bool>,
    phase: Phase,
}

impl PendingApproval {
    fn present(&mut self, surface: &mut dyn PresentationSurface) {
        surface.show_new();
        surface.set_content(Screen::Approve {
            title: self.title.clone(),
            detail: self.detail.clone(),
        });
        self.phase = Phase::AwaitingDecision;
    }
}

/// Holds the single approval shown at a time.
#[derive(Default)]
pub struct ApprovalFlowController {
    pending: Option<PendingApproval>,
}

impl ApprovalFlowController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present an approve/deny screen. `completion` fires exactly once.
    ///
    /// Callers abandon any approval already pending first; one still found
    /// here is settled with `false`.
    pub fn show_approve(
        &mut self,
        title: impl Into<String>,
        detail: impl Into<String>,
        completion: CompletionLatch<bool>,
        surface: &mut dyn PresentationSurface,
    ) -> RequestId {
        let id = self.accept(title.into(), detail.into(), completion);
        if let Some(pending) = self.pending.as_mut() {
            pending.present(surface);
        }
        id
    }

    /// Accept an approval while the window is taken by something else.
    /// It stays off screen until [`present_deferred`](Self::present_deferred).
    pub fn defer(
        &mut self,
        title: impl Into<String>,
        detail: impl Into<String>,
        completion: CompletionLatch<bool>,
    ) -> RequestId {
        let id = self.accept(title.into(), detail.into(), completion);
        tracing::info!(approval = %id, "Approval deferred until the window is free");
        id
    }

    /// Bring a deferred approval on screen. Returns whether one was shown.
    pub fn present_deferred(&mut self, surface: &mut dyn PresentationSurface) -> bool {
        match self.pending.as_mut() {
            Some(pending) if pending.phase == Phase::Deferred => {
                tracing::info!(approval = %pending.id, "Presenting deferred approval");
                pending.present(surface);
                true
            }
            _ => false,
        }
    }

    /// Explicit denial. Never authenticates.
    pub fn denied(&mut self, surface: &mut dyn PresentationSurface) -> bool {
        if !self.is_awaiting_decision() {
            tracing::debug!("Deny ignored: no approval awaiting a decision");
            return false;
        }
        let Some(mut pending) = self.pending.take() else {
            return false;
        };

        surface.close_all_and_activate_caller();
        pending.latch.fire(false);
        tracing::info!(approval = %pending.id, outcome = false, "Approval denied");
        true
    }

    /// Explicit approval: authenticate with the title as reason. The result
    /// comes back through [`authenticated`](Self::authenticated).
    pub(crate) fn approved(
        &mut self,
        auth: &mut AuthenticationCoordinator,
        surface: &mut dyn PresentationSurface,
    ) -> bool {
        let Some(pending) = self
            .pending
            .as_mut()
            .filter(|p| p.phase == Phase::AwaitingDecision)
        else {
            tracing::debug!("Approve ignored: no approval awaiting a decision");
            return false;
        };

        let request = AuthenticationRequest::new(pending.title.clone());
        let auth_id = auth.authenticate_on_loop(request, surface);
        pending.phase = Phase::Authenticating(auth_id);
        tracing::info!(approval = %pending.id, request_id = %auth_id, "Approval authenticating");
        true
    }

    /// Forward the outcome of authentication request `auth_id` unchanged.
    /// Returns `false` when no approval is waiting on that request.
    pub(crate) fn authenticated(
        &mut self,
        auth_id: RequestId,
        success: bool,
        surface: &mut dyn PresentationSurface,
    ) -> bool {
        if !self.is_waiting_on(auth_id) {
            return false;
        }
        let Some(mut pending) = self.pending.take() else {
            return false;
        };

        surface.close_all_and_activate_caller();
        pending.latch.fire(success);
        tracing::info!(approval = %pending.id, outcome = success, "Approval settled");
        true
    }

    /// Settle the pending approval with `false` without touching the
    /// surface. Returns the authentication request it was waiting on, if
    /// any, so the caller can retire it too.
    pub fn abandon(&mut self) -> Option<RequestId> {
        let mut pending = self.pending.take()?;
        pending.latch.fire(false);
        tracing::info!(approval = %pending.id, "Abandoning pending approval");
        match pending.phase {
            Phase::Authenticating(auth_id) => Some(auth_id),
            Phase::Deferred | Phase::AwaitingDecision => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_awaiting_decision(&self) -> bool {
        self.phase() == Some(Phase::AwaitingDecision)
    }

    pub(crate) fn is_waiting_on(&self, auth_id: RequestId) -> bool {
        self.phase() == Some(Phase::Authenticating(auth_id))
    }

    fn accept(
        &mut self,
        title: String,
        detail: String,
        completion: CompletionLatch<bool>,
    ) -> RequestId {
        self.abandon();

        let id = RequestId::next();
        tracing::info!(approval = %id, title = %title, "Approval requested");
        self.pending = Some(PendingApproval {
            id,
            title,
            detail,
            latch: completion,
            phase: Phase::Deferred,
        });
        id
    }

    fn phase(&self) -> Option<Phase> {
        self.pending.as_ref().map(|p| p.phase)
    }
}
