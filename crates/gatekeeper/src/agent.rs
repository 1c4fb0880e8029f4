//! The agent event loop.
//!
//! `Agent` owns every piece of mutable process state and every flow
//! controller. Events are handled one at a time from an unbounded channel;
//! async work (biometric prompts, session connects) runs in spawned tasks
//! that post their result back into the same channel, so all state changes
//! happen on the loop. Authentication outcomes reach their owner (the
//! startup unlock or the pending approval) within the dispatch that settled
//! them, never through a second trip over the channel.

use crate::lifecycle::AccountSelection;
use crate::{
    decide_initial_screen, Account, AccountDirectory, AgentState, AppUnlockState,
    ApprovalFlowController, AuthPolicy, AuthenticationCoordinator, AuthenticationRequest,
    BiometricEvaluator, CompletionLatch, ConnectionFlowController, GateError, GateResult,
    LinkSource, PresentationSurface, RequestId, Screen, ScreenPlan, SecretStore, Session,
    SessionLinkDetector, SessionProtocol, Settled, UnlockMachineInput,
};
use agent_config_and_utils::{Config, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MIN_PASSWORD_LENGTH};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

pub(crate) type EventSender = mpsc::UnboundedSender<AgentEvent>;

const SAVE_FAILED: &str = "Could not save password";

/// Process entry points observed by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    AppStart,
    Reopen,
    StatusPrimaryClick,
    /// Opens the status menu.
    StatusSecondaryClick,
    InboundLink(String),
    /// Quit picked from the status menu. Asks for confirmation first.
    QuitSelected,
}

/// Input from the agent window.
#[derive(Clone, PartialEq, Eq)]
pub enum UserAction {
    CreatePassword(String),
    SubmitPassword(String),
    CancelUnlock,
    /// Account picked on the account list or import screen.
    SelectAccount(Account),
    Approve,
    Deny,
    ConfirmQuit,
    DismissQuit,
    /// The user closed the agent window.
    CloseWindow,
}

impl fmt::Debug for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAction::CreatePassword(_) => f.write_str("CreatePassword(..)"),
            UserAction::SubmitPassword(_) => f.write_str("SubmitPassword(..)"),
            UserAction::CancelUnlock => f.write_str("CancelUnlock"),
            UserAction::SelectAccount(account) => {
                f.debug_tuple("SelectAccount").field(account).finish()
            }
            UserAction::Approve => f.write_str("Approve"),
            UserAction::Deny => f.write_str("Deny"),
            UserAction::ConfirmQuit => f.write_str("ConfirmQuit"),
            UserAction::DismissQuit => f.write_str("DismissQuit"),
            UserAction::CloseWindow => f.write_str("CloseWindow"),
        }
    }
}

#[derive(Debug)]
pub(crate) enum AgentEvent {
    Trigger(Trigger),
    User(UserAction),
    ApprovalRequested {
        title: String,
        detail: String,
        completion: oneshot::Sender<bool>,
    },
    BiometricFinished {
        request: RequestId,
        success: bool,
    },
    ConnectFinished {
        attempt: RequestId,
        success: bool,
    },
    Shutdown,
}

/// Whether the loop keeps running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Collaborators the agent is built from.
pub struct AgentDeps {
    pub secrets: Arc<dyn SecretStore>,
    pub protocol: Arc<dyn SessionProtocol>,
    pub accounts: Arc<dyn AccountDirectory>,
    pub biometrics: Arc<dyn BiometricEvaluator>,
    pub link_source: Arc<dyn LinkSource>,
    pub surface: Box<dyn PresentationSurface>,
}

/// Tunables taken from the configuration.
#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub auth_policy: AuthPolicy,
    pub connect_timeout: Duration,
    pub min_password_length: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            auth_policy: AuthPolicy::default(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl From<&Config> for AgentOptions {
    fn from(config: &Config) -> Self {
        Self {
            auth_policy: config.auth_policy.into(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            min_password_length: config.min_password_length,
        }
    }
}

/// Cloneable entry point into a running agent.
#[derive(Clone)]
pub struct AgentHandle {
    tx: EventSender,
}

impl AgentHandle {
    pub fn trigger(&self, trigger: Trigger) -> GateResult<()> {
        self.send(AgentEvent::Trigger(trigger))
    }

    pub fn user(&self, action: UserAction) -> GateResult<()> {
        self.send(AgentEvent::User(action))
    }

    /// Ask the user to approve an action. The receiver yields the outcome
    /// once; a receive error means the agent went away and reads as denial.
    pub fn request_approval(
        &self,
        title: impl Into<String>,
        detail: impl Into<String>,
    ) -> GateResult<oneshot::Receiver<bool>> {
        let (completion, rx) = oneshot::channel();
        self.send(AgentEvent::ApprovalRequested {
            title: title.into(),
            detail: detail.into(),
            completion,
        })?;
        Ok(rx)
    }

    /// Settle everything pending with `false` and stop the loop.
    pub fn shutdown(&self) -> GateResult<()> {
        self.send(AgentEvent::Shutdown)
    }

    fn send(&self, event: AgentEvent) -> GateResult<()> {
        self.tx.send(event).map_err(|_| GateError::AgentStopped)
    }
}

pub struct Agent {
    state: AgentState,
    secrets: Arc<dyn SecretStore>,
    accounts: Arc<dyn AccountDirectory>,
    link_source: Arc<dyn LinkSource>,
    surface: Box<dyn PresentationSurface>,
    detector: SessionLinkDetector,
    auth: AuthenticationCoordinator,
    connection: ConnectionFlowController,
    approval: ApprovalFlowController,
    /// Session waiting for the user to get through unlock or a busy window.
    pending_session: Option<Session>,
    /// Request id of the unlock started on entry, while it is unresolved.
    unlock_request: Option<RequestId>,
    selection: Option<AccountSelection>,
    min_password_length: usize,
    tx: EventSender,
    rx: mpsc::UnboundedReceiver<AgentEvent>,
}

impl Agent {
    /// Build the agent, probing the secret store to seed the unlock state.
    pub fn new(deps: AgentDeps, options: AgentOptions) -> GateResult<Self> {
        let has_secret = deps.secrets.has_stored_secret()?;
        let state = AgentState::seeded(has_secret)?;
        let (tx, rx) = mpsc::unbounded_channel();

        tracing::info!(
            unlock_state = ?state.unlock_state(),
            auth_policy = ?options.auth_policy,
            connect_timeout_secs = options.connect_timeout.as_secs(),
            "Agent initialised"
        );

        Ok(Self {
            state,
            auth: AuthenticationCoordinator::new(
                deps.biometrics,
                Arc::clone(&deps.secrets),
                options.auth_policy,
                tx.clone(),
            ),
            connection: ConnectionFlowController::new(
                Arc::clone(&deps.protocol),
                tx.clone(),
                options.connect_timeout,
            ),
            detector: SessionLinkDetector::new(deps.protocol),
            approval: ApprovalFlowController::new(),
            secrets: deps.secrets,
            accounts: deps.accounts,
            link_source: deps.link_source,
            surface: deps.surface,
            pending_session: None,
            unlock_request: None,
            selection: None,
            min_password_length: options.min_password_length,
            tx,
            rx,
        })
    }

    pub fn handle(&self) -> AgentHandle {
        AgentHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn unlock_state(&self) -> AppUnlockState {
        self.state.unlock_state()
    }

    /// Process events until quit is confirmed or shutdown is requested.
    pub async fn run(mut self) {
        tracing::info!("Agent event loop started");
        while let Some(event) = self.rx.recv().await {
            if self.dispatch(event) == Flow::Exit {
                break;
            }
        }
        tracing::info!("Agent event loop stopped");
    }

    #[cfg(test)]
    pub(crate) async fn next_event(&mut self) -> Option<AgentEvent> {
        self.rx.recv().await
    }

    pub(crate) fn dispatch(&mut self, event: AgentEvent) -> Flow {
        match event {
            AgentEvent::Trigger(trigger) => self.on_trigger(trigger),
            AgentEvent::User(action) => return self.on_user_action(action),
            AgentEvent::ApprovalRequested {
                title,
                detail,
                completion,
            } => {
                if let Some(auth_id) = self.approval.abandon() {
                    self.auth.abandon_request(auth_id);
                }
                let latch = CompletionLatch::new(completion);
                if self.connection.is_connecting() {
                    self.approval.defer(title, detail, latch);
                } else {
                    self.approval
                        .show_approve(title, detail, latch, self.surface.as_mut());
                }
            }
            AgentEvent::BiometricFinished { request, success } => {
                let settled = self
                    .auth
                    .biometric_finished(request, success, self.surface.as_mut());
                self.on_auth_settled(settled);
            }
            AgentEvent::ConnectFinished { attempt, success } => {
                let handled = self
                    .connection
                    .finished(attempt, success, self.surface.as_mut());
                if handled && success && !self.approval.present_deferred(self.surface.as_mut()) {
                    self.resume_pending_session();
                }
            }
            AgentEvent::Shutdown => {
                tracing::info!("Shutdown requested");
                self.abandon_pending();
                self.surface.close_all();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    fn on_trigger(&mut self, trigger: Trigger) {
        let status_control = matches!(
            trigger,
            Trigger::StatusPrimaryClick | Trigger::StatusSecondaryClick | Trigger::QuitSelected
        );
        if status_control && self.state.is_status_control_blocked() {
            tracing::debug!(?trigger, "Status control blocked, ignoring trigger");
            return;
        }
        tracing::debug!(?trigger, "Handling trigger");

        match trigger {
            Trigger::AppStart | Trigger::Reopen | Trigger::StatusPrimaryClick => {
                let session = self.detector.detect(self.link_source.as_ref());
                self.enter(session);
            }
            Trigger::InboundLink(link) => {
                let session = self.detector.parse(&link);
                if session.is_none() {
                    tracing::info!("Inbound link not recognised, browsing");
                }
                self.enter(session);
            }
            Trigger::StatusSecondaryClick => self.surface.show_status_menu(),
            Trigger::QuitSelected => {
                self.state.set_status_control_blocked(true);
                self.surface.show_quit_confirmation();
            }
        }
    }

    fn on_user_action(&mut self, action: UserAction) -> Flow {
        tracing::debug!(?action, "Handling user action");
        match action {
            UserAction::CreatePassword(password) => self.create_password(&password),
            UserAction::SubmitPassword(password) => {
                let settled = self
                    .auth
                    .password_submitted(&password, self.surface.as_mut());
                self.on_auth_settled(settled);
            }
            UserAction::CancelUnlock => {
                let settled = self.auth.cancelled(self.surface.as_mut());
                self.on_auth_settled(settled);
            }
            UserAction::SelectAccount(account) => self.select_account(account),
            UserAction::Approve => {
                if self.approval.is_awaiting_decision() {
                    self.abandon_auth();
                    self.approval
                        .approved(&mut self.auth, self.surface.as_mut());
                }
            }
            UserAction::Deny => {
                if self.approval.denied(self.surface.as_mut()) {
                    self.resume_pending_session();
                }
            }
            UserAction::ConfirmQuit => {
                if !self.state.is_status_control_blocked() {
                    tracing::debug!("Quit confirmation without a pending quit, ignoring");
                    return Flow::Continue;
                }
                tracing::info!("Quit confirmed");
                self.abandon_pending();
                self.surface.close_all();
                return Flow::Exit;
            }
            UserAction::DismissQuit => self.state.set_status_control_blocked(false),
            UserAction::CloseWindow => {
                if !self.connection.is_connecting()
                    && self.approval.present_deferred(self.surface.as_mut())
                {
                    tracing::debug!("Window closed over a deferred approval");
                } else {
                    self.abandon_pending();
                }
            }
        }
        Flow::Continue
    }

    /// Common path for every trigger that wants the window.
    fn enter(&mut self, session: Option<Session>) {
        let busy = self.connection.is_connecting() || self.approval.is_pending();
        if let Some(session) = session {
            if let Some(previous) = self.pending_session.replace(session) {
                if self.pending_session.as_ref().map(Session::topic) != Some(previous.topic()) {
                    tracing::info!(
                        discarded_topic = %previous.topic(),
                        "Newer session replaces the queued one"
                    );
                }
            }
        }
        if busy {
            if !self.connection.is_connecting()
                && self.approval.present_deferred(self.surface.as_mut())
            {
                return;
            }
            tracing::debug!(
                has_pending_session = self.pending_session.is_some(),
                "Window busy, re-activating"
            );
            self.surface.show_new();
            self.surface.activate();
            return;
        }
        self.resolve_screen();
    }

    fn resume_pending_session(&mut self) {
        if self.pending_session.is_some() {
            self.resolve_screen();
        }
    }

    fn resolve_screen(&mut self) {
        if self.pending_session.is_none() {
            if let Some(AccountSelection::Connect(session)) = self.selection.take() {
                self.pending_session = Some(session);
            }
        }

        let plan = decide_initial_screen(
            self.state.unlock_state(),
            self.pending_session.as_ref(),
            self.accounts.as_ref(),
        );
        tracing::debug!(
            plan = plan.name(),
            unlock_state = ?self.state.unlock_state(),
            "Resolved screen plan"
        );

        match plan {
            ScreenPlan::CreatePassword => {
                let screen = self.create_password_screen(None);
                self.surface.show_new();
                self.surface.set_content(screen);
            }
            ScreenPlan::Unlock { reason } => self.start_unlock(reason),
            ScreenPlan::Accounts {
                accounts,
                connect_to,
            } => {
                let selecting = connect_to.is_some();
                self.present_selection(
                    connect_to,
                    Screen::Accounts {
                        accounts,
                        selecting,
                    },
                );
            }
            ScreenPlan::ImportAccount { connect_to } => {
                let selecting = connect_to.is_some();
                self.present_selection(connect_to, Screen::ImportAccount { selecting });
            }
        }
    }

    fn present_selection(&mut self, connect_to: Option<Session>, screen: Screen) {
        self.pending_session = None;
        self.selection = Some(AccountSelection::from_session(connect_to));
        self.surface.show_new();
        self.surface.set_content(screen);
    }

    fn start_unlock(&mut self, reason: String) {
        if let Some(id) = self.unlock_request {
            if self.auth.pending_request() == Some(id) {
                tracing::debug!(request_id = %id, "Unlock already pending, re-activating");
                self.surface.show_new();
                self.surface.activate();
                return;
            }
        }

        self.abandon_auth();
        let request = AuthenticationRequest::new(reason).force_password_screen();
        let id = self
            .auth
            .authenticate_on_loop(request, self.surface.as_mut());
        self.unlock_request = Some(id);
    }

    /// Hand a settled authentication to whoever started it.
    fn on_auth_settled(&mut self, settled: Option<Settled>) {
        let Some(Settled { request, outcome }) = settled else {
            return;
        };
        if self.unlock_request == Some(request) {
            self.on_unlock_resolved(request, outcome);
        } else if self
            .approval
            .authenticated(request, outcome, self.surface.as_mut())
        {
            self.resume_pending_session();
        } else {
            tracing::debug!(request_id = %request, "Settled request has no owner");
        }
    }

    /// Settle whatever authentication is pending with `false` and tell its
    /// owner.
    fn abandon_auth(&mut self) {
        if let Some(id) = self.auth.abandon() {
            self.on_auth_settled(Some(Settled {
                request: id,
                outcome: false,
            }));
        }
    }

    fn on_unlock_resolved(&mut self, id: RequestId, success: bool) {
        if self.unlock_request != Some(id) {
            tracing::debug!(request_id = %id, "Dropping stale unlock outcome");
            return;
        }
        self.unlock_request = None;

        if !success {
            tracing::info!(request_id = %id, "Unlock failed, staying locked");
            return;
        }
        match self.state.apply(UnlockMachineInput::Authenticated) {
            Ok(_) => self.enter(None),
            Err(e) => tracing::warn!(error = %e, "Unlock outcome did not apply"),
        }
    }

    fn create_password(&mut self, password: &str) {
        if self.state.unlock_state() != AppUnlockState::NoPasswordSet {
            tracing::debug!("Password already set, ignoring creation");
            return;
        }
        if password.chars().count() < self.min_password_length {
            let message = format!(
                "Password must be at least {} characters",
                self.min_password_length
            );
            let screen = self.create_password_screen(Some(message));
            self.surface.set_content(screen);
            return;
        }
        if let Err(e) = self.secrets.store_secret(password) {
            tracing::warn!(error = %e, "Failed to store app password");
            let screen = self.create_password_screen(Some(SAVE_FAILED.to_string()));
            self.surface.set_content(screen);
            return;
        }

        match self.state.apply(UnlockMachineInput::PasswordCreated) {
            Ok(_) => self.resolve_screen(),
            Err(e) => tracing::warn!(error = %e, "Password creation did not apply"),
        }
    }

    fn create_password_screen(&self, error: Option<String>) -> Screen {
        Screen::CreatePassword {
            min_length: self.min_password_length,
            error,
        }
    }

    fn select_account(&mut self, account: Account) {
        match self.selection.take() {
            Some(AccountSelection::Connect(session)) => {
                self.connection
                    .connect(session, &account, self.surface.as_mut());
            }
            Some(AccountSelection::Browse) => {
                tracing::info!(address = %account.address, "Account selected");
                self.selection = Some(AccountSelection::Browse);
            }
            None => tracing::debug!("No account screen shown, ignoring selection"),
        }
    }

    /// Resolve every pending completion with `false` and forget the account
    /// selection. The surface is left alone.
    fn abandon_pending(&mut self) {
        if let Some(auth_id) = self.approval.abandon() {
            self.auth.abandon_request(auth_id);
        }
        self.abandon_auth();
        self.selection = None;
    }
}
