//! Test harness for gatekeeper scenario tests.
//!
//! Provides:
//! - RecordingSurface: records every presentation call in order
//! - GatedBiometrics: biometric evaluator whose results the test releases
//! - ScriptedProtocol: session protocol with queued connect outcomes
//! - TestAgent: an `Agent` wired to the above, pumped by the test

use crate::agent::AgentEvent;
use crate::{
    Agent, AgentDeps, AgentOptions, AuthPolicy, BiometricEvaluator, Flow, GateError, GateResult,
    MemoryLinkSource, PresentationSurface, Screen, SecretStore, Session, SessionProtocol,
    StaticAccountDirectory, Trigger, UserAction,
};
use agent_storage::{MemoryStorage, SecretsManager};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;

pub const PASSWORD: &str = "correct horse";
pub const LINK: &str = "wc:9c1d2f3e@2?relay-protocol=irn&symKey=a1b2c3d4";
pub const TOPIC: &str = "9c1d2f3e";
pub const OTHER_LINK: &str = "wc:77aa88bb@2?relay-protocol=irn&symKey=ffee0011";
pub const OTHER_TOPIC: &str = "77aa88bb";

/// Verifier work factor for test secret stores.
const TEST_PBKDF2_ROUNDS: u32 = 1_000;

/// How long the loop has to stay quiet before `settle` returns.
const QUIET: Duration = Duration::from_millis(50);

/// One call on the presentation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    ShowNew,
    SetContent(Screen),
    Activate,
    CloseAll,
    CloseAllAndActivateCaller,
    ShowStatusMenu,
    ShowQuitConfirmation,
}

/// Surface that records calls into a shared log.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    ops: Arc<Mutex<Vec<SurfaceOp>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub fn contains(&self, op: &SurfaceOp) -> bool {
        self.ops.lock().unwrap().contains(op)
    }

    pub fn count(&self, op: &SurfaceOp) -> usize {
        self.ops.lock().unwrap().iter().filter(|o| *o == op).count()
    }

    /// Content currently visible, `None` if nothing was shown yet or the
    /// window was closed after the last content change.
    pub fn current_screen(&self) -> Option<Screen> {
        let mut current = None;
        for op in self.ops.lock().unwrap().iter() {
            match op {
                SurfaceOp::SetContent(screen) => current = Some(screen.clone()),
                SurfaceOp::CloseAll | SurfaceOp::CloseAllAndActivateCaller => current = None,
                _ => {}
            }
        }
        current
    }

    /// Whether any window is closed after the last content change.
    pub fn closed(&self) -> bool {
        matches!(
            self.ops.lock().unwrap().last(),
            Some(SurfaceOp::CloseAll | SurfaceOp::CloseAllAndActivateCaller)
        )
    }

    fn push(&self, op: SurfaceOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl PresentationSurface for RecordingSurface {
    fn show_new(&mut self) {
        self.push(SurfaceOp::ShowNew);
    }

    fn set_content(&mut self, screen: Screen) {
        self.push(SurfaceOp::SetContent(screen));
    }

    fn activate(&mut self) {
        self.push(SurfaceOp::Activate);
    }

    fn close_all(&mut self) {
        self.push(SurfaceOp::CloseAll);
    }

    fn close_all_and_activate_caller(&mut self) {
        self.push(SurfaceOp::CloseAllAndActivateCaller);
    }

    fn show_status_menu(&mut self) {
        self.push(SurfaceOp::ShowStatusMenu);
    }

    fn show_quit_confirmation(&mut self) {
        self.push(SurfaceOp::ShowQuitConfirmation);
    }
}

/// Biometric evaluator driven by the test.
///
/// Each evaluation consumes the oldest armed gate and resolves with whatever
/// the test sends into it. With no gate armed the evaluation never resolves.
#[derive(Default)]
pub struct GatedBiometrics {
    available: AtomicBool,
    gates: Mutex<VecDeque<oneshot::Receiver<bool>>>,
    reasons: Mutex<Vec<String>>,
    evaluations: AtomicUsize,
    invalidations: AtomicUsize,
}

impl GatedBiometrics {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(available),
            ..Default::default()
        })
    }

    /// Arm the next evaluation. Send into the returned sender to resolve it.
    pub fn arm(&self) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().unwrap().clone()
    }
}

#[async_trait]
impl BiometricEvaluator for GatedBiometrics {
    fn can_evaluate(&self, _policy: AuthPolicy) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn evaluate(&self, _policy: AuthPolicy, reason: &str) -> bool {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        self.reasons.lock().unwrap().push(reason.to_string());
        let gate = self.gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx.await.unwrap_or(false),
            None => std::future::pending().await,
        }
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Outcome of one scripted connect call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    Refused,
    Failed,
    Hang,
}

/// Session protocol with queued connect outcomes. Defaults to `Connected`.
#[derive(Default)]
pub struct ScriptedProtocol {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedProtocol {
    pub fn queue(&self, outcome: ConnectOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// `(topic, address)` per connect call.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionProtocol for ScriptedProtocol {
    async fn connect(&self, session: &Session, address: &str) -> GateResult<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((session.topic().to_string(), address.to_string()));
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Connected);
        match outcome {
            ConnectOutcome::Connected => Ok(true),
            ConnectOutcome::Refused => Ok(false),
            ConnectOutcome::Failed => Err(GateError::Protocol("relay closed".to_string())),
            ConnectOutcome::Hang => std::future::pending().await,
        }
    }
}

/// Secret store whose every operation fails.
pub struct BrokenSecretStore {
    pub has_secret: bool,
}

impl SecretStore for BrokenSecretStore {
    fn has_stored_secret(&self) -> GateResult<bool> {
        Ok(self.has_secret)
    }

    fn store_secret(&self, _secret: &str) -> GateResult<()> {
        Err(agent_storage::StorageError::Backend("disk full".to_string()).into())
    }

    fn verify_secret(&self, _secret: &str) -> GateResult<bool> {
        Err(agent_storage::StorageError::Encoding("corrupt record".to_string()).into())
    }
}

/// Shared, in-memory secret store pre-loaded with [`PASSWORD`].
pub fn secrets_with_password() -> Arc<SecretsManager> {
    let secrets = SecretsManager::new(Box::new(MemoryStorage::new()))
        .with_pbkdf2_rounds(TEST_PBKDF2_ROUNDS);
    secrets.store_password(PASSWORD).unwrap();
    Arc::new(secrets)
}

pub fn empty_secrets() -> Arc<SecretsManager> {
    Arc::new(
        SecretsManager::new(Box::new(MemoryStorage::new())).with_pbkdf2_rounds(TEST_PBKDF2_ROUNDS),
    )
}

/// Builder for [`TestAgent`].
pub struct TestAgentBuilder {
    secrets: Arc<dyn SecretStore>,
    biometrics_available: bool,
    accounts: Vec<String>,
    options: AgentOptions,
}

impl TestAgentBuilder {
    /// A stored password exists.
    pub fn with_password(mut self) -> Self {
        self.secrets = secrets_with_password();
        self
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretStore>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_biometrics(mut self) -> Self {
        self.biometrics_available = true;
        self
    }

    pub fn with_accounts(mut self, addresses: &[&str]) -> Self {
        self.accounts = addresses.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    pub fn build(self) -> TestAgent {
        let surface = RecordingSurface::new();
        let biometrics = GatedBiometrics::new(self.biometrics_available);
        let protocol = Arc::new(ScriptedProtocol::default());
        let accounts = Arc::new(StaticAccountDirectory::from_addresses(self.accounts));
        let clipboard = Arc::new(MemoryLinkSource::new());

        let agent = Agent::new(
            AgentDeps {
                secrets: self.secrets,
                protocol: protocol.clone(),
                accounts: accounts.clone(),
                biometrics: biometrics.clone(),
                link_source: clipboard.clone(),
                surface: Box::new(surface.clone()),
            },
            self.options,
        )
        .unwrap();

        TestAgent {
            agent,
            surface,
            biometrics,
            protocol,
            accounts,
            clipboard,
        }
    }
}

/// An agent plus handles on every collaborator.
pub struct TestAgent {
    pub agent: Agent,
    pub surface: RecordingSurface,
    pub biometrics: Arc<GatedBiometrics>,
    pub protocol: Arc<ScriptedProtocol>,
    pub accounts: Arc<StaticAccountDirectory>,
    pub clipboard: Arc<MemoryLinkSource>,
}

impl TestAgent {
    pub fn builder() -> TestAgentBuilder {
        TestAgentBuilder {
            secrets: empty_secrets(),
            biometrics_available: false,
            accounts: Vec::new(),
            options: AgentOptions::default(),
        }
    }

    pub fn trigger(&mut self, trigger: Trigger) -> Flow {
        self.agent.dispatch(AgentEvent::Trigger(trigger))
    }

    pub fn user(&mut self, action: UserAction) -> Flow {
        self.agent.dispatch(AgentEvent::User(action))
    }

    pub fn request_approval(&mut self, title: &str, detail: &str) -> oneshot::Receiver<bool> {
        let (completion, rx) = oneshot::channel();
        self.agent.dispatch(AgentEvent::ApprovalRequested {
            title: title.to_string(),
            detail: detail.to_string(),
            completion,
        });
        rx
    }

    /// Dispatch queued events until the loop has been quiet for a moment.
    pub async fn settle(&mut self) -> Flow {
        self.settle_for(QUIET).await
    }

    pub async fn settle_for(&mut self, quiet: Duration) -> Flow {
        while let Ok(Some(event)) = timeout(quiet, self.agent.next_event()).await {
            if self.agent.dispatch(event) == Flow::Exit {
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Start the app and get through the startup unlock with the password.
    pub async fn start_and_unlock(&mut self) {
        self.trigger(Trigger::AppStart);
        self.settle().await;
        self.user(UserAction::SubmitPassword(PASSWORD.to_string()));
        self.settle().await;
    }
}
