//! Collaborator interfaces consumed by the orchestration core.
//!
//! Everything that touches hardware, storage, the network or a UI toolkit
//! sits behind one of these traits. The core only ever calls them from the
//! event loop; async operations are awaited inside spawned tasks.

use crate::{Account, GateResult, PairingUri, Screen, Session};
use agent_config_and_utils::AuthPolicySetting;
use async_trait::async_trait;

/// Local-authentication policy handed to the biometric evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPolicy {
    #[default]
    Biometrics,
    BiometricsOrPasscode,
}

impl From<AuthPolicySetting> for AuthPolicy {
    fn from(setting: AuthPolicySetting) -> Self {
        match setting {
            AuthPolicySetting::Biometrics => AuthPolicy::Biometrics,
            AuthPolicySetting::BiometricsOrPasscode => AuthPolicy::BiometricsOrPasscode,
        }
    }
}

/// Storage of the app password.
pub trait SecretStore: Send + Sync {
    /// Checked once at startup to seed the unlock state.
    fn has_stored_secret(&self) -> GateResult<bool>;

    fn store_secret(&self, secret: &str) -> GateResult<()>;

    /// `Ok(false)` for a wrong secret.
    fn verify_secret(&self, secret: &str) -> GateResult<bool>;
}

/// External session protocol. Wire details live entirely behind this trait.
#[async_trait]
pub trait SessionProtocol: Send + Sync {
    /// Parse a link into a session, `None` if it is not a recognised link.
    fn parse_link(&self, link: &str) -> Option<Session> {
        PairingUri::parse(link).map(Into::into)
    }

    /// Connect `session` on behalf of the account at `address`.
    async fn connect(&self, session: &Session, address: &str) -> GateResult<bool>;
}

/// Lists the wallet accounts. Every call re-enumerates.
pub trait AccountDirectory: Send + Sync {
    fn list_accounts(&self) -> Vec<Account>;
}

/// Hardware-backed local authentication.
#[async_trait]
pub trait BiometricEvaluator: Send + Sync {
    /// Whether `policy` can be evaluated right now. `false` is not an error.
    fn can_evaluate(&self, policy: AuthPolicy) -> bool;

    /// Prompt the user. Resolves `false` on mismatch, cancel or
    /// invalidation.
    async fn evaluate(&self, policy: AuthPolicy, reason: &str) -> bool;

    /// Retire the current evaluation context so no further prompt is shown.
    fn invalidate(&self);
}

/// A clipboard-like text source links can be detected from.
pub trait LinkSource: Send + Sync {
    fn read_text(&self) -> Option<String>;

    fn clear(&self);
}

/// Window and menu plumbing of whatever UI toolkit hosts the agent.
pub trait PresentationSurface: Send {
    /// Bring up the agent window, creating it if needed.
    fn show_new(&mut self);

    /// Replace what the window shows.
    fn set_content(&mut self, screen: Screen);

    /// Focus the agent window.
    fn activate(&mut self);

    fn close_all(&mut self);

    /// Close every agent window and hand focus back to the application
    /// that initiated the request.
    fn close_all_and_activate_caller(&mut self);

    /// Secondary status-control click.
    fn show_status_menu(&mut self);

    /// Modal quit confirmation. The answer comes back as a user action.
    fn show_quit_confirmation(&mut self);
}
