//! Orchestration core of the signer agent.
//!
//! This crate provides:
//! - Unlock decisions racing biometric evaluation against password entry,
//!   with a single completion per request
//! - An explicit FSM for the per-run unlock state
//! - Session link detection from clipboard-like sources and inbound links
//! - Account selection, session connect and approve/deny flows
//! - A single-threaded event loop (`Agent`) that owns all of the above

mod adapters;
mod agent;
mod approval_flow;
mod auth_coordinator;
mod connection_flow;
mod error;
mod latch;
mod lifecycle;
mod pairing;
mod ports;
mod screen;
mod session_link;
mod state;
mod types;
mod unlock_fsm;

#[cfg(test)]
mod tests;

pub use adapters::{MemoryLinkSource, StaticAccountDirectory, UnavailableBiometrics};
pub use agent::{Agent, AgentDeps, AgentHandle, AgentOptions, Flow, Trigger, UserAction};
pub use approval_flow::ApprovalFlowController;
pub use auth_coordinator::{
    AuthenticationCoordinator, AuthenticationRequest, Settled, INCORRECT_PASSWORD,
};
pub use connection_flow::{ConnectionFlowController, CONNECT_FAILED_MESSAGE};
pub use error::{GateError, GateResult};
pub use latch::CompletionLatch;
pub use lifecycle::{decide_initial_screen, ScreenPlan, START_REASON};
pub use pairing::PairingUri;
pub use ports::{
    AccountDirectory, AuthPolicy, BiometricEvaluator, LinkSource, PresentationSurface,
    SecretStore, SessionProtocol,
};
pub use screen::Screen;
pub use session_link::SessionLinkDetector;
pub use state::AgentState;
pub use types::{Account, RequestId, Session};
pub use unlock_fsm::unlock_machine;
pub use unlock_fsm::{AppUnlockState, UnlockMachine, UnlockMachineInput, UnlockMachineState};
