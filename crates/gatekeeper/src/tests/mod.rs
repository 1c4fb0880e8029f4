//! Scenario tests for the gatekeeper.
//!
//! - `harness.rs`        - recording surface, gated biometrics, scripted protocol
//! - `authentication.rs` - single completion per request, biometric/password race
//! - `lifecycle.rs`      - initial screen decisions, password creation, unlock
//! - `connection.rs`     - connect handshake, failure screen, timeout
//! - `approval.rs`       - approve/deny outcomes and window handling
//! - `quit.rs`           - status menu, quit confirmation, window close, shutdown

pub(crate) mod harness;
