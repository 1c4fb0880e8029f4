//! Storage key constants.

/// Storage keys used by the agent
pub struct StorageKeys;

impl StorageKeys {
    /// Password verifier record (JSON)
    pub const PASSWORD_VERIFIER: &'static str = "password_verifier";
}
