//! Secret storage for the signer agent.
//!
//! This crate provides:
//! - **`SecureStorage`**: the key/value backend contract
//! - **`FileStorage`**: a JSON file backend with owner-only permissions
//! - **`MemoryStorage`**: a process-local backend for tests and ephemeral runs
//! - **`SecretsManager`**: the app password verifier on top of a backend

mod file;
mod keys;
mod memory;
mod secrets;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use secrets::{PasswordVerifier, SecretsManager, DEFAULT_PBKDF2_ROUNDS};
pub use traits::SecureStorage;

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Key not found
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a SecretsManager backed by the JSON file at `path`.
pub fn create_secrets_manager(path: &Path) -> StorageResult<SecretsManager> {
    let storage = FileStorage::open(path)?;
    Ok(SecretsManager::new(Box::new(storage)))
}
