//! High-level API for managing the app password.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// HKDF info string of version 1 verifiers.
const LEGACY_VERIFIER_INFO: &[u8] = b"signer-agent-password-verifier-v1";
const LEGACY_VERSION: u32 = 1;
const PBKDF2_VERSION: u32 = 2;

/// PBKDF2-HMAC-SHA256 iterations for new verifiers.
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 600_000;

const SALT_LEN: usize = 16;
const VERIFIER_LEN: usize = 32;

/// Stored password verifier record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordVerifier {
    /// Record format version: 1 is HKDF-SHA256, 2 is PBKDF2-HMAC-SHA256
    pub version: u32,
    /// Random salt (base64)
    pub salt: String,
    /// Derived verifier (base64)
    pub verifier: String,
    /// PBKDF2 iterations, absent on version 1 records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
}

/// High-level API for storing and checking the app password
pub struct SecretsManager {
    storage: Box<dyn SecureStorage>,
    rounds: u32,
}

impl SecretsManager {
    /// Create a new secrets manager with the given storage backend
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self {
            storage,
            rounds: DEFAULT_PBKDF2_ROUNDS,
        }
    }

    /// Use `rounds` PBKDF2 iterations for verifiers stored from now on.
    /// Existing records keep the count they were written with.
    pub fn with_pbkdf2_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Whether an app password has been created.
    pub fn has_stored_secret(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::PASSWORD_VERIFIER)
    }

    /// Store a verifier for `password`, replacing any previous one.
    pub fn store_password(&self, password: &str) -> StorageResult<()> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let verifier = pbkdf2_verifier(&salt, password, self.rounds);
        let record = PasswordVerifier {
            version: PBKDF2_VERSION,
            salt: BASE64.encode(salt),
            verifier: BASE64.encode(verifier),
            rounds: Some(self.rounds),
        };
        self.write_record(&record)?;
        tracing::info!(rounds = self.rounds, "App password verifier stored");
        Ok(())
    }

    /// Check `password` against the stored verifier.
    ///
    /// Returns `Ok(false)` for a wrong password and `Err(NotFound)` when no
    /// password was ever created. A correct password checked against a
    /// version 1 record rewrites it as a PBKDF2 record.
    pub fn verify_password(&self, password: &str) -> StorageResult<bool> {
        let record = self.read_record()?;
        let salt = decode(&record.salt)?;
        let expected = decode(&record.verifier)?;

        let actual = match record.version {
            LEGACY_VERSION => legacy_verifier(&salt, password)?,
            PBKDF2_VERSION => match record.rounds {
                Some(rounds) if rounds > 0 => pbkdf2_verifier(&salt, password, rounds),
                _ => {
                    return Err(StorageError::Encoding(
                        "PBKDF2 verifier without a round count".to_string(),
                    ))
                }
            },
            other => {
                return Err(StorageError::Encoding(format!(
                    "unsupported password verifier version {}",
                    other
                )))
            }
        };

        let matches: bool = actual.as_slice().ct_eq(expected.as_slice()).into();
        if matches && record.version == LEGACY_VERSION {
            tracing::info!("Upgrading version 1 password verifier");
            self.store_password(password)?;
        }
        Ok(matches)
    }

    /// Remove the stored password verifier.
    pub fn clear_password(&self) -> StorageResult<bool> {
        self.storage.delete(StorageKeys::PASSWORD_VERIFIER)
    }

    fn read_record(&self) -> StorageResult<PasswordVerifier> {
        let json = self
            .storage
            .get(StorageKeys::PASSWORD_VERIFIER)?
            .ok_or_else(|| StorageError::NotFound(StorageKeys::PASSWORD_VERIFIER.to_string()))?;
        serde_json::from_str(&json).map_err(|e| StorageError::Encoding(e.to_string()))
    }

    fn write_record(&self, record: &PasswordVerifier) -> StorageResult<()> {
        let json =
            serde_json::to_string(record).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::PASSWORD_VERIFIER, &json)
    }
}

fn decode(value: &str) -> StorageResult<Vec<u8>> {
    BASE64
        .decode(value)
        .map_err(|e| StorageError::Encoding(e.to_string()))
}

fn pbkdf2_verifier(salt: &[u8], password: &str, rounds: u32) -> [u8; VERIFIER_LEN] {
    let mut out = [0u8; VERIFIER_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, rounds, &mut out);
    out
}

fn legacy_verifier(salt: &[u8], password: &str) -> StorageResult<[u8; VERIFIER_LEN]> {
    let hkdf = Hkdf::<Sha256>::new(Some(salt), password.as_bytes());
    let mut okm = [0u8; VERIFIER_LEN];
    hkdf.expand(LEGACY_VERIFIER_INFO, &mut okm)
        .map_err(|e| StorageError::Encoding(format!("HKDF expand failed: {:?}", e)))?;
    Ok(okm)
}
