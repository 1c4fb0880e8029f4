//! Configuration management for the agent.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default upper bound for one connect attempt, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default minimum length accepted when creating the app password.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 4;

/// Which local-authentication policy the biometric evaluator is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthPolicySetting {
    /// Biometrics only (fingerprint, face).
    #[default]
    Biometrics,
    /// Biometrics, falling back to the device passcode inside the OS prompt.
    BiometricsOrPasscode,
}

/// Main agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Policy passed to the biometric evaluator.
    #[serde(default)]
    pub auth_policy: AuthPolicySetting,
    /// Minimum accepted length for a newly created password.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    /// Upper bound for a single session connect attempt.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Account addresses exposed by the local account directory.
    #[serde(default)]
    pub accounts: Vec<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_min_password_length() -> usize {
    DEFAULT_MIN_PASSWORD_LENGTH
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            auth_policy: AuthPolicySetting::default(),
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            accounts: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) -> CoreResult<()> {
        if let Ok(log_level) = std::env::var("SIGNER_AGENT_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(raw) = std::env::var("SIGNER_AGENT_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!(
                    "SIGNER_AGENT_CONNECT_TIMEOUT_SECS is not a number: {}",
                    raw
                ))
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> CoreResult<()> {
        if self.connect_timeout_secs == 0 {
            return Err(CoreError::Config(
                "connect_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.min_password_length == 0 {
            return Err(CoreError::Config(
                "min_password_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
