//! Core types, configuration, and utilities for the signer agent.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    AuthPolicySetting, Config, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
    DEFAULT_MIN_PASSWORD_LENGTH,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
