//! Logging initialization for the agent.
//!
//! Structured JSONL goes to `<base>/logs/agent.jsonl`; a compact human
//! readable stream goes to stderr. `RUST_LOG` wins over the configured level.

use crate::{CoreError, CoreResult, Paths};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging system for the agent.
///
/// # Arguments
///
/// * `level` - Default log level (trace, debug, info, warn, error)
/// * `paths` - Agent paths; the log directory is created if missing
///
/// # Example
///
/// ```ignore
/// init_logging("info", &paths)?;
/// tracing::info!("Agent started");
/// ```
pub fn init_logging(level: &str, paths: &Paths) -> CoreResult<()> {
    paths.ensure_dirs()?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.log_file())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_level(level).as_str().to_ascii_lowercase()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(false)
        .with_target(true)
        .with_writer(Mutex::new(log_file));

    let stderr_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
