// src/logging.rs

//! Logging setup for `jobdispatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. explicit level passed by the embedding application (usually the
//!    `[logging] level` config key)
//! 2. `JOBDISPATCH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs are sent to STDERR.

use anyhow::{Result, anyhow};
use tracing_subscriber::fmt;

use crate::types::LogLevel;

/// Environment variable consulted when no explicit level is given.
pub const LOG_ENV_VAR: &str = "JOBDISPATCH_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup; a second call reports an error instead of
/// silently keeping the first subscriber.
pub fn init_logging(level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from an explicit setting and the env var value.
pub fn resolve_level(explicit: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    match explicit {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value
            .and_then(|s| s.parse::<LogLevel>().ok())
            .map(level_from_log_level)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}
