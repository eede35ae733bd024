// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Resizing policy tag carried by a pool configuration.
///
/// The bundled [`TaskPool`](crate::pool::TaskPool) runs a fixed number of
/// workers, so the tag is informational; it is logged with the pool so an
/// operator can see what was requested. When `min_workers == max_workers`
/// (as for the producer pool) it has no meaning at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizingStrategy {
    #[default]
    Balanced,
    Eager,
    Lazy,
}

impl FromStr for ResizingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "balanced" => Ok(ResizingStrategy::Balanced),
            "eager" => Ok(ResizingStrategy::Eager),
            "lazy" => Ok(ResizingStrategy::Lazy),
            other => Err(format!(
                "invalid resizing_strategy: {other} (expected \"balanced\", \"eager\" or \"lazy\")"
            )),
        }
    }
}

impl fmt::Display for ResizingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResizingStrategy::Balanced => "balanced",
            ResizingStrategy::Eager => "eager",
            ResizingStrategy::Lazy => "lazy",
        };
        f.write_str(s)
    }
}

/// Log level accepted in `[logging]` and by [`crate::logging::init_logging`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}
