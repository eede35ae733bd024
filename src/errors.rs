// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Job-facing traits return `anyhow::Result` so job authors can attach
//! context freely; the manager wraps those failures into [`DispatchError`]
//! variants that name the offending job.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("setup failed for job '{job}': {source:#}")]
    Setup {
        job: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("teardown failed for job '{job}': {source:#}")]
    Teardown {
        job: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unknown job type: '{0}' implements no trigger capability")]
    UnknownJobType(String),

    #[error("invalid manager state: {0}")]
    InvalidState(String),

    #[error("pool '{pool}' queue is full")]
    QueueFull { pool: String },

    #[error("pool '{pool}' is shut down")]
    PoolClosed { pool: String },

    #[error("submitting producer for job '{job}' failed: {source}")]
    Pool {
        job: String,
        #[source]
        source: Box<DispatchError>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DispatchError {
    /// Whether this error means the whole manager must stop.
    ///
    /// Queue overflow is the only error a producer shrugs off; everything
    /// else is either a misconfiguration or a pool that is gone.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DispatchError::QueueFull { .. })
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DispatchError>;
