// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::pool::PoolConfig;
use crate::types::{LogLevel, ResizingStrategy};

/// Name of the producer pool. Only used for observability.
pub const PRODUCER_POOL_NAME: &str = "job-producer";

/// Default delay between two `condition` checks of a conditional job.
pub const DEFAULT_CONDITION_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Raw configuration as read from a TOML file.
///
/// ```toml
/// [dispatch]
/// condition_poll_interval = "50ms"
///
/// [executor]
/// min_workers = 1
/// max_workers = 8
/// max_queued_jobs = 1000
/// resizing_strategy = "balanced"
///
/// [producer]
/// max_queued_jobs = 1000
///
/// [logging]
/// level = "debug"
/// ```
///
/// All sections are optional. This type is not validated; convert it into a
/// [`ConfigFile`] with `ConfigFile::try_from`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub dispatch: RawDispatchSection,

    #[serde(default)]
    pub executor: ExecutorSection,

    #[serde(default)]
    pub producer: ProducerSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// `[dispatch]` section as written in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDispatchSection {
    /// Duration string between two checks of a conditional job.
    #[serde(default = "default_condition_poll_interval")]
    pub condition_poll_interval: String,
}

fn default_condition_poll_interval() -> String {
    "50ms".to_string()
}

impl Default for RawDispatchSection {
    fn default() -> Self {
        Self {
            condition_poll_interval: default_condition_poll_interval(),
        }
    }
}

/// `[executor]` section: sizing of the pool that runs payloads.
///
/// The pool's name is not configurable here; it is the manager's name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutorSection {
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Maximum number of payloads waiting for a free worker.
    #[serde(default = "default_max_queued_jobs")]
    pub max_queued_jobs: usize,

    #[serde(default)]
    pub resizing_strategy: ResizingStrategy,
}

fn default_min_workers() -> usize {
    1
}

fn default_max_workers() -> usize {
    8
}

fn default_max_queued_jobs() -> usize {
    1000
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            min_workers: default_min_workers(),
            max_workers: default_max_workers(),
            max_queued_jobs: default_max_queued_jobs(),
            resizing_strategy: ResizingStrategy::default(),
        }
    }
}

/// `[producer]` section.
///
/// Worker bounds are not configurable: the producer pool always gets exactly
/// one worker per registered job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProducerSection {
    #[serde(default = "default_max_queued_jobs")]
    pub max_queued_jobs: usize,
}

impl Default for ProducerSection {
    fn default() -> Self {
        Self {
            max_queued_jobs: default_max_queued_jobs(),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<LogLevel>,
}

/// Resolved `[dispatch]` settings used by the trigger adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub condition_poll_interval: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            condition_poll_interval: DEFAULT_CONDITION_POLL_INTERVAL,
        }
    }
}

/// Validated configuration.
///
/// Constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`ConfigFile::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub dispatch: DispatchSettings,
    pub executor: ExecutorSection,
    pub producer: ProducerSection,
    pub logging: LoggingSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        dispatch: DispatchSettings,
        executor: ExecutorSection,
        producer: ProducerSection,
        logging: LoggingSection,
    ) -> Self {
        Self {
            dispatch,
            executor,
            producer,
            logging,
        }
    }

    /// Pool configuration for the executor pool of a manager called `name`.
    pub fn executor_pool(&self, name: &str) -> PoolConfig {
        PoolConfig {
            name: name.to_string(),
            min_workers: self.executor.min_workers,
            max_workers: self.executor.max_workers,
            max_queued_jobs: self.executor.max_queued_jobs,
            resizing_strategy: self.executor.resizing_strategy,
        }
    }

    /// Pool configuration for the producer pool: one worker per job.
    pub fn producer_pool(&self, job_count: usize) -> PoolConfig {
        PoolConfig {
            name: PRODUCER_POOL_NAME.to_string(),
            min_workers: job_count,
            max_workers: job_count,
            max_queued_jobs: self.producer.max_queued_jobs,
            resizing_strategy: ResizingStrategy::Balanced,
        }
    }
}
