#![allow(dead_code)]

use std::time::Duration;

use jobdispatch::config::{ConfigFile, DispatchSettings, RawConfigFile};
use jobdispatch::types::ResizingStrategy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn condition_poll_interval(mut self, interval: &str) -> Self {
        self.config.dispatch.condition_poll_interval = interval.to_string();
        self
    }

    pub fn executor_workers(mut self, min: usize, max: usize) -> Self {
        self.config.executor.min_workers = min;
        self.config.executor.max_workers = max;
        self
    }

    pub fn executor_queue(mut self, max_queued_jobs: usize) -> Self {
        self.config.executor.max_queued_jobs = max_queued_jobs;
        self
    }

    pub fn resizing_strategy(mut self, strategy: ResizingStrategy) -> Self {
        self.config.executor.resizing_strategy = strategy;
        self
    }

    pub fn producer_queue(mut self, max_queued_jobs: usize) -> Self {
        self.config.producer.max_queued_jobs = max_queued_jobs;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch settings with the given conditional poll interval.
pub fn settings(condition_poll_interval: Duration) -> DispatchSettings {
    DispatchSettings {
        condition_poll_interval,
    }
}
