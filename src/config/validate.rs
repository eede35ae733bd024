// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, DispatchSettings, RawConfigFile};
use crate::errors::{DispatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DispatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let dispatch = validate_dispatch(&raw)?;
        validate_executor(&raw)?;
        validate_producer(&raw)?;
        Ok(ConfigFile::new_unchecked(
            dispatch,
            raw.executor,
            raw.producer,
            raw.logging,
        ))
    }
}

fn validate_dispatch(cfg: &RawConfigFile) -> Result<DispatchSettings> {
    let raw = &cfg.dispatch.condition_poll_interval;
    let interval = parse_duration(raw).map_err(|e| {
        DispatchError::ConfigError(format!(
            "[dispatch].condition_poll_interval = {raw:?}: {e}"
        ))
    })?;

    if interval.is_zero() {
        return Err(DispatchError::ConfigError(
            "[dispatch].condition_poll_interval must be greater than zero".to_string(),
        ));
    }

    Ok(DispatchSettings {
        condition_poll_interval: interval,
    })
}

fn validate_executor(cfg: &RawConfigFile) -> Result<()> {
    let exec = &cfg.executor;

    if exec.max_workers == 0 {
        return Err(DispatchError::ConfigError(
            "[executor].max_workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if exec.min_workers == 0 {
        return Err(DispatchError::ConfigError(
            "[executor].min_workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if exec.min_workers > exec.max_workers {
        return Err(DispatchError::ConfigError(format!(
            "[executor].min_workers ({}) must not exceed max_workers ({})",
            exec.min_workers, exec.max_workers
        )));
    }

    if exec.max_queued_jobs == 0 {
        return Err(DispatchError::ConfigError(
            "[executor].max_queued_jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_producer(cfg: &RawConfigFile) -> Result<()> {
    if cfg.producer.max_queued_jobs == 0 {
        return Err(DispatchError::ConfigError(
            "[producer].max_queued_jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
