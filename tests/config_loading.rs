// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use jobdispatch::config::{ConfigFile, load_and_validate, load_from_path, parse_duration};
use jobdispatch::errors::DispatchError;
use jobdispatch::types::{LogLevel, ResizingStrategy};
use jobdispatch_test_utils::builders::ConfigFileBuilder;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_loaded() {
    let file = config_file(
        r#"
[dispatch]
condition_poll_interval = "250ms"

[executor]
min_workers = 2
max_workers = 16
max_queued_jobs = 64
resizing_strategy = "eager"

[producer]
max_queued_jobs = 32

[logging]
level = "debug"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.dispatch.condition_poll_interval, Duration::from_millis(250));
    assert_eq!(cfg.executor.min_workers, 2);
    assert_eq!(cfg.executor.max_workers, 16);
    assert_eq!(cfg.executor.max_queued_jobs, 64);
    assert_eq!(cfg.executor.resizing_strategy, ResizingStrategy::Eager);
    assert_eq!(cfg.producer.max_queued_jobs, 32);
    assert_eq!(cfg.logging.level, Some(LogLevel::Debug));
}

#[test]
fn test_empty_file_yields_defaults() {
    let file = config_file("");

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg, ConfigFile::default());
    assert_eq!(cfg.dispatch.condition_poll_interval, Duration::from_millis(50));
    assert_eq!(cfg.executor.max_workers, 8);
    assert_eq!(cfg.executor.max_queued_jobs, 1000);
    assert_eq!(cfg.logging.level, None);
}

#[test]
fn test_pool_configs_are_derived_from_sections() {
    let cfg = ConfigFileBuilder::new()
        .executor_workers(2, 4)
        .executor_queue(10)
        .producer_queue(5)
        .resizing_strategy(ResizingStrategy::Lazy)
        .build();

    let exec = cfg.executor_pool("indexer");
    assert_eq!(exec.name, "indexer");
    assert_eq!((exec.min_workers, exec.max_workers), (2, 4));
    assert_eq!(exec.max_queued_jobs, 10);
    assert_eq!(exec.resizing_strategy, ResizingStrategy::Lazy);

    let prod = cfg.producer_pool(7);
    assert_eq!(prod.name, "job-producer");
    assert_eq!((prod.min_workers, prod.max_workers), (7, 7));
    assert_eq!(prod.max_queued_jobs, 5);
}

#[test]
fn test_min_workers_above_max_is_rejected() {
    let file = config_file(
        r#"
[executor]
min_workers = 5
max_workers = 2
"#,
    );

    match load_and_validate(file.path()) {
        Err(DispatchError::ConfigError(msg)) => {
            assert!(msg.contains("min_workers (5) must not exceed max_workers (2)"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_zero_sizes_are_rejected() {
    for raw in [
        ConfigFileBuilder::new().executor_workers(0, 0).raw(),
        ConfigFileBuilder::new().executor_workers(0, 4).raw(),
        ConfigFileBuilder::new().executor_queue(0).raw(),
        ConfigFileBuilder::new().producer_queue(0).raw(),
    ] {
        let result = ConfigFile::try_from(raw);
        assert!(
            matches!(result, Err(DispatchError::ConfigError(_))),
            "expected ConfigError, got {:?}",
            result
        );
    }
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let raw = ConfigFileBuilder::new().condition_poll_interval("0ms").raw();

    match ConfigFile::try_from(raw) {
        Err(DispatchError::ConfigError(msg)) => assert!(msg.contains("greater than zero")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_bad_duration_unit_is_rejected() {
    let raw = ConfigFileBuilder::new().condition_poll_interval("5 fortnights").raw();

    match ConfigFile::try_from(raw) {
        Err(DispatchError::ConfigError(msg)) => {
            assert!(msg.contains("condition_poll_interval"));
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_overflowing_poll_interval_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .condition_poll_interval("18446744073709551615h")
        .raw();

    match ConfigFile::try_from(raw) {
        Err(DispatchError::ConfigError(msg)) => assert!(msg.contains("too large")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_unknown_strategy_is_a_toml_error() {
    let file = config_file(
        r#"
[executor]
resizing_strategy = "greedy"
"#,
    );

    assert!(matches!(
        load_from_path(file.path()),
        Err(DispatchError::TomlError(_))
    ));
}

#[test]
fn test_unknown_key_is_a_toml_error() {
    let file = config_file(
        r#"
[executor]
max_wrokers = 4
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DispatchError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    assert!(matches!(
        load_and_validate(&path),
        Err(DispatchError::IoError(_))
    ));
}

#[test]
fn test_parse_duration_units() {
    assert_eq!(parse_duration("50ms").unwrap(), Duration::from_millis(50));
    assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
    assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("ms").is_err());
    assert!(parse_duration("10d").is_err());
    assert!(parse_duration("18446744073709551615m").is_err());
    assert_eq!(
        parse_duration("18446744073709551615s").unwrap(),
        Duration::from_secs(u64::MAX)
    );
}
