// tests/manager_lifecycle.rs
mod common;
use crate::common::*;

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use jobdispatch::{Basic, DispatchError, JobContext, ManagerState};

type TestResult = Result<(), Box<dyn Error>>;

const POLL: Duration = Duration::from_millis(10);

#[tokio::test(start_paused = true)]
async fn start_submits_one_producer_per_job_for_a_mixed_set() -> TestResult {
    init_tracing();

    let cond = Arc::new(FakeJob::new("cond", CountingCondition::never()));
    let (sub_trigger, _sub_tx) = ChannelSubscription::new(4);
    let sub = Arc::new(FakeJob::new("sub", sub_trigger));
    let (eth_trigger, _eth_tx, _eth_handle) = FakeEthSubscription::new(4);
    let eth = Arc::new(FakeJob::new("eth", eth_trigger));
    let poll = Arc::new(FakeJob::new(
        "poll",
        AdjustableInterval::new(Duration::from_secs(60)),
    ));

    let jobs: Vec<Arc<dyn Basic>> = vec![cond.clone(), sub.clone(), eth.clone(), poll.clone()];
    let (manager, producers, executors) = recording_manager(jobs, POLL);

    let ctx = JobContext::new();
    manager.start(&ctx).await?;

    assert_eq!(producers.submitted(), 4);
    assert_eq!(executors.submitted(), 0);
    assert_eq!(manager.state(), ManagerState::Running);

    for probe in [cond.probe(), sub.probe(), eth.probe(), poll.probe()] {
        assert_eq!(probe.setups(), 1);
        assert_eq!(probe.teardowns(), 0);
    }

    manager.stop()?;
    Ok(())
}

#[tokio::test]
async fn start_with_no_jobs_submits_nothing() -> TestResult {
    init_tracing();

    let (manager, producers, _executors) = recording_manager(Vec::new(), POLL);
    manager.start(&JobContext::new()).await?;

    assert_eq!(producers.submitted(), 0);
    manager.stop()?;
    assert_eq!(manager.state(), ManagerState::Stopped);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_tears_down_each_job_once_in_list_order() -> TestResult {
    init_tracing();

    let log = event_log();
    let a = Arc::new(FakeJob::new("a", CountingCondition::never()).with_log(&log));
    let b = Arc::new(
        FakeJob::new("b", AdjustableInterval::new(Duration::from_secs(60))).with_log(&log),
    );
    let c = Arc::new(FakeJob::new("c", CountingCondition::never()).with_log(&log));

    let jobs: Vec<Arc<dyn Basic>> = vec![a.clone(), b.clone(), c.clone()];
    let (manager, _producers, _executors) = recording_manager(jobs, POLL);

    manager.start(&JobContext::new()).await?;
    manager.stop()?;
    manager.stop()?;

    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "setup:a",
            "setup:b",
            "setup:c",
            "teardown:a",
            "teardown:b",
            "teardown:c",
        ]
    );

    for probe in [a.probe(), b.probe(), c.probe()] {
        assert_eq!(probe.teardowns(), 1);
    }
    assert_eq!(manager.state(), ManagerState::Stopped);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stop_cancels_running_producers() -> TestResult {
    init_tracing();

    let poll = Arc::new(FakeJob::new(
        "poll",
        AdjustableInterval::new(Duration::from_millis(10)),
    ));
    let cond = Arc::new(FakeJob::new("cond", CountingCondition::never()));

    let jobs: Vec<Arc<dyn Basic>> = vec![poll.clone(), cond.clone()];
    let (manager, producers, executors) = recording_manager(jobs, POLL);

    let ctx = JobContext::new();
    manager.start(&ctx).await?;
    tokio::time::sleep(Duration::from_millis(35)).await;

    manager.stop()?;
    with_timeout(producers.wait_for_tasks()).await;

    let emitted = executors.payload_count();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(executors.payload_count(), emitted, "no payloads after stop");

    // The caller's context is untouched; only the manager's child was cancelled.
    assert!(!ctx.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn setup_failure_aborts_start_before_later_jobs() -> TestResult {
    init_tracing();

    let log = event_log();
    let first = Arc::new(FakeJob::new("first", CountingCondition::never()).with_log(&log));
    let bad = Arc::new(
        FakeJob::new("bad", CountingCondition::never())
            .with_log(&log)
            .failing_setup("rpc unreachable"),
    );
    let last = Arc::new(FakeJob::new("last", CountingCondition::never()).with_log(&log));

    let jobs: Vec<Arc<dyn Basic>> = vec![first.clone(), bad.clone(), last.clone()];
    let (manager, producers, _executors) = recording_manager(jobs, POLL);

    let result = manager.start(&JobContext::new()).await;

    match result {
        Err(DispatchError::Setup { job, source }) => {
            assert_eq!(job, "bad");
            assert!(source.to_string().contains("rpc unreachable"));
        }
        other => panic!("Expected Setup error, got: {:?}", other),
    }

    assert_eq!(producers.submitted(), 1);
    assert_eq!(last.probe().setups(), 0);
    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["setup:first", "setup:bad"]
    );

    // The producer submitted before the failure is cancelled.
    with_timeout(producers.wait_for_tasks()).await;
    Ok(())
}

#[tokio::test]
async fn stop_after_failed_start_tears_down_only_set_up_jobs() -> TestResult {
    init_tracing();

    let log = event_log();
    let first = Arc::new(FakeJob::new("first", CountingCondition::never()).with_log(&log));
    let bad = Arc::new(
        FakeJob::new("bad", CountingCondition::never())
            .with_log(&log)
            .failing_setup("rpc unreachable"),
    );
    let last = Arc::new(FakeJob::new("last", CountingCondition::never()).with_log(&log));

    let jobs: Vec<Arc<dyn Basic>> = vec![first.clone(), bad.clone(), last.clone()];
    let (manager, _producers, _executors) = recording_manager(jobs, POLL);

    assert!(manager.start(&JobContext::new()).await.is_err());
    manager.stop()?;

    assert_eq!(
        log.lock().unwrap().clone(),
        vec!["setup:first", "setup:bad", "teardown:first"]
    );
    assert_eq!(bad.probe().teardowns(), 0);
    assert_eq!(last.probe().teardowns(), 0);
    assert_eq!(manager.state(), ManagerState::Stopped);
    Ok(())
}

#[tokio::test]
async fn stop_without_start_tears_nothing_down() -> TestResult {
    init_tracing();

    let cond = Arc::new(FakeJob::new("cond", CountingCondition::never()));
    let jobs: Vec<Arc<dyn Basic>> = vec![cond.clone()];
    let (manager, _producers, _executors) = recording_manager(jobs, POLL);

    manager.stop()?;
    assert_eq!(cond.probe().teardowns(), 0);
    Ok(())
}

#[tokio::test]
async fn job_without_trigger_capability_is_fatal() -> TestResult {
    init_tracing();

    let mystery = Arc::new(FakeJob::new("mystery", NoTrigger));
    let jobs: Vec<Arc<dyn Basic>> = vec![mystery.clone()];
    let (manager, producers, _executors) = recording_manager(jobs, POLL);

    match manager.start(&JobContext::new()).await {
        Err(DispatchError::UnknownJobType(name)) => assert_eq!(name, "mystery"),
        other => panic!("Expected UnknownJobType, got: {:?}", other),
    }

    // Setup runs before classification, so the job is torn down on stop.
    assert_eq!(mystery.probe().setups(), 1);
    assert_eq!(producers.submitted(), 0);

    manager.stop()?;
    assert_eq!(mystery.probe().teardowns(), 1);
    Ok(())
}

#[tokio::test]
async fn teardown_failure_is_surfaced_immediately() -> TestResult {
    init_tracing();

    let a = Arc::new(FakeJob::new("a", CountingCondition::never()));
    let bad = Arc::new(FakeJob::new("bad", CountingCondition::never()).failing_teardown("leak"));
    let c = Arc::new(FakeJob::new("c", CountingCondition::never()));

    let jobs: Vec<Arc<dyn Basic>> = vec![a.clone(), bad.clone(), c.clone()];
    let (manager, _producers, _executors) = recording_manager(jobs, POLL);

    manager.start(&JobContext::new()).await?;

    match manager.stop() {
        Err(DispatchError::Teardown { job, .. }) => assert_eq!(job, "bad"),
        other => panic!("Expected Teardown error, got: {:?}", other),
    }

    assert_eq!(a.probe().teardowns(), 1);
    assert_eq!(bad.probe().teardowns(), 1);
    assert_eq!(c.probe().teardowns(), 0);
    Ok(())
}

#[tokio::test]
async fn starting_twice_is_rejected() -> TestResult {
    init_tracing();

    let cond = Arc::new(FakeJob::new("cond", CountingCondition::never()));
    let jobs: Vec<Arc<dyn Basic>> = vec![cond.clone()];
    let (manager, producers, _executors) = recording_manager(jobs, POLL);

    let ctx = JobContext::new();
    manager.start(&ctx).await?;

    assert!(matches!(
        manager.start(&ctx).await,
        Err(DispatchError::InvalidState(_))
    ));
    assert_eq!(cond.probe().setups(), 1);
    assert_eq!(producers.submitted(), 1);

    manager.stop()?;
    assert!(matches!(
        manager.start(&ctx).await,
        Err(DispatchError::InvalidState(_))
    ));
    Ok(())
}

#[tokio::test]
async fn closed_producer_pool_fails_start() -> TestResult {
    init_tracing();

    let cond = Arc::new(FakeJob::new("cond", CountingCondition::never()));
    let jobs: Vec<Arc<dyn Basic>> = vec![cond];
    let (manager, producers, _executors) = recording_manager(jobs, POLL);
    producers.close();

    match manager.start(&JobContext::new()).await {
        Err(DispatchError::Pool { job, source }) => {
            assert_eq!(job, "cond");
            assert!(matches!(*source, DispatchError::PoolClosed { .. }));
        }
        other => panic!("Expected Pool error, got: {:?}", other),
    }
    Ok(())
}
