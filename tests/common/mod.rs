#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

pub use jobdispatch_test_utils::builders::settings;
pub use jobdispatch_test_utils::jobs::*;
pub use jobdispatch_test_utils::recording_pool::RecordingPool;
pub use jobdispatch_test_utils::{init_tracing, with_timeout};

use jobdispatch::{Basic, JobManager};

pub type RecordingManager = JobManager<RecordingPool, RecordingPool>;

/// Build a manager over two recording pools, returning handles to both pools.
pub fn recording_manager(
    jobs: Vec<Arc<dyn Basic>>,
    condition_poll_interval: Duration,
) -> (RecordingManager, RecordingPool, RecordingPool) {
    let producers = RecordingPool::new("job-producer");
    let executors = RecordingPool::new("test-executor");
    let manager = JobManager::with_pools(
        "test",
        jobs,
        producers.clone(),
        executors.clone(),
        settings(condition_poll_interval),
    );
    (manager, producers, executors)
}
