use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use jobdispatch::errors::{DispatchError, Result};
use jobdispatch::job::Payload;
use jobdispatch::pool::{ProducerTask, WorkerPool};

#[derive(Default)]
struct Inner {
    submitted: AtomicUsize,
    payloads: Mutex<Vec<Payload>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    full: AtomicBool,
    closed: AtomicBool,
}

/// A `WorkerPool` that:
/// - spawns every submitted task directly on the Tokio runtime and counts it
/// - records every payload instead of executing it
///
/// Clones share state, so a test can keep one clone while the manager owns
/// another.
#[derive(Clone)]
pub struct RecordingPool {
    name: String,
    inner: Arc<Inner>,
}

impl RecordingPool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inner: Arc::new(Inner::default()),
        }
    }

    /// Number of tasks received through `submit`.
    pub fn submitted(&self) -> usize {
        self.inner.submitted.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.inner.payloads.lock().unwrap().clone()
    }

    pub fn payload_count(&self) -> usize {
        self.inner.payloads.lock().unwrap().len()
    }

    pub fn payloads_for(&self, job: &str) -> Vec<Payload> {
        self.inner
            .payloads
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.job_name() == job)
            .cloned()
            .collect()
    }

    /// Trigger values of type `T` attached to `job`'s payloads, in order.
    pub fn values_for<T: Clone + 'static>(&self, job: &str) -> Vec<T> {
        self.payloads_for(job)
            .iter()
            .filter_map(|p| p.value_as::<T>().cloned())
            .collect()
    }

    /// Make `add_job` fail with `QueueFull` (true) or accept again (false).
    pub fn set_full(&self, full: bool) {
        self.inner.full.store(full, Ordering::SeqCst);
    }

    /// Make `add_job` fail with `PoolClosed`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    /// Whether every spawned task has finished.
    pub fn all_tasks_finished(&self) -> bool {
        self.inner
            .handles
            .lock()
            .unwrap()
            .iter()
            .all(|h| h.is_finished())
    }

    /// Poll until at least `n` payloads were recorded.
    pub async fn wait_for_payloads(&self, n: usize) {
        while self.payload_count() < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Poll until every spawned task has finished.
    pub async fn wait_for_tasks(&self) {
        while !self.all_tasks_finished() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

impl WorkerPool for RecordingPool {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, task: ProducerTask) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::PoolClosed {
                pool: self.name.clone(),
            });
        }
        self.inner.submitted.fetch_add(1, Ordering::SeqCst);
        let handle = tokio::spawn(task);
        self.inner.handles.lock().unwrap().push(handle);
        Ok(())
    }

    fn add_job(&self, payload: Payload) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(DispatchError::PoolClosed {
                pool: self.name.clone(),
            });
        }
        if self.inner.full.load(Ordering::SeqCst) {
            return Err(DispatchError::QueueFull {
                pool: self.name.clone(),
            });
        }
        self.inner.payloads.lock().unwrap().push(payload);
        Ok(())
    }
}
