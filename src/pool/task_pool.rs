// src/pool/task_pool.rs

//! Fixed-size Tokio worker pool.
//!
//! `max_workers` workers share one bounded queue. A worker takes one unit of
//! work at a time and runs it to completion before taking the next, so a
//! long-lived producer task occupies its worker for its whole lifetime.
//! Each unit runs in its own Tokio task: a panicking job is logged and the
//! worker carries on.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::{DispatchError, Result};
use crate::job::Payload;

use super::{PoolConfig, ProducerTask, WorkerPool};

enum Work {
    Task(ProducerTask),
    Payload(Payload),
}

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Work>>>;

/// Production [`WorkerPool`].
///
/// Must be created from within a Tokio runtime, as workers are spawned
/// immediately.
pub struct TaskPool {
    config: PoolConfig,
    tx: mpsc::Sender<Work>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("config", &self.config)
            .field("queued", &self.queued())
            .field("shut_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl TaskPool {
    pub fn new(config: PoolConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Work>(config.max_queued_jobs.max(1));
        let rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));
        let shutdown = CancellationToken::new();

        info!(
            pool = %config.name,
            min_workers = config.min_workers,
            max_workers = config.max_workers,
            max_queued_jobs = config.max_queued_jobs,
            resizing_strategy = %config.resizing_strategy,
            "starting worker pool"
        );

        let workers = (0..config.max_workers)
            .map(|id| {
                tokio::spawn(worker_loop(
                    config.name.clone(),
                    id,
                    Arc::clone(&rx),
                    shutdown.clone(),
                ))
            })
            .collect();

        Self {
            config,
            tx,
            shutdown,
            workers: Mutex::new(workers),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of units waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop all workers and wait for them to exit.
    ///
    /// Running tasks are aborted; queued work is discarded. Later
    /// submissions fail with [`DispatchError::PoolClosed`].
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = match self.workers.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(pool = %self.config.name, error = %e, "worker ended abnormally");
            }
        }

        info!(pool = %self.config.name, "worker pool shut down");
    }

    fn enqueue(&self, work: Work) -> Result<()> {
        if self.shutdown.is_cancelled() {
            return Err(self.closed());
        }

        match self.tx.try_send(work) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DispatchError::QueueFull {
                pool: self.config.name.clone(),
            }),
            Err(TrySendError::Closed(_)) => Err(self.closed()),
        }
    }

    fn closed(&self) -> DispatchError {
        DispatchError::PoolClosed {
            pool: self.config.name.clone(),
        }
    }
}

impl WorkerPool for TaskPool {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn submit(&self, task: ProducerTask) -> Result<()> {
        self.enqueue(Work::Task(task))
    }

    fn add_job(&self, payload: Payload) -> Result<()> {
        self.enqueue(Work::Payload(payload))
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn worker_loop(pool: String, id: usize, rx: SharedReceiver, shutdown: CancellationToken) {
    debug!(pool = %pool, worker = id, "worker started");

    loop {
        let work = {
            let mut guard = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                guard = rx.lock() => guard,
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                work = guard.recv() => work,
            }
        };

        let Some(work) = work else {
            break;
        };

        let keep_running = match work {
            Work::Task(task) => run_task(&pool, id, task, &shutdown).await,
            Work::Payload(payload) => run_payload(&pool, id, payload, &shutdown).await,
        };

        if !keep_running {
            break;
        }
    }

    debug!(pool = %pool, worker = id, "worker exiting");
}

/// Returns `false` if the pool was shut down while the task ran.
async fn run_task(pool: &str, id: usize, task: ProducerTask, shutdown: &CancellationToken) -> bool {
    let mut handle = tokio::spawn(task);

    tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            handle.abort();
            false
        }
        res = &mut handle => {
            if let Err(e) = res {
                error!(pool = %pool, worker = id, error = %e, "pool task panicked");
            }
            true
        }
    }
}

async fn run_payload(
    pool: &str,
    id: usize,
    payload: Payload,
    shutdown: &CancellationToken,
) -> bool {
    let job = payload.job_name().to_string();
    let mut handle = tokio::spawn(async move { payload.execute().await });

    tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            handle.abort();
            false
        }
        res = &mut handle => {
            match res {
                Ok(Ok(())) => debug!(pool = %pool, worker = id, job = %job, "job executed"),
                Ok(Err(e)) => {
                    warn!(pool = %pool, worker = id, job = %job, error = ?e, "job execution failed")
                }
                Err(e) => error!(pool = %pool, worker = id, job = %job, error = %e, "job execution panicked"),
            }
            true
        }
    }
}
