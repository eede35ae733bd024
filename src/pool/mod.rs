// src/pool/mod.rs

//! Worker pool abstraction.
//!
//! The manager talks to a `WorkerPool` instead of spawning Tokio tasks
//! itself. Two independent pools are used:
//!
//! - the *producer pool*, with one worker per job, runs the long-lived
//!   trigger loops submitted through [`WorkerPool::submit`];
//! - the *executor pool* receives ready [`Payload`]s through
//!   [`WorkerPool::add_job`] and runs them.
//!
//! [`TaskPool`] is the implementation used in production. Tests provide their
//! own `WorkerPool` that records what was submitted.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::job::Payload;
use crate::types::ResizingStrategy;

pub mod task_pool;

pub use task_pool::TaskPool;

/// A long-running unit submitted to a pool worker.
pub type ProducerTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Contract the manager and the trigger adapters need from a pool.
pub trait WorkerPool: Send + Sync + 'static {
    /// Identity used purely for observability.
    fn name(&self) -> &str;

    /// Register a task to run on a pool worker. Returns immediately; tasks are
    /// admitted in FIFO order as workers become free.
    fn submit(&self, task: ProducerTask) -> Result<()>;

    /// Enqueue one unit of ready work. Never blocks: when the queue is full the
    /// payload is rejected with [`DispatchError::QueueFull`].
    ///
    /// [`DispatchError::QueueFull`]: crate::errors::DispatchError::QueueFull
    fn add_job(&self, payload: Payload) -> Result<()>;
}

/// Construction parameters of a pool.
///
/// None of these affect dispatch correctness, only throughput and latency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub name: String,
    pub min_workers: usize,
    pub max_workers: usize,
    /// Capacity of the pending-work queue.
    pub max_queued_jobs: usize,
    pub resizing_strategy: ResizingStrategy,
}
