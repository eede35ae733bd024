// src/manager/mod.rs

//! Job manager: classifies jobs and wires their trigger loops into the
//! producer pool.
//!
//! - [`JobManager::start`] sets up every job in list order, resolves its
//!   [`JobVariant`], and submits the matching trigger adapter from
//!   [`producers`] to the producer pool. It returns as soon as every
//!   producer is submitted.
//! - [`JobManager::stop`] cancels the producers and tears every job down in
//!   list order.
//!
//! Setup, teardown and classification failures are fatal: they are returned
//! to the caller, which is expected to shut the process down.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::{ConfigFile, DispatchSettings};
use crate::errors::{DispatchError, Result};
use crate::job::{Basic, JobContext, JobVariant};
use crate::pool::{ProducerTask, TaskPool, WorkerPool};

pub mod producers;

/// Lifecycle of a manager. Start and stop are one-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Idle,
    Running,
    Stopped,
}

/// Owns the job list and the producer/executor pools.
pub struct JobManager<P = TaskPool, E = TaskPool> {
    name: String,
    jobs: Vec<Arc<dyn Basic>>,
    producers: P,
    executors: Arc<E>,
    settings: DispatchSettings,
    state: Mutex<ManagerState>,
    /// Context shared by all producers of the current run; cancelled by `stop`.
    producer_ctx: Mutex<Option<JobContext>>,
    /// Number of leading jobs whose `setup` succeeded.
    set_up: AtomicUsize,
}

impl<P, E> fmt::Debug for JobManager<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let jobs: Vec<_> = self.jobs.iter().map(|j| j.name()).collect();
        f.debug_struct("JobManager")
            .field("name", &self.name)
            .field("jobs", &jobs)
            .field("settings", &self.settings)
            .field("state", &*self.state.lock().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}

impl JobManager<TaskPool, TaskPool> {
    /// Build a manager backed by two [`TaskPool`]s.
    ///
    /// The producer pool gets exactly one worker per job; the executor pool is
    /// sized from `[executor]` and named after the manager. Must be called
    /// from within a Tokio runtime.
    pub fn new(name: impl Into<String>, jobs: Vec<Arc<dyn Basic>>, config: &ConfigFile) -> Self {
        let name = name.into();
        let producers = TaskPool::new(config.producer_pool(jobs.len()));
        let executors = TaskPool::new(config.executor_pool(&name));
        Self::with_pools(name, jobs, producers, executors, config.dispatch)
    }

    /// Shut both pools down, aborting producers and in-flight executions.
    pub async fn shutdown_pools(&self) {
        self.producers.shutdown().await;
        self.executors.shutdown().await;
    }
}

impl<P: WorkerPool, E: WorkerPool> JobManager<P, E> {
    /// Build a manager around caller-provided pools.
    ///
    /// `producers` should be able to run `jobs.len()` tasks at once, since
    /// every job's trigger loop occupies one worker for its whole life.
    pub fn with_pools(
        name: impl Into<String>,
        jobs: Vec<Arc<dyn Basic>>,
        producers: P,
        executors: E,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            name: name.into(),
            jobs,
            producers,
            executors: Arc::new(executors),
            settings,
            state: Mutex::new(ManagerState::Idle),
            producer_ctx: Mutex::new(None),
            set_up: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn jobs(&self) -> &[Arc<dyn Basic>] {
        &self.jobs
    }

    pub fn producers(&self) -> &P {
        &self.producers
    }

    pub fn executors(&self) -> &E {
        &self.executors
    }

    pub fn state(&self) -> ManagerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set up every job and submit one producer per job.
    ///
    /// Producers run on a child of `ctx`: cancelling `ctx` or calling
    /// [`stop`](Self::stop) ends them. On the first failure the producers
    /// submitted so far are cancelled and the error is returned; later jobs
    /// are left untouched. Jobs already set up are torn down by `stop`.
    pub async fn start(&self, ctx: &JobContext) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != ManagerState::Idle {
                return Err(DispatchError::InvalidState(format!(
                    "manager '{}' cannot start from state {:?}",
                    self.name, *state
                )));
            }
            *state = ManagerState::Running;
        }

        let producer_ctx = ctx.child();
        *self
            .producer_ctx
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(producer_ctx.clone());

        info!(manager = %self.name, jobs = self.jobs.len(), "starting job manager");

        for job in &self.jobs {
            if let Err(e) = self.start_job(job, &producer_ctx).await {
                error!(manager = %self.name, job = %job.name(), error = %e, "fatal error while starting jobs");
                producer_ctx.cancel();
                return Err(e);
            }
        }

        info!(manager = %self.name, "all producers submitted");
        Ok(())
    }

    async fn start_job(&self, job: &Arc<dyn Basic>, ctx: &JobContext) -> Result<()> {
        job.setup(ctx).await.map_err(|source| DispatchError::Setup {
            job: job.name().to_string(),
            source,
        })?;
        self.set_up.fetch_add(1, Ordering::SeqCst);

        let variant = JobVariant::classify(job)?;
        let kind = variant.kind();
        let task = self.build_producer(job, variant, ctx);

        self.producers
            .submit(task)
            .map_err(|e| DispatchError::Pool {
                job: job.name().to_string(),
                source: Box::new(e),
            })?;

        debug!(manager = %self.name, job = %job.name(), variant = %kind, "producer submitted");
        Ok(())
    }

    fn build_producer(
        &self,
        job: &Arc<dyn Basic>,
        variant: JobVariant,
        ctx: &JobContext,
    ) -> ProducerTask {
        let span = info_span!(
            "producer",
            manager = %self.name,
            job = %job.name(),
            variant = %variant.kind()
        );
        let ctx = ctx.clone();
        let job = Arc::clone(job);
        let executors = Arc::clone(&self.executors);

        match variant {
            JobVariant::Conditional(trigger) => Box::pin(
                producers::run_conditional(
                    ctx,
                    job,
                    trigger,
                    executors,
                    self.settings.condition_poll_interval,
                )
                .instrument(span),
            ),
            JobVariant::Subscribable(trigger) => Box::pin(
                producers::run_subscribable(ctx, job, trigger, executors).instrument(span),
            ),
            JobVariant::EthSubscribable(trigger) => Box::pin(
                producers::run_eth_subscribable(ctx, job, trigger, executors).instrument(span),
            ),
            JobVariant::Polling(trigger) => Box::pin(
                producers::run_polling(
                    ctx,
                    job,
                    trigger,
                    executors,
                    self.settings.condition_poll_interval,
                )
                .instrument(span),
            ),
        }
    }

    /// Cancel the producers and tear down, in list order, every job whose
    /// `setup` succeeded.
    ///
    /// After a failed `start` only the jobs set up before the failure are torn
    /// down. The first teardown failure is returned immediately. Stopping
    /// twice is a no-op, so each job is torn down at most once.
    pub fn stop(&self) -> Result<()> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == ManagerState::Stopped {
                warn!(manager = %self.name, "stop called on a stopped manager; ignoring");
                return Ok(());
            }
            *state = ManagerState::Stopped;
        }

        if let Some(ctx) = self
            .producer_ctx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            ctx.cancel();
        }

        let set_up = self.set_up.load(Ordering::SeqCst);
        for job in self.jobs.iter().take(set_up) {
            job.teardown().map_err(|source| DispatchError::Teardown {
                job: job.name().to_string(),
                source,
            })?;
            debug!(manager = %self.name, job = %job.name(), "job torn down");
        }

        info!(manager = %self.name, "job manager stopped");
        Ok(())
    }
}
