// src/lib.rs

pub mod config;
pub mod errors;
pub mod job;
pub mod logging;
pub mod manager;
pub mod pool;
pub mod types;

use std::future::Future;

use tracing::{error, info};

pub use crate::config::{ConfigFile, load_and_validate};
pub use crate::errors::{DispatchError, Result};
pub use crate::job::{
    Basic, Conditional, EthSubscribable, JobContext, JobVariant, Payload, Polling, Subscribable,
    Subscription, SubscriptionHandle, TriggerValue, VariantKind, trigger_value,
};
pub use crate::manager::{JobManager, ManagerState};
pub use crate::pool::{PoolConfig, ProducerTask, TaskPool, WorkerPool};

/// Run `manager` until `shutdown` resolves or `ctx` is cancelled.
///
/// This wires together what an embedding application does around a manager:
/// - start every job
/// - wait for the shutdown signal, e.g. `tokio::signal::ctrl_c()`
/// - cancel `ctx`, tear the jobs down and shut both pools down
///
/// If `start` fails, the jobs set up so far are torn down and the start error
/// is returned.
pub async fn run_until_shutdown<F>(manager: &JobManager, ctx: &JobContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    if let Err(e) = manager.start(ctx).await {
        if let Err(teardown) = manager.stop() {
            error!(manager = %manager.name(), error = %teardown, "teardown after failed start");
        }
        manager.shutdown_pools().await;
        return Err(e);
    }

    tokio::select! {
        _ = shutdown => info!(manager = %manager.name(), "shutdown requested"),
        _ = ctx.cancelled() => info!(manager = %manager.name(), "context cancelled"),
    }

    ctx.cancel();
    let stopped = manager.stop();
    manager.shutdown_pools().await;
    stopped
}
