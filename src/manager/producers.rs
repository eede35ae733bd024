// src/manager/producers.rs

//! Trigger adapters: one producer loop per capability variant.
//!
//! Each function here is the body of one producer-pool task. It detects that
//! its job is ready and hands a [`Payload`] to the executor pool. All loops
//! race their waits against the shared [`JobContext`] and stop once it is
//! cancelled; cancellation is polled first so nothing is emitted after it
//! has been observed.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::job::{
    Basic, Conditional, EthSubscribable, JobContext, Payload, Polling, Subscribable, TriggerValue,
};
use crate::pool::WorkerPool;

/// Why an [`EthSubscribable`] producer stopped listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    SubscriptionError,
    SubscriptionEnded,
    ExecutorClosed,
}

/// Outcome of handing one payload to the executor pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    Accepted,
    /// The queue was full; this payload was not enqueued.
    Full,
    /// The pool is gone and the producer should stop.
    Closed,
}

/// Hand one payload to the executor pool.
fn emit<E: WorkerPool>(
    executors: &E,
    ctx: &JobContext,
    job: &Arc<dyn Basic>,
    value: Option<TriggerValue>,
) -> Emit {
    match executors.add_job(Payload::new(ctx.clone(), Arc::clone(job), value)) {
        Ok(()) => {
            debug!(pool = %executors.name(), "payload enqueued");
            Emit::Accepted
        }
        Err(e) if !e.is_fatal() => {
            warn!(pool = %executors.name(), error = %e, "executor queue full");
            Emit::Full
        }
        Err(e) => {
            error!(pool = %executors.name(), error = %e, "executor pool unavailable; stopping producer");
            Emit::Closed
        }
    }
}

/// Sleep `poll_interval`, evaluate the condition, fire once when it holds.
///
/// The single payload is not dropped on a full queue: the producer keeps
/// retrying it every `poll_interval` until the pool accepts it or closes.
pub async fn run_conditional<E: WorkerPool>(
    ctx: JobContext,
    job: Arc<dyn Basic>,
    trigger: Arc<dyn Conditional>,
    executors: Arc<E>,
    poll_interval: Duration,
) {
    debug!(?poll_interval, "conditional producer started");

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("cancelled before condition was met");
                return;
            }
            _ = sleep(poll_interval) => {}
        }

        let met = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("cancelled while evaluating condition");
                return;
            }
            met = trigger.condition(&ctx) => met,
        };

        if met {
            info!("condition met; dispatching job");
            break;
        }
    }

    while emit(executors.as_ref(), &ctx, &job, None) == Emit::Full {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("cancelled before the payload was accepted");
                return;
            }
            _ = sleep(poll_interval) => {}
        }
    }
}

/// Fire once per value received on the job's subscription channel.
pub async fn run_subscribable<E: WorkerPool>(
    ctx: JobContext,
    job: Arc<dyn Basic>,
    trigger: Arc<dyn Subscribable>,
    executors: Arc<E>,
) {
    let mut rx = tokio::select! {
        biased;
        _ = ctx.cancelled() => {
            debug!("cancelled before subscribing");
            return;
        }
        rx = trigger.subscribe(&ctx) => rx,
    };
    debug!("subscribed");

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("cancelled; leaving subscription");
                return;
            }
            value = rx.recv() => match value {
                Some(value) => {
                    if emit(executors.as_ref(), &ctx, &job, Some(value)) == Emit::Closed {
                        return;
                    }
                }
                None => {
                    warn!("subscription channel closed by job; producer exiting");
                    return;
                }
            },
        }
    }
}

/// Fire once per value; stop and unsubscribe on cancellation or on the first
/// subscription error. There is no retry: a failed subscription stays down
/// until the manager is restarted.
pub async fn run_eth_subscribable<E: WorkerPool>(
    ctx: JobContext,
    job: Arc<dyn Basic>,
    trigger: Arc<dyn EthSubscribable>,
    executors: Arc<E>,
) {
    let (mut subscription, mut rx) = match trigger.subscribe(&ctx).await {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = ?e, "subscribe failed; producer exiting");
            return;
        }
    };
    debug!("subscribed");

    let reason = loop {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => break StopReason::Cancelled,
            err = subscription.err() => match err {
                Some(e) => {
                    error!(error = ?e, "error in subscription");
                    break StopReason::SubscriptionError;
                }
                None => {
                    warn!("subscription error signal dropped");
                    break StopReason::SubscriptionEnded;
                }
            },
            value = rx.recv() => match value {
                Some(value) => {
                    if emit(executors.as_ref(), &ctx, &job, Some(value)) == Emit::Closed {
                        break StopReason::ExecutorClosed;
                    }
                }
                None => {
                    warn!("subscription channel closed by job");
                    break StopReason::SubscriptionEnded;
                }
            },
        }
    };

    trigger.unsubscribe(&ctx).await;
    debug!(?reason, "unsubscribed; producer exiting");
}

/// Fire unconditionally every `interval_time`, re-read before each wait.
///
/// A zero interval is replaced by `fallback`, so a misbehaving job cannot
/// flood the executor queue.
pub async fn run_polling<E: WorkerPool>(
    ctx: JobContext,
    job: Arc<dyn Basic>,
    trigger: Arc<dyn Polling>,
    executors: Arc<E>,
    fallback: Duration,
) {
    debug!("polling producer started");
    let mut warned_zero = false;

    loop {
        let mut interval = trigger.interval_time(&ctx);
        if interval.is_zero() {
            if !warned_zero {
                warn!(?fallback, "interval_time returned zero; using fallback interval");
                warned_zero = true;
            }
            interval = fallback;
        }

        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                debug!("cancelled; polling stopped");
                return;
            }
            _ = sleep(interval) => {}
        }

        if emit(executors.as_ref(), &ctx, &job, None) == Emit::Closed {
            return;
        }
    }
}
