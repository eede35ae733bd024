// src/job/mod.rs

//! Job capability traits.
//!
//! Every job implements [`Basic`] plus exactly one trigger capability:
//!
//! - [`Conditional`]: polled until `condition` returns true, then fired once.
//! - [`Subscribable`]: fired for every value received on a channel.
//! - [`EthSubscribable`]: like `Subscribable`, but the subscription carries an
//!   error signal and must be explicitly unsubscribed.
//! - [`Polling`]: fired unconditionally on a (possibly changing) interval.
//!
//! A job advertises its capability by overriding the matching `as_*`
//! accessor on [`Basic`]. The manager resolves the accessors once, in the
//! order listed above, into a [`JobVariant`].

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

pub mod context;
pub mod payload;
pub mod subscription;
pub mod variant;

pub use context::JobContext;
pub use payload::Payload;
pub use subscription::{Subscription, SubscriptionHandle};
pub use variant::{JobVariant, VariantKind};

/// Opaque value delivered by a subscription and attached to a [`Payload`].
///
/// Jobs downcast it back to the type they subscribed with.
pub type TriggerValue = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a [`TriggerValue`].
pub fn trigger_value<T: Any + Send + Sync>(value: T) -> TriggerValue {
    Arc::new(value)
}

/// Lifecycle every job implements.
#[async_trait]
pub trait Basic: Send + Sync + 'static {
    /// Identity used in logs and errors.
    fn name(&self) -> &str;

    /// Called once when the manager starts. A failure aborts the start.
    async fn setup(&self, ctx: &JobContext) -> anyhow::Result<()>;

    /// Run the job for one readiness event. `value` is present for
    /// subscription triggers only.
    async fn execute(&self, ctx: &JobContext, value: Option<TriggerValue>) -> anyhow::Result<()>;

    /// Called once when the manager stops.
    fn teardown(&self) -> anyhow::Result<()>;

    fn as_conditional(self: Arc<Self>) -> Option<Arc<dyn Conditional>> {
        None
    }

    fn as_subscribable(self: Arc<Self>) -> Option<Arc<dyn Subscribable>> {
        None
    }

    fn as_eth_subscribable(self: Arc<Self>) -> Option<Arc<dyn EthSubscribable>> {
        None
    }

    fn as_polling(self: Arc<Self>) -> Option<Arc<dyn Polling>> {
        None
    }
}

/// A job that fires once, as soon as its condition holds.
#[async_trait]
pub trait Conditional: Send + Sync + 'static {
    async fn condition(&self, ctx: &JobContext) -> bool;
}

/// A job that fires for every value on its subscription channel.
#[async_trait]
pub trait Subscribable: Send + Sync + 'static {
    async fn subscribe(&self, ctx: &JobContext) -> mpsc::Receiver<TriggerValue>;
}

/// A job backed by a fallible remote subscription.
#[async_trait]
pub trait EthSubscribable: Send + Sync + 'static {
    async fn subscribe(
        &self,
        ctx: &JobContext,
    ) -> anyhow::Result<(Subscription, mpsc::Receiver<TriggerValue>)>;

    async fn unsubscribe(&self, ctx: &JobContext);
}

/// A job that fires on a fixed cadence.
pub trait Polling: Send + Sync + 'static {
    /// Read before every wait, so the cadence may change at runtime.
    fn interval_time(&self, ctx: &JobContext) -> Duration;
}
