// src/job/subscription.rs

use tokio::sync::oneshot;

/// Out-of-band error signal of an [`EthSubscribable`](super::EthSubscribable)
/// subscription.
///
/// The job keeps the paired [`SubscriptionHandle`] and reports a failure
/// through it. Dropping the handle without reporting means the subscription
/// ended on its own.
#[derive(Debug)]
pub struct Subscription {
    err_rx: oneshot::Receiver<anyhow::Error>,
    done: bool,
}

/// Job-side half of a [`Subscription`].
#[derive(Debug)]
pub struct SubscriptionHandle {
    err_tx: oneshot::Sender<anyhow::Error>,
}

impl Subscription {
    pub fn channel() -> (Subscription, SubscriptionHandle) {
        let (err_tx, err_rx) = oneshot::channel();
        (
            Subscription {
                err_rx,
                done: false,
            },
            SubscriptionHandle { err_tx },
        )
    }

    /// Wait for the subscription to end.
    ///
    /// Returns `Some(err)` when the job reported a failure and `None` when the
    /// handle was dropped. After it has resolved once, further calls never
    /// resolve.
    pub async fn err(&mut self) -> Option<anyhow::Error> {
        if self.done {
            std::future::pending::<()>().await;
        }
        let res = (&mut self.err_rx).await;
        self.done = true;
        res.ok()
    }
}

impl SubscriptionHandle {
    /// Report a subscription failure. Returns `false` if nobody listens any more.
    pub fn fail(self, err: anyhow::Error) -> bool {
        self.err_tx.send(err).is_ok()
    }

    /// Whether the consuming side has gone away.
    pub fn is_closed(&self) -> bool {
        self.err_tx.is_closed()
    }
}
