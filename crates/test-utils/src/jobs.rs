//! Scripted job doubles for every trigger capability.
//!
//! A [`FakeJob`] handles the `Basic` lifecycle (counting calls, optionally
//! failing) and delegates its capability to a trigger object `T`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::mpsc;

use jobdispatch::job::{
    Basic, Conditional, EthSubscribable, JobContext, Polling, Subscribable, Subscription,
    SubscriptionHandle, TriggerValue,
};

/// Shared, ordered record of lifecycle calls across several jobs.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Call counters of a [`FakeJob`].
#[derive(Debug, Default)]
pub struct JobProbe {
    pub setups: AtomicUsize,
    pub teardowns: AtomicUsize,
    pub executions: AtomicUsize,
}

impl JobProbe {
    pub fn setups(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

/// Exposes the capabilities of a trigger object to [`FakeJob`].
pub trait FakeTrigger: Send + Sync + 'static {
    fn conditional(self: Arc<Self>) -> Option<Arc<dyn Conditional>> {
        None
    }

    fn subscribable(self: Arc<Self>) -> Option<Arc<dyn Subscribable>> {
        None
    }

    fn eth_subscribable(self: Arc<Self>) -> Option<Arc<dyn EthSubscribable>> {
        None
    }

    fn polling(self: Arc<Self>) -> Option<Arc<dyn Polling>> {
        None
    }
}

pub struct FakeJob<T> {
    name: String,
    probe: Arc<JobProbe>,
    trigger: Arc<T>,
    log: Option<EventLog>,
    setup_error: Option<String>,
    teardown_error: Option<String>,
}

impl<T: FakeTrigger> FakeJob<T> {
    pub fn new(name: &str, trigger: T) -> Self {
        Self {
            name: name.to_string(),
            probe: Arc::new(JobProbe::default()),
            trigger: Arc::new(trigger),
            log: None,
            setup_error: None,
            teardown_error: None,
        }
    }

    pub fn with_log(mut self, log: &EventLog) -> Self {
        self.log = Some(Arc::clone(log));
        self
    }

    pub fn failing_setup(mut self, msg: &str) -> Self {
        self.setup_error = Some(msg.to_string());
        self
    }

    pub fn failing_teardown(mut self, msg: &str) -> Self {
        self.teardown_error = Some(msg.to_string());
        self
    }

    pub fn probe(&self) -> &Arc<JobProbe> {
        &self.probe
    }

    pub fn trigger(&self) -> &Arc<T> {
        &self.trigger
    }

    fn record(&self, event: &str) {
        if let Some(log) = &self.log {
            log.lock().unwrap().push(format!("{event}:{}", self.name));
        }
    }
}

#[async_trait]
impl<T: FakeTrigger> Basic for FakeJob<T> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self, _ctx: &JobContext) -> anyhow::Result<()> {
        self.probe.setups.fetch_add(1, Ordering::SeqCst);
        self.record("setup");
        match &self.setup_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(()),
        }
    }

    async fn execute(&self, _ctx: &JobContext, _value: Option<TriggerValue>) -> anyhow::Result<()> {
        self.probe.executions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn teardown(&self) -> anyhow::Result<()> {
        self.probe.teardowns.fetch_add(1, Ordering::SeqCst);
        self.record("teardown");
        match &self.teardown_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(()),
        }
    }

    fn as_conditional(self: Arc<Self>) -> Option<Arc<dyn Conditional>> {
        Arc::clone(&self.trigger).conditional()
    }

    fn as_subscribable(self: Arc<Self>) -> Option<Arc<dyn Subscribable>> {
        Arc::clone(&self.trigger).subscribable()
    }

    fn as_eth_subscribable(self: Arc<Self>) -> Option<Arc<dyn EthSubscribable>> {
        Arc::clone(&self.trigger).eth_subscribable()
    }

    fn as_polling(self: Arc<Self>) -> Option<Arc<dyn Polling>> {
        Arc::clone(&self.trigger).polling()
    }
}

/// Condition that becomes true on the `true_after`-th check.
#[derive(Debug)]
pub struct CountingCondition {
    true_after: usize,
    checks: AtomicUsize,
}

impl CountingCondition {
    pub fn new(true_after: usize) -> Self {
        Self {
            true_after,
            checks: AtomicUsize::new(0),
        }
    }

    /// A condition that never holds.
    pub fn never() -> Self {
        Self::new(usize::MAX)
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Conditional for CountingCondition {
    async fn condition(&self, _ctx: &JobContext) -> bool {
        let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        n >= self.true_after
    }
}

impl FakeTrigger for CountingCondition {
    fn conditional(self: Arc<Self>) -> Option<Arc<dyn Conditional>> {
        Some(self)
    }
}

/// Subscription fed by a test-held sender.
#[derive(Debug)]
pub struct ChannelSubscription {
    rx: Mutex<Option<mpsc::Receiver<TriggerValue>>>,
    subscribes: AtomicUsize,
}

impl ChannelSubscription {
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<TriggerValue>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                rx: Mutex::new(Some(rx)),
                subscribes: AtomicUsize::new(0),
            },
            tx,
        )
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }
}

/// Hand out the prepared receiver once; later calls get a closed channel.
fn take_receiver(slot: &Mutex<Option<mpsc::Receiver<TriggerValue>>>) -> mpsc::Receiver<TriggerValue> {
    slot.lock().unwrap().take().unwrap_or_else(|| mpsc::channel(1).1)
}

#[async_trait]
impl Subscribable for ChannelSubscription {
    async fn subscribe(&self, _ctx: &JobContext) -> mpsc::Receiver<TriggerValue> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        take_receiver(&self.rx)
    }
}

impl FakeTrigger for ChannelSubscription {
    fn subscribable(self: Arc<Self>) -> Option<Arc<dyn Subscribable>> {
        Some(self)
    }
}

/// Error-bearing subscription fed by a test-held sender and handle.
#[derive(Debug)]
pub struct FakeEthSubscription {
    rx: Mutex<Option<mpsc::Receiver<TriggerValue>>>,
    subscription: Mutex<Option<Subscription>>,
    subscribe_error: Option<String>,
    unsubscribes: AtomicUsize,
}

impl FakeEthSubscription {
    pub fn new(capacity: usize) -> (Self, mpsc::Sender<TriggerValue>, SubscriptionHandle) {
        let (tx, rx) = mpsc::channel(capacity);
        let (subscription, handle) = Subscription::channel();
        (
            Self {
                rx: Mutex::new(Some(rx)),
                subscription: Mutex::new(Some(subscription)),
                subscribe_error: None,
                unsubscribes: AtomicUsize::new(0),
            },
            tx,
            handle,
        )
    }

    /// A subscription whose `subscribe` call fails.
    pub fn failing(msg: &str) -> Self {
        let (mut this, _tx, _handle) = Self::new(1);
        this.subscribe_error = Some(msg.to_string());
        this
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EthSubscribable for FakeEthSubscription {
    async fn subscribe(
        &self,
        _ctx: &JobContext,
    ) -> anyhow::Result<(Subscription, mpsc::Receiver<TriggerValue>)> {
        if let Some(msg) = &self.subscribe_error {
            return Err(anyhow!(msg.clone()));
        }
        let subscription = self
            .subscription
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| anyhow!("already subscribed"))?;
        Ok((subscription, take_receiver(&self.rx)))
    }

    async fn unsubscribe(&self, _ctx: &JobContext) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
    }
}

impl FakeTrigger for FakeEthSubscription {
    fn eth_subscribable(self: Arc<Self>) -> Option<Arc<dyn EthSubscribable>> {
        Some(self)
    }
}

/// Polling interval that a test can change while the producer runs.
#[derive(Debug)]
pub struct AdjustableInterval {
    millis: AtomicU64,
    reads: AtomicUsize,
}

impl AdjustableInterval {
    pub fn new(interval: Duration) -> Self {
        Self {
            millis: AtomicU64::new(interval.as_millis() as u64),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, interval: Duration) {
        self.millis.store(interval.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Polling for AdjustableInterval {
    fn interval_time(&self, _ctx: &JobContext) -> Duration {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

impl FakeTrigger for AdjustableInterval {
    fn polling(self: Arc<Self>) -> Option<Arc<dyn Polling>> {
        Some(self)
    }
}

/// Which capabilities a [`ShapeTrigger`] exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shape {
    pub conditional: bool,
    pub subscribable: bool,
    pub eth_subscribable: bool,
    pub polling: bool,
}

/// Trigger exposing an arbitrary set of capabilities, none of which ever
/// fires. Used to test classification.
#[derive(Debug)]
pub struct ShapeTrigger {
    shape: Shape,
}

impl ShapeTrigger {
    pub fn new(shape: Shape) -> Self {
        Self { shape }
    }
}

#[async_trait]
impl Conditional for ShapeTrigger {
    async fn condition(&self, _ctx: &JobContext) -> bool {
        false
    }
}

#[async_trait]
impl Subscribable for ShapeTrigger {
    async fn subscribe(&self, _ctx: &JobContext) -> mpsc::Receiver<TriggerValue> {
        // Keep the sender alive so the channel stays open but silent.
        let (tx, rx) = mpsc::channel(1);
        std::mem::forget(tx);
        rx
    }
}

#[async_trait]
impl EthSubscribable for ShapeTrigger {
    async fn subscribe(
        &self,
        _ctx: &JobContext,
    ) -> anyhow::Result<(Subscription, mpsc::Receiver<TriggerValue>)> {
        let (subscription, handle) = Subscription::channel();
        std::mem::forget(handle);
        let (tx, rx) = mpsc::channel(1);
        std::mem::forget(tx);
        Ok((subscription, rx))
    }

    async fn unsubscribe(&self, _ctx: &JobContext) {}
}

impl Polling for ShapeTrigger {
    fn interval_time(&self, _ctx: &JobContext) -> Duration {
        Duration::from_secs(3600)
    }
}

impl FakeTrigger for ShapeTrigger {
    fn conditional(self: Arc<Self>) -> Option<Arc<dyn Conditional>> {
        if self.shape.conditional { Some(self) } else { None }
    }

    fn subscribable(self: Arc<Self>) -> Option<Arc<dyn Subscribable>> {
        if self.shape.subscribable { Some(self) } else { None }
    }

    fn eth_subscribable(self: Arc<Self>) -> Option<Arc<dyn EthSubscribable>> {
        if self.shape.eth_subscribable { Some(self) } else { None }
    }

    fn polling(self: Arc<Self>) -> Option<Arc<dyn Polling>> {
        if self.shape.polling { Some(self) } else { None }
    }
}

/// Trigger without any capability.
#[derive(Debug, Default)]
pub struct NoTrigger;

impl FakeTrigger for NoTrigger {}
