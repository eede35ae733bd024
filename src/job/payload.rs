// src/job/payload.rs

use std::fmt;
use std::sync::Arc;

use super::{Basic, JobContext, TriggerValue};

/// One unit of ready work handed from a producer to the executor pool.
#[derive(Clone)]
pub struct Payload {
    ctx: JobContext,
    job: Arc<dyn Basic>,
    value: Option<TriggerValue>,
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("job", &self.job.name())
            .field("has_value", &self.value.is_some())
            .field("cancelled", &self.ctx.is_cancelled())
            .finish()
    }
}

impl Payload {
    pub fn new(ctx: JobContext, job: Arc<dyn Basic>, value: Option<TriggerValue>) -> Self {
        Self { ctx, job, value }
    }

    pub fn ctx(&self) -> &JobContext {
        &self.ctx
    }

    pub fn job(&self) -> &Arc<dyn Basic> {
        &self.job
    }

    pub fn job_name(&self) -> &str {
        self.job.name()
    }

    pub fn value(&self) -> Option<&TriggerValue> {
        self.value.as_ref()
    }

    /// Downcast the trigger value, if there is one of type `T`.
    pub fn value_as<T: 'static>(&self) -> Option<&T> {
        self.value.as_ref()?.downcast_ref::<T>()
    }

    /// Run the job for this payload.
    pub async fn execute(&self) -> anyhow::Result<()> {
        self.job.execute(&self.ctx, self.value.clone()).await
    }
}
