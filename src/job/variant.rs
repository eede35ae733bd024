// src/job/variant.rs

use std::fmt;
use std::sync::Arc;

use crate::errors::{DispatchError, Result};

use super::{Basic, Conditional, EthSubscribable, Polling, Subscribable};

/// Tag of a resolved trigger capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantKind {
    Conditional,
    Subscribable,
    EthSubscribable,
    Polling,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VariantKind::Conditional => "conditional",
            VariantKind::Subscribable => "subscribable",
            VariantKind::EthSubscribable => "eth_subscribable",
            VariantKind::Polling => "polling",
        };
        f.write_str(s)
    }
}

/// The single trigger capability a job resolved to.
pub enum JobVariant {
    Conditional(Arc<dyn Conditional>),
    Subscribable(Arc<dyn Subscribable>),
    EthSubscribable(Arc<dyn EthSubscribable>),
    Polling(Arc<dyn Polling>),
}

impl fmt::Debug for JobVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JobVariant").field(&self.kind()).finish()
    }
}

impl JobVariant {
    /// Resolve the trigger capability of `job`.
    ///
    /// Capabilities are tried in the order Conditional, Subscribable,
    /// EthSubscribable, Polling; the first one the job exposes wins, even if
    /// it exposes several. A job exposing none is a configuration error.
    pub fn classify(job: &Arc<dyn Basic>) -> Result<Self> {
        if let Some(c) = Arc::clone(job).as_conditional() {
            return Ok(JobVariant::Conditional(c));
        }
        if let Some(s) = Arc::clone(job).as_subscribable() {
            return Ok(JobVariant::Subscribable(s));
        }
        if let Some(s) = Arc::clone(job).as_eth_subscribable() {
            return Ok(JobVariant::EthSubscribable(s));
        }
        if let Some(p) = Arc::clone(job).as_polling() {
            return Ok(JobVariant::Polling(p));
        }
        Err(DispatchError::UnknownJobType(job.name().to_string()))
    }

    pub fn kind(&self) -> VariantKind {
        match self {
            JobVariant::Conditional(_) => VariantKind::Conditional,
            JobVariant::Subscribable(_) => VariantKind::Subscribable,
            JobVariant::EthSubscribable(_) => VariantKind::EthSubscribable,
            JobVariant::Polling(_) => VariantKind::Polling,
        }
    }
}
