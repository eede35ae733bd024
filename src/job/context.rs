// src/job/context.rs

use tokio_util::sync::CancellationToken;

/// Ambient context handed to every job call.
///
/// Carries the shared cancellation signal. Cloning is cheap and every clone
/// observes the same signal; [`JobContext::child`] derives a context that is
/// cancelled together with its parent but can also be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct JobContext {
    token: CancellationToken,
}

impl JobContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Derive a context that is cancelled when `self` is.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
