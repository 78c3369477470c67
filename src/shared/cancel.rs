//! First-class cooperative cancellation
//!
//! A thin wrapper over `tokio_util`'s token so stages take cancellation as
//! a value instead of reaching for an ambient global. Child tokens observe
//! parent cancellation, which is how the orchestrator merges the operator's
//! token with its own controller.

use crate::error::{CoreError, CoreResult};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(CancellationToken);

impl CancelToken {
    pub fn new() -> Self {
        Self(CancellationToken::new())
    }

    /// A token cancelled when either this token or the child is cancelled
    pub fn child(&self) -> Self {
        Self(self.0.child_token())
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Bail out of a stage loop
    pub fn check(&self) -> CoreResult<()> {
        if self.0.is_cancelled() {
            Err(CoreError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_observes_parent_cancellation() {
        let parent = CancelToken::new();
        let child = parent.child();
        assert!(child.check().is_ok());
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(matches!(child.check(), Err(CoreError::Cancelled)));
    }

    #[test]
    fn child_cancellation_does_not_reach_parent() {
        let parent = CancelToken::new();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());
    }
}
