use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, TierError};

/// Cooperative cancellation flag shared between a run and its caller.
///
/// Clones share the same flag. Stages poll it between units of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns [`TierError::Cancelled`] if cancellation was requested.
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            Err(TierError::cancelled(stage))
        } else {
            Ok(())
        }
    }
}
