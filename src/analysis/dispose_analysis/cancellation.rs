use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag the host flips to stop an analysis pass.
///
/// Clones observe the same flag. The fixed-point driver polls it once per block.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
