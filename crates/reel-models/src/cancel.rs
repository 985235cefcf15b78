//! Cooperative cancellation flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared boolean polled by frame loops and the batch scheduler.
///
/// Cancellation is cooperative: nothing is force-killed. In-flight encode
/// processes finish or fail naturally and their output is removed by the
/// orchestrator's unconditional cleanup. The flag is cleared only when a new
/// job starts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag at the start of a new job.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_across_clones() {
        let flag = CancelFlag::new();
        let view = flag.clone();
        assert!(!view.is_set());

        flag.set();
        assert!(view.is_set());

        flag.reset();
        assert!(!view.is_set());
    }
}
