//! Shared progress tracking for one composition job.

use std::sync::{Mutex, PoisonError};

use reel_models::{JobState, JobStatus, ProgressSnapshot};

/// All job state lives behind a single mutex, so progress queries always see
/// a consistent (status, progress, total) triple.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<JobState>,
}

impl ProgressTracker {
    /// Create a tracker in the `Idle` state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new job with `total` segments and enter `Running`.
    pub fn start(&self, total: usize) {
        let mut state = self.lock();
        *state = JobState {
            status: JobStatus::Running,
            progress: 0,
            total,
            current_task: "rendering segments".to_string(),
        };
    }

    /// Record one more processed segment (success and failure both count).
    pub fn increment(&self) {
        let mut state = self.lock();
        state.progress += 1;
    }

    /// Update the human-readable step description.
    pub fn set_current_task(&self, task: impl Into<String>) {
        self.lock().current_task = task.into();
    }

    /// Transition to a new status.
    pub fn set_status(&self, status: JobStatus) {
        self.lock().status = status;
    }

    /// Consistent point-in-time view.
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.lock().snapshot()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
