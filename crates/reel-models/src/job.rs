//! Job lifecycle state and progress snapshots.

use serde::{Deserialize, Serialize};

/// Composition job status.
///
/// Transitions: `Running -> Merging -> Completed`, or `Running -> Error`,
/// or `Running -> Cancelled`. `Idle` exists only before the first job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No job has started yet
    #[default]
    Idle,
    /// Segments are being rendered
    Running,
    /// Rendered segments are being concatenated
    Merging,
    /// Output file written
    Completed,
    /// Orchestration-level failure, no output
    Error,
    /// Cancelled cooperatively, no output
    Cancelled,
}

impl JobStatus {
    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

/// Mutable per-job record, guarded by a single mutex in the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobState {
    /// Current status
    pub status: JobStatus,
    /// Segments processed so far (success and failure both count)
    pub progress: usize,
    /// Total segments discovered for this job
    pub total: usize,
    /// Human-readable description of the current step
    pub current_task: String,
}

/// Read-only view returned to progress queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Current status
    pub status: JobStatus,
    /// Segments processed so far
    pub progress: usize,
    /// Total segments (floored at 1 before a job starts)
    pub total: usize,
    /// Integer percentage, floor(progress / total * 100)
    pub percentage: u8,
    /// Current step description
    pub current_task: String,
}

impl JobState {
    /// Take a consistent snapshot with a division-safe percentage.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let total = self.total.max(1);
        let percentage = (self.progress * 100 / total).min(100) as u8;
        ProgressSnapshot {
            status: self.status,
            progress: self.progress,
            total,
            percentage,
            current_task: self.current_task.clone(),
        }
    }
}
