//! Orchestration-level errors.

use std::path::PathBuf;
use thiserror::Error;

use reel_media::MediaError;
use reel_models::SettingsError;

/// Result type for composition operations.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Errors surfaced by the composition orchestrator.
///
/// Individual segment failures are not errors at this level; they are
/// skipped. Only whole-job conditions appear here.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("No segment directories found under {0}")]
    NoSegments(PathBuf),

    #[error("All {failed} segments failed to render")]
    AllSegmentsFailed { failed: usize },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Render task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ComposeError {
    /// Whether this error is a cooperative cancellation, not a real failure.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Media(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
