//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("Missing or corrupt segment input {path}: {reason}")]
    MissingResource { path: PathBuf, reason: String },

    #[error("Encoding failed: {message}")]
    Encoding {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Merge failed: {message}")]
    Merge {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Invalid audio clip: {0}")]
    InvalidAudio(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a missing-resource error.
    pub fn missing_resource(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MissingResource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an encoding failure error.
    pub fn encoding(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Encoding {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a merge failure error.
    pub fn merge(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::Merge {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error is a cooperative cancellation, not a real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
