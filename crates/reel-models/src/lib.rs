//! Shared data models for the storyreel composition pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Video settings with default merging and validation
//! - Encoder selection (GPU/CPU)
//! - Segments and per-segment render outcomes
//! - Job lifecycle state and progress snapshots
//! - The cooperative cancellation flag

pub mod cancel;
pub mod encoder;
pub mod job;
pub mod segment;
pub mod settings;

// Re-export common types
pub use cancel::CancelFlag;
pub use encoder::{EncoderChoice, CPU_CODEC, GPU_CODEC};
pub use job::{JobState, JobStatus, ProgressSnapshot};
pub use segment::{RenderOutcome, Segment, AUDIO_FILENAME, IMAGE_FILENAME};
pub use settings::{SettingsError, VideoSettings};
