#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper and frame effects for slideshow segment rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg argument building
//! - Hardware encoder probing with CPU fallback
//! - Audio probing via ffprobe
//! - The pan/fade effect pipeline over still images
//! - Per-segment rendering to temporary clips
//! - Lossless stream-copy concatenation

pub mod command;
pub mod concat;
pub mod effects;
pub mod error;
pub mod hardware;
pub mod probe;
pub mod segment;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand};
pub use concat::merge_segments;
pub use effects::{apply_effects, fade_multiplier, pan_offset, EffectParams};
pub use error::{MediaError, MediaResult};
pub use hardware::HardwareProbe;
pub use probe::{probe_audio, AudioInfo};
pub use segment::render_segment;
