//! Narrated slideshow composition.
//!
//! Turns a chapter directory of numbered segment folders (`image.png` +
//! `audio.mp3` each) into a single `video.mp4`: segments render concurrently
//! in batches, survivors are stream-copy merged in order, and temp files are
//! always cleaned up.

pub mod composer;
pub mod discover;
pub mod error;
pub mod progress;

pub use composer::{VideoComposer, OUTPUT_FILENAME};
pub use discover::discover_segments;
pub use error::{ComposeError, ComposeResult};
pub use progress::ProgressTracker;
