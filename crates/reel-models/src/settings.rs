//! Video composition settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default output resolution (width, height)
pub const DEFAULT_RESOLUTION: (u32, u32) = (1024, 1024);
/// Default frame rate
pub const DEFAULT_FPS: u32 = 15;
/// Default fade in/out duration in seconds (<= 0 disables fading)
pub const DEFAULT_FADE_DURATION: f64 = 1.2;
/// Default pan range as fractions of the output dimension (horizontal, vertical)
pub const DEFAULT_PAN_RANGE: (f64, f64) = (0.5, 0.5);
/// Default number of segments rendered concurrently
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Error raised when settings fail validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid settings: {0}")]
pub struct SettingsError(pub String);

/// Per-job video composition settings.
///
/// Every field carries a serde default so a partial JSON document merges
/// with the built-in defaults on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Output resolution (width, height)
    #[serde(default = "default_resolution")]
    pub resolution: (u32, u32),

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Fade in/out duration in seconds; values <= 0 disable fading
    #[serde(default = "default_fade_duration")]
    pub fade_duration: f64,

    /// Whether the pan effect is applied
    #[serde(default = "default_use_pan")]
    pub use_pan: bool,

    /// Pan range as (horizontal, vertical) fractions of the output dimension
    #[serde(default = "default_pan_range")]
    pub pan_range: (f64, f64),

    /// Number of segments rendered concurrently per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Request GPU encoding; downgraded to CPU when the probe finds no GPU encoder
    #[serde(default = "default_use_cuda")]
    pub use_cuda: bool,

    /// Explicit codec name, honored within the acceleration class the probe allows
    #[serde(default)]
    pub codec_preference: Option<String>,
}

fn default_resolution() -> (u32, u32) {
    DEFAULT_RESOLUTION
}
fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_fade_duration() -> f64 {
    DEFAULT_FADE_DURATION
}
fn default_use_pan() -> bool {
    true
}
fn default_pan_range() -> (f64, f64) {
    DEFAULT_PAN_RANGE
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_use_cuda() -> bool {
    true
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            fps: DEFAULT_FPS,
            fade_duration: DEFAULT_FADE_DURATION,
            use_pan: true,
            pan_range: DEFAULT_PAN_RANGE,
            batch_size: DEFAULT_BATCH_SIZE,
            use_cuda: true,
            codec_preference: None,
        }
    }
}

impl VideoSettings {
    /// Create settings with the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a partial JSON override document with the defaults.
    pub fn from_overrides(json: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|e| SettingsError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that would make rendering meaningless.
    ///
    /// Must pass before any rendering starts.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(SettingsError(format!(
                "resolution must be positive, got {}x{}",
                self.resolution.0, self.resolution.1
            )));
        }
        if self.fps == 0 {
            return Err(SettingsError("fps must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(SettingsError("batch_size must be positive".to_string()));
        }
        if self.pan_range.0 < 0.0 || self.pan_range.1 < 0.0 {
            return Err(SettingsError(format!(
                "pan_range components must be non-negative, got ({}, {})",
                self.pan_range.0, self.pan_range.1
            )));
        }
        Ok(())
    }

    /// Returns new settings with an updated batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Returns new settings with an updated resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }
}
