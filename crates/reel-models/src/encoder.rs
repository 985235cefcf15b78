//! Encoder selection shared by all segment renderers.

use serde::{Deserialize, Serialize};

/// GPU H.264 encoder name probed for in `ffmpeg -encoders` output.
pub const GPU_CODEC: &str = "h264_nvenc";
/// CPU H.264 encoder used when no GPU encoder is available.
pub const CPU_CODEC: &str = "libx264";
/// Encoding preset used on both paths.
pub const DEFAULT_PRESET: &str = "medium";
/// CRF for the CPU path.
pub const DEFAULT_CRF: u8 = 23;

/// Encoder chosen once per job by the hardware probe.
///
/// Read-only after probing; safely shared across concurrent renderers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncoderChoice {
    /// Whether the GPU encode path is in use
    pub use_cuda: bool,
    /// Video codec name passed to `-c:v`
    pub codec: String,
    /// Encoding preset
    pub preset: String,
    /// Quality factor; `-crf` on the CPU path, `-cq` on the GPU path
    pub crf: Option<u8>,
}

impl EncoderChoice {
    /// GPU encoder choice.
    pub fn gpu() -> Self {
        Self {
            use_cuda: true,
            codec: GPU_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: None,
        }
    }

    /// CPU fallback choice.
    pub fn cpu() -> Self {
        Self {
            use_cuda: false,
            codec: CPU_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: Some(DEFAULT_CRF),
        }
    }

    /// Returns a new choice with an explicit codec name.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// Convert to FFmpeg video-encoding arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
        ];

        // NVENC does not take -crf; -cq is its constant-quality knob
        if let Some(crf) = self.crf {
            if self.use_cuda {
                args.extend_from_slice(&["-cq".to_string(), crf.to_string()]);
            } else {
                args.extend_from_slice(&["-crf".to_string(), crf.to_string()]);
            }
        }

        args
    }

    /// Decode-acceleration hints prepended before inputs when the GPU path is active.
    pub fn hwaccel_args(&self) -> Vec<String> {
        if self.use_cuda {
            vec![
                "-hwaccel".to_string(),
                "cuda".to_string(),
                "-hwaccel_output_format".to_string(),
                "cuda".to_string(),
            ]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_args() {
        let args = EncoderChoice::cpu().to_ffmpeg_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"-crf".to_string()));
        assert!(args.contains(&"23".to_string()));
        assert!(!args.contains(&"-cq".to_string()));
    }

    #[test]
    fn test_gpu_args() {
        let choice = EncoderChoice::gpu();
        let args = choice.to_ffmpeg_args();
        assert!(args.contains(&"h264_nvenc".to_string()));
        // No quality factor configured on the GPU path by default
        assert!(!args.contains(&"-crf".to_string()));

        let args = EncoderChoice {
            crf: Some(23),
            ..choice
        }
        .to_ffmpeg_args();
        assert!(args.contains(&"-cq".to_string()));
    }

    #[test]
    fn test_hwaccel_hints_only_on_gpu() {
        assert!(EncoderChoice::cpu().hwaccel_args().is_empty());
        let hints = EncoderChoice::gpu().hwaccel_args();
        assert_eq!(hints[0], "-hwaccel");
        assert_eq!(hints[1], "cuda");
    }
}
