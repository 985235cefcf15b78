//! Hardware encoder probing.
//!
//! The probe runs `ffmpeg -encoders` once per probe instance and caches the
//! result. Probe failure is never fatal: the CPU encoder is always a valid
//! answer. The probed capability overrides caller settings in one direction
//! only: a caller may opt out of GPU encoding, but cannot force it when the
//! encoder is absent.

use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use reel_models::{EncoderChoice, VideoSettings, GPU_CODEC};

/// Lazily-initialized encoder capability, shared read-only by all renderers.
#[derive(Debug, Default)]
pub struct HardwareProbe {
    cached: OnceCell<EncoderChoice>,
}

impl HardwareProbe {
    /// Create a probe with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect the available encoder, probing at most once per instance.
    pub async fn detect(&self) -> EncoderChoice {
        self.cached.get_or_init(probe_encoders).await.clone()
    }

    /// Drop the cached result so the next [`detect`](Self::detect) re-probes.
    pub fn invalidate(&mut self) {
        self.cached = OnceCell::new();
    }

    /// Combine the probed capability with per-job settings.
    pub async fn resolve(&self, settings: &VideoSettings) -> EncoderChoice {
        let detected = self.detect().await;

        let base = if detected.use_cuda && settings.use_cuda {
            detected
        } else {
            // Either the hardware has no GPU encoder or the caller opted out
            EncoderChoice::cpu()
        };

        match &settings.codec_preference {
            Some(codec) if codec_matches_class(codec, base.use_cuda) => base.with_codec(codec),
            Some(codec) => {
                warn!(
                    codec = %codec,
                    use_cuda = base.use_cuda,
                    "codec preference does not match the available encoder class, ignoring"
                );
                base
            }
            None => base,
        }
    }
}

/// A GPU codec name is only honored on the GPU path, and vice versa.
fn codec_matches_class(codec: &str, use_cuda: bool) -> bool {
    let is_gpu_codec = codec.contains("nvenc");
    is_gpu_codec == use_cuda
}

async fn probe_encoders() -> EncoderChoice {
    let result = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await;

    match result {
        Ok(output) if output.status.success() => {
            let listing = String::from_utf8_lossy(&output.stdout);
            if listing.contains(GPU_CODEC) {
                info!("NVENC encoder available, using GPU encoding");
                EncoderChoice::gpu()
            } else {
                info!("NVENC encoder not listed, using CPU encoding");
                EncoderChoice::cpu()
            }
        }
        Ok(output) => {
            warn!(
                exit_code = ?output.status.code(),
                "encoder probe exited non-zero, falling back to CPU encoding"
            );
            EncoderChoice::cpu()
        }
        Err(e) => {
            warn!("encoder probe failed ({e}), falling back to CPU encoding");
            EncoderChoice::cpu()
        }
    }
}
