//! Per-segment rendering.
//!
//! One segment's still image becomes a frame sequence via the effect
//! pipeline, which is streamed to FFmpeg over stdin together with the
//! narration clip and encoded into a segment-scoped temporary MP4.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::imageops::FilterType;
use image::RgbImage;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

use reel_models::{CancelFlag, EncoderChoice, Segment, VideoSettings};

use crate::command::FfmpegCommand;
use crate::effects::{apply_effects, EffectParams};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_audio;

/// Inputs smaller than this are treated as truncated uploads.
const MIN_RESOURCE_BYTES: u64 = 1024;

/// Render one segment into `temp_path`.
///
/// Cancellation is polled at frame granularity; a cancelled render counts as
/// a failure, never a success. On any error the partially-written temp file
/// is removed before returning, so the orchestrator only ever sees temp
/// files for successful outcomes.
pub async fn render_segment(
    segment: &Segment,
    settings: &VideoSettings,
    encoder: &EncoderChoice,
    cancel: &CancelFlag,
    temp_path: &Path,
) -> MediaResult<PathBuf> {
    match render_inner(segment, settings, encoder, cancel, temp_path).await {
        Ok(path) => Ok(path),
        Err(e) => {
            let _ = tokio::fs::remove_file(temp_path).await;
            Err(e)
        }
    }
}

async fn render_inner(
    segment: &Segment,
    settings: &VideoSettings,
    encoder: &EncoderChoice,
    cancel: &CancelFlag,
    temp_path: &Path,
) -> MediaResult<PathBuf> {
    let start_time = Instant::now();

    let image_path = segment.image_path();
    let audio_path = segment.audio_path();
    validate_resource(&image_path).await?;
    validate_resource(&audio_path).await?;

    let audio = probe_audio(&audio_path).await?;

    let (width, height) = settings.resolution;
    let fps = settings.fps;
    let frame_count = ((audio.duration * fps as f64) as u64).max(1);
    // Audio is truncated or silence-padded to this exact boundary
    let video_duration = frame_count as f64 / fps as f64;

    let image = load_base_image(image_path, width, height).await?;

    let params = EffectParams {
        output_size: settings.resolution,
        fade_duration: settings.fade_duration,
        use_pan: settings.use_pan,
        pan_range: settings.pan_range,
        segment_index: segment.index,
    };

    debug!(
        segment = segment.index,
        frames = frame_count,
        duration = video_duration,
        "generating frames"
    );

    let frames = generate_frames(image, frame_count, fps, params, cancel.clone()).await?;

    encode_frames(&frames, &audio_path, settings, encoder, video_duration, temp_path).await?;

    let size = tokio::fs::metadata(temp_path).await.map(|m| m.len()).unwrap_or(0);
    info!(
        segment = segment.index,
        elapsed_secs = format!("{:.1}", start_time.elapsed().as_secs_f64()),
        size_bytes = size,
        "segment rendered"
    );

    Ok(temp_path.to_path_buf())
}

/// Reject absent or implausibly small input files.
async fn validate_resource(path: &Path) -> MediaResult<()> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| MediaError::missing_resource(path, "file does not exist"))?;

    if meta.len() < MIN_RESOURCE_BYTES {
        return Err(MediaError::missing_resource(
            path,
            format!("file too small ({} bytes), likely truncated", meta.len()),
        ));
    }

    Ok(())
}

/// Decode the still image, normalize to RGB and resize to the output resolution.
async fn load_base_image(path: PathBuf, width: u32, height: u32) -> MediaResult<RgbImage> {
    tokio::task::spawn_blocking(move || {
        let img = image::open(&path)
            .map_err(|e| MediaError::InvalidImage(format!("{}: {e}", path.display())))?;
        Ok(image::imageops::resize(
            &img.to_rgb8(),
            width,
            height,
            FilterType::Lanczos3,
        ))
    })
    .await
    .map_err(|e| MediaError::internal(format!("image load task failed: {e}")))?
}

/// Generate the in-memory frame buffer on a blocking thread.
///
/// Returns `Cancelled` as soon as the flag is observed; partial frames are
/// discarded with the buffer.
async fn generate_frames(
    image: RgbImage,
    frame_count: u64,
    fps: u32,
    params: EffectParams,
    cancel: CancelFlag,
) -> MediaResult<Vec<Vec<u8>>> {
    tokio::task::spawn_blocking(move || {
        let mut frames = Vec::with_capacity(frame_count as usize);
        for i in 0..frame_count {
            if cancel.is_set() {
                return Err(MediaError::Cancelled);
            }
            let t = i as f64 / fps as f64;
            let duration = frame_count as f64 / fps as f64;
            let frame = apply_effects(&image, t, duration, &params);
            frames.push(frame.into_raw());
        }
        Ok(frames)
    })
    .await
    .map_err(|e| MediaError::internal(format!("frame generation task failed: {e}")))?
}

/// Stream raw RGB24 frames to FFmpeg stdin and mux with the narration clip.
///
/// `-af apad` plus `-t` reconciles audio and video length at the frame
/// boundary: short audio is padded with trailing silence, long audio is
/// truncated.
async fn encode_frames(
    frames: &[Vec<u8>],
    audio_path: &Path,
    settings: &VideoSettings,
    encoder: &EncoderChoice,
    video_duration: f64,
    temp_path: &Path,
) -> MediaResult<()> {
    let (width, height) = settings.resolution;

    let cmd = FfmpegCommand::new(temp_path)
        .pipe_input([
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &settings.fps.to_string(),
        ])
        .input(Vec::<String>::new(), audio_path)
        .output_args(encoder.to_ffmpeg_args())
        .output_args([
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-af",
            "apad",
            "-t",
            &format!("{video_duration:.3}"),
            "-movflags",
            "+faststart",
        ]);

    let child = cmd.spawn_piped()?;
    stream_frames(child, frames).await
}

/// Feed raw frames to the encoder's stdin and collect its exit status.
///
/// A write failure (typically EPIPE from an early-exiting encoder) does not
/// short-circuit: the child is still awaited and its drained stderr folded
/// into the error, so the diagnostic that explains the closed pipe survives.
async fn stream_frames(mut child: tokio::process::Child, frames: &[Vec<u8>]) -> MediaResult<()> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| MediaError::internal("failed to open encoder stdin"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| MediaError::internal("failed to open encoder stderr"))?;

    // Drain stderr concurrently so a chatty encoder cannot stall the frame writes
    let drain = tokio::spawn(async move {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf).await;
        buf
    });

    let mut write_error = None;
    for frame in frames {
        if let Err(e) = stdin.write_all(frame).await {
            write_error = Some(e);
            break;
        }
    }
    drop(stdin);

    let status = child.wait().await?;
    let stderr_bytes = drain.await.unwrap_or_default();
    let captured = String::from_utf8_lossy(&stderr_bytes).to_string();

    if let Some(e) = write_error {
        return Err(MediaError::encoding(
            format!("encoder closed its input early: {e}"),
            Some(captured),
            status.code(),
        ));
    }

    if !status.success() {
        return Err(MediaError::encoding(
            format!("segment encode exited with {status}"),
            Some(captured),
            status.code(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_validate_rejects_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = validate_resource(&dir.path().join("image.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MissingResource { .. }));
    }

    #[tokio::test]
    async fn test_validate_rejects_tiny_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audio.mp3");
        tokio::fs::write(&path, b"short").await.unwrap();

        let err = validate_resource(&path).await.unwrap_err();
        assert!(matches!(err, MediaError::MissingResource { .. }));
    }

    #[tokio::test]
    async fn test_validate_accepts_plausible_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image.png");
        tokio::fs::write(&path, vec![0u8; 2048]).await.unwrap();

        assert!(validate_resource(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_early_encoder_exit_surfaces_stderr() {
        use std::process::Stdio;

        // Stand-in encoder that reports a reason on stderr and dies without
        // consuming its input
        let child = tokio::process::Command::new("sh")
            .args(["-c", "echo pipe closed by encoder >&2; exit 3"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();

        // Enough data to outlast the pipe buffer once the reader is gone
        let frames = vec![vec![0u8; 64 * 1024]; 64];
        let err = stream_frames(child, &frames).await.unwrap_err();

        match err {
            MediaError::Encoding { stderr, .. } => {
                assert!(stderr.unwrap().contains("pipe closed by encoder"));
            }
            other => panic!("expected Encoding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_frames_observes_cancellation() {
        let image = RgbImage::from_pixel(32, 32, image::Rgb([50, 50, 50]));
        let params = EffectParams {
            output_size: (32, 32),
            fade_duration: 0.0,
            use_pan: false,
            pan_range: (0.0, 0.0),
            segment_index: 0,
        };

        let cancel = CancelFlag::new();
        cancel.set();

        let err = generate_frames(image, 100, 10, params, cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_generate_frames_produces_rgb24_buffers() {
        let image = RgbImage::from_pixel(16, 8, image::Rgb([1, 2, 3]));
        let params = EffectParams {
            output_size: (16, 8),
            fade_duration: 0.0,
            use_pan: false,
            pan_range: (0.0, 0.0),
            segment_index: 0,
        };

        let frames = generate_frames(image, 5, 10, params, CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(frames.len(), 5);
        for frame in &frames {
            assert_eq!(frame.len(), 16 * 8 * 3);
        }
    }
}
