//! Segment merging via the FFmpeg concat demuxer.
//!
//! Segments are stream-copied in order, never re-encoded: each temp MP4 was
//! already produced with identical codec parameters, so a copy merge is
//! lossless and fast.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use reel_models::EncoderChoice;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Merge segment files, in the order given, into `output_path`.
///
/// The concat list file lives next to the output and is removed on every
/// path, success or failure. The caller owns the segment temp files.
pub async fn merge_segments(
    segment_paths: &[PathBuf],
    output_path: &Path,
    encoder: &EncoderChoice,
) -> MediaResult<PathBuf> {
    if segment_paths.is_empty() {
        return Err(MediaError::merge("no segments to merge", None, None));
    }

    // Absolute paths: the concat demuxer resolves relative entries against
    // the list file's directory, not the working directory
    let mut absolute = Vec::with_capacity(segment_paths.len());
    for path in segment_paths {
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|_| MediaError::missing_resource(path, "segment file disappeared before merge"))?;
        absolute.push(canonical);
    }

    let list_path = concat_list_path(output_path);
    tokio::fs::write(&list_path, build_concat_list(&absolute)).await?;

    debug!(segments = segment_paths.len(), list = %list_path.display(), "merging segments");

    let result = run_merge(&list_path, output_path, encoder).await;
    let _ = tokio::fs::remove_file(&list_path).await;
    if let Err(e) = result {
        // A failed merge must not leave a truncated container at the
        // well-known output path
        remove_partial_output(output_path).await;
        return Err(e);
    }

    info!(
        segments = segment_paths.len(),
        output = %output_path.display(),
        "segments merged"
    );

    Ok(output_path.to_path_buf())
}

async fn run_merge(
    list_path: &Path,
    output_path: &Path,
    encoder: &EncoderChoice,
) -> MediaResult<()> {
    let output = FfmpegCommand::new(output_path)
        .global_args(encoder.hwaccel_args())
        .input(["-f", "concat", "-safe", "0"], list_path)
        .output_args(["-c", "copy", "-movflags", "+faststart"])
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::merge(
            format!("concat merge exited with {}", output.status),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    Ok(())
}

/// Concat demuxer list: one `file '<path>'` line per segment, single quotes
/// in paths escaped per the demuxer's quoting rules.
fn build_concat_list(segment_paths: &[PathBuf]) -> String {
    let mut list = String::new();
    for path in segment_paths {
        let escaped = path.to_string_lossy().replace('\'', "'\\''");
        list.push_str(&format!("file '{escaped}'\n"));
    }
    list
}

/// Remove whatever the failed merge wrote, if anything.
async fn remove_partial_output(output_path: &Path) {
    match tokio::fs::remove_file(output_path).await {
        Ok(()) => debug!(path = %output_path.display(), "removed partial merge output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %output_path.display(), error = %e, "failed to remove partial merge output"),
    }
}

fn concat_list_path(output_path: &Path) -> PathBuf {
    let dir = output_path.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!(".concat_{}.txt", std::process::id()))
}
