//! Composition orchestrator.
//!
//! Drives one chapter through the full pipeline: discover segments, render
//! them in concurrent batches, merge the survivors, clean up. Segment temp
//! files are removed unconditionally, whatever way the job ends.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use reel_media::{merge_segments, render_segment, HardwareProbe};
use reel_models::{
    CancelFlag, EncoderChoice, JobStatus, ProgressSnapshot, RenderOutcome, Segment, VideoSettings,
};

use crate::discover::discover_segments;
use crate::error::{ComposeError, ComposeResult};
use crate::progress::ProgressTracker;

/// Final output filename inside the chapter directory.
pub const OUTPUT_FILENAME: &str = "video.mp4";

/// One chapter-composition engine.
///
/// Designed to run one job at a time; progress and cancellation are queried
/// concurrently from other tasks through `&self`.
#[derive(Debug)]
pub struct VideoComposer {
    settings: VideoSettings,
    probe: HardwareProbe,
    progress: ProgressTracker,
    cancel: CancelFlag,
}

impl VideoComposer {
    /// Create a composer with validated settings.
    pub fn new(settings: VideoSettings) -> ComposeResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            probe: HardwareProbe::new(),
            progress: ProgressTracker::new(),
            cancel: CancelFlag::new(),
        })
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Request cooperative cancellation of the running job.
    ///
    /// Always succeeds; the job observes the flag at the next poll point.
    pub fn cancel(&self) -> bool {
        info!("cancellation requested");
        self.cancel.set();
        true
    }

    /// Compose `chapter_path` into `chapter_path/video.mp4`.
    ///
    /// Failed segments are skipped; the job errors only when every segment
    /// fails or the merge itself fails. The terminal status always matches
    /// the returned result.
    pub async fn generate_video(&self, chapter_path: &Path) -> ComposeResult<PathBuf> {
        self.compose(chapter_path, self.settings.clone()).await
    }

    /// Like [`generate_video`](Self::generate_video), with a partial JSON
    /// settings document merged over this composer's settings for one job.
    pub async fn generate_video_with_overrides(
        &self,
        chapter_path: &Path,
        overrides: &str,
    ) -> ComposeResult<PathBuf> {
        let settings = VideoSettings::from_overrides(overrides)?;
        self.compose(chapter_path, settings).await
    }

    async fn compose(
        &self,
        chapter_path: &Path,
        settings: VideoSettings,
    ) -> ComposeResult<PathBuf> {
        let start_time = Instant::now();
        let result = self.run(chapter_path, &settings).await;

        match &result {
            Ok(path) => {
                self.progress.set_status(JobStatus::Completed);
                self.progress.set_current_task("completed");
                info!(
                    output = %path.display(),
                    elapsed_secs = format!("{:.1}", start_time.elapsed().as_secs_f64()),
                    "chapter composed"
                );
            }
            Err(e) if e.is_cancelled() => {
                self.progress.set_status(JobStatus::Cancelled);
                self.progress.set_current_task("cancelled");
                info!("composition cancelled");
            }
            Err(e) => {
                self.progress.set_status(JobStatus::Error);
                self.progress.set_current_task(format!("failed: {e}"));
                error!(error = %e, "composition failed");
            }
        }

        result
    }

    async fn run(&self, chapter_path: &Path, settings: &VideoSettings) -> ComposeResult<PathBuf> {
        self.cancel.reset();

        let segments = discover_segments(chapter_path).await?;
        if segments.is_empty() {
            return Err(ComposeError::NoSegments(chapter_path.to_path_buf()));
        }

        self.progress.start(segments.len());

        let encoder = self.probe.resolve(settings).await;
        info!(
            chapter = %chapter_path.display(),
            segments = segments.len(),
            codec = %encoder.codec,
            use_cuda = encoder.use_cuda,
            "starting composition"
        );

        let temp_paths: Vec<PathBuf> = segments
            .iter()
            .map(|s| temp_clip_path(chapter_path, s.index))
            .collect();

        let result = self
            .render_and_merge(chapter_path, settings, &segments, &temp_paths, &encoder)
            .await;

        cleanup_temp_files(&temp_paths).await;
        result
    }

    async fn render_and_merge(
        &self,
        chapter_path: &Path,
        settings: &VideoSettings,
        segments: &[Segment],
        temp_paths: &[PathBuf],
        encoder: &EncoderChoice,
    ) -> ComposeResult<PathBuf> {
        let outcomes = self.render_all(settings, segments, temp_paths, encoder).await?;

        if self.cancel.is_set() {
            return Err(ComposeError::Cancelled);
        }

        let ordered = ordered_success_paths(&outcomes);

        let failed = outcomes.len() - ordered.len();
        if ordered.is_empty() {
            return Err(ComposeError::AllSegmentsFailed { failed });
        }
        if failed > 0 {
            warn!(failed, rendered = ordered.len(), "merging without failed segments");
        }

        self.progress.set_status(JobStatus::Merging);
        self.progress.set_current_task("merging segments");

        let output_path = chapter_path.join(OUTPUT_FILENAME);
        merge_segments(&ordered, &output_path, encoder).await?;

        Ok(output_path)
    }

    /// Render all segments in sequential batches of `batch_size`, segments
    /// within a batch running concurrently.
    async fn render_all(
        &self,
        settings: &VideoSettings,
        segments: &[Segment],
        temp_paths: &[PathBuf],
        encoder: &EncoderChoice,
    ) -> ComposeResult<Vec<RenderOutcome>> {
        let total = segments.len();
        let mut outcomes = Vec::with_capacity(total);

        for (batch, batch_temps) in segments
            .chunks(settings.batch_size)
            .zip(temp_paths.chunks(settings.batch_size))
        {
            if self.cancel.is_set() {
                return Err(ComposeError::Cancelled);
            }

            let handles: Vec<_> = batch
                .iter()
                .zip(batch_temps)
                .map(|(segment, temp_path)| {
                    let segment = segment.clone();
                    let settings = settings.clone();
                    let encoder = encoder.clone();
                    let cancel = self.cancel.clone();
                    let temp_path = temp_path.clone();

                    tokio::spawn(async move {
                        match render_segment(&segment, &settings, &encoder, &cancel, &temp_path)
                            .await
                        {
                            Ok(path) => RenderOutcome::Success {
                                index: segment.index,
                                path,
                            },
                            Err(e) => {
                                if !e.is_cancelled() {
                                    warn!(
                                        segment = segment.index,
                                        error = %e,
                                        "segment render failed, skipping"
                                    );
                                }
                                RenderOutcome::Failure {
                                    index: segment.index,
                                    reason: e.to_string(),
                                }
                            }
                        }
                    })
                })
                .collect();

            for result in join_all(handles).await {
                // A panicked render task is an orchestration failure, not a
                // skippable segment failure
                let outcome = result?;

                self.progress.increment();
                self.progress
                    .set_current_task(format!("segment {}/{}", outcomes.len() + 1, total));
                outcomes.push(outcome);
            }
        }

        Ok(outcomes)
    }
}

/// Successful outcomes' clip paths in ascending segment order.
///
/// Outcomes arrive in completion order; output order depends only on the
/// segment index.
fn ordered_success_paths(outcomes: &[RenderOutcome]) -> Vec<PathBuf> {
    let mut successes: Vec<(u32, PathBuf)> = outcomes
        .iter()
        .filter_map(|o| match o {
            RenderOutcome::Success { index, path } => Some((*index, path.clone())),
            RenderOutcome::Failure { .. } => None,
        })
        .collect();

    successes.sort_by_key(|(index, _)| *index);
    successes.into_iter().map(|(_, path)| path).collect()
}

/// Hidden, process-scoped temp clip name inside the chapter directory.
///
/// The pid keeps concurrent processes on a shared volume from clobbering
/// each other; the leading dot keeps the clip out of casual listings.
fn temp_clip_path(chapter_path: &Path, index: u32) -> PathBuf {
    chapter_path.join(format!(".seg_{}_{}.mp4", index, std::process::id()))
}

/// Remove segment temp files, ignoring ones already gone.
async fn cleanup_temp_files(temp_paths: &[PathBuf]) {
    for path in temp_paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "removed temp clip"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temp clip"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_clip_path_shape() {
        let path = temp_clip_path(Path::new("/chapters/7"), 3);
        assert_eq!(path.parent().unwrap(), Path::new("/chapters/7"));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".seg_3_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_merge_order_ignores_completion_order() {
        let clip = |i: u32| PathBuf::from(format!("/work/.seg_{i}_1.mp4"));
        // Completion order 3, 0, 2, 1, with 2 failed
        let outcomes = vec![
            RenderOutcome::Success { index: 3, path: clip(3) },
            RenderOutcome::Success { index: 0, path: clip(0) },
            RenderOutcome::Failure { index: 2, reason: "audio missing".to_string() },
            RenderOutcome::Success { index: 1, path: clip(1) },
        ];

        let ordered = ordered_success_paths(&outcomes);
        assert_eq!(ordered, vec![clip(0), clip(1), clip(3)]);
    }

    #[test]
    fn test_all_failures_yield_no_paths() {
        let outcomes = vec![RenderOutcome::Failure {
            index: 0,
            reason: "image missing".to_string(),
        }];
        assert!(ordered_success_paths(&outcomes).is_empty());
    }

    #[test]
    fn test_invalid_settings_rejected_at_construction() {
        let settings = VideoSettings::default().with_batch_size(0);
        assert!(matches!(
            VideoComposer::new(settings),
            Err(ComposeError::InvalidSettings(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_chapter_errors_without_output() {
        let dir = TempDir::new().unwrap();
        let composer = VideoComposer::new(VideoSettings::default()).unwrap();

        let err = composer.generate_video(dir.path()).await.unwrap_err();
        assert!(matches!(err, ComposeError::NoSegments(_)));
        assert_eq!(composer.progress().status, JobStatus::Error);
        assert!(!dir.path().join(OUTPUT_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_new_job_resets_stale_cancellation() {
        let dir = TempDir::new().unwrap();
        let composer = VideoComposer::new(VideoSettings::default()).unwrap();
        composer.cancel();

        // The stale flag is cleared before discovery, so the empty chapter is
        // still the error that surfaces, not Cancelled
        let err = composer.generate_video(dir.path()).await.unwrap_err();
        assert!(matches!(err, ComposeError::NoSegments(_)));
    }

    #[tokio::test]
    async fn test_segments_missing_inputs_all_fail() {
        let dir = TempDir::new().unwrap();
        for i in 0..3 {
            tokio::fs::create_dir(dir.path().join(i.to_string()))
                .await
                .unwrap();
        }

        let composer = VideoComposer::new(VideoSettings::default()).unwrap();
        let err = composer.generate_video(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            ComposeError::AllSegmentsFailed { failed: 3 }
        ));
        assert_eq!(composer.progress().status, JobStatus::Error);
        assert_eq!(composer.progress().progress, 3);

        // No temp clips or output left behind
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            assert!(entry.file_type().await.unwrap().is_dir());
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_first_batch() {
        let dir = TempDir::new().unwrap();
        tokio::fs::create_dir(dir.path().join("0")).await.unwrap();

        let composer = VideoComposer::new(VideoSettings::default()).unwrap();

        // run() resets the flag, so cancel after discovery would normally be
        // needed; here we exercise the batch-boundary check directly
        composer.progress.start(1);
        composer.cancel.set();
        let segments = vec![Segment::new(0, dir.path())];
        let temps = vec![temp_clip_path(dir.path(), 0)];
        let err = composer
            .render_and_merge(
                dir.path(),
                &VideoSettings::default(),
                &segments,
                &temps,
                &EncoderChoice::cpu(),
            )
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
