//! Segments and per-segment render outcomes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed still-image filename inside a segment directory.
pub const IMAGE_FILENAME: &str = "image.png";
/// Fixed narration audio filename inside a segment directory.
pub const AUDIO_FILENAME: &str = "audio.mp3";

/// One scene unit: a numbered chapter subdirectory holding a still image
/// and a narration clip. Immutable once discovered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    /// Ordinal index; also the on-disk directory name
    pub index: u32,
    /// Segment directory inside the chapter
    pub dir: PathBuf,
}

impl Segment {
    /// Create a segment rooted at `chapter_path/<index>`.
    pub fn new(index: u32, chapter_path: impl AsRef<Path>) -> Self {
        Self {
            index,
            dir: chapter_path.as_ref().join(index.to_string()),
        }
    }

    /// Create a segment at an explicit directory.
    ///
    /// The directory name may spell the index differently than its decimal
    /// rendering, e.g. zero-padded `07`; the on-disk name stays authoritative
    /// for input paths.
    pub fn at_dir(index: u32, dir: impl Into<PathBuf>) -> Self {
        Self {
            index,
            dir: dir.into(),
        }
    }

    /// Path of the still image.
    pub fn image_path(&self) -> PathBuf {
        self.dir.join(IMAGE_FILENAME)
    }

    /// Path of the narration audio clip.
    pub fn audio_path(&self) -> PathBuf {
        self.dir.join(AUDIO_FILENAME)
    }
}

/// Result of rendering one segment.
///
/// Produced once by the segment renderer, consumed once by the orchestrator.
/// Failures carry a human-readable reason and never abort the job on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Segment encoded into a temporary clip
    Success {
        /// Segment index
        index: u32,
        /// Temporary clip path
        path: PathBuf,
    },
    /// Segment could not be rendered
    Failure {
        /// Segment index
        index: u32,
        /// Why the segment failed
        reason: String,
    },
}

impl RenderOutcome {
    /// Segment index this outcome belongs to.
    pub fn index(&self) -> u32 {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// Whether the segment rendered successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Temporary clip path for successful outcomes.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success { path, .. } => Some(path),
            Self::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_paths() {
        let segment = Segment::new(3, "/data/chapter");
        assert_eq!(segment.dir, PathBuf::from("/data/chapter/3"));
        assert_eq!(segment.image_path(), PathBuf::from("/data/chapter/3/image.png"));
        assert_eq!(segment.audio_path(), PathBuf::from("/data/chapter/3/audio.mp3"));
    }

    #[test]
    fn test_explicit_dir_kept_verbatim() {
        let segment = Segment::at_dir(7, "/data/chapter/07");
        assert_eq!(segment.index, 7);
        assert_eq!(segment.image_path(), PathBuf::from("/data/chapter/07/image.png"));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = RenderOutcome::Success {
            index: 1,
            path: PathBuf::from("/tmp/seg_1.mp4"),
        };
        assert!(ok.is_success());
        assert_eq!(ok.index(), 1);
        assert!(ok.path().is_some());

        let failed = RenderOutcome::Failure {
            index: 2,
            reason: "audio missing".to_string(),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.index(), 2);
        assert!(failed.path().is_none());
    }
}
