//! Segment discovery inside a chapter directory.

use std::path::Path;

use tracing::debug;

use reel_models::Segment;

use crate::error::ComposeResult;

/// Find segment directories under `chapter_path`.
///
/// A segment is any direct subdirectory whose name parses as an unsigned
/// integer; everything else is ignored. Results are sorted by numeric index,
/// so `10` sorts after `9`, not after `1`. The literal directory name is
/// kept for paths, so a zero-padded `07` still reads from `07/`.
pub async fn discover_segments(chapter_path: &Path) -> ComposeResult<Vec<Segment>> {
    let mut found: Vec<(u32, std::ffi::OsString)> = Vec::new();

    let mut entries = tokio::fs::read_dir(chapter_path).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if let Ok(index) = name.to_string_lossy().parse::<u32>() {
            found.push((index, name));
        }
    }

    found.sort_unstable_by_key(|(index, _)| *index);
    debug!(chapter = %chapter_path.display(), segments = found.len(), "discovered segments");

    Ok(found
        .into_iter()
        .map(|(index, name)| Segment::at_dir(index, chapter_path.join(name)))
        .collect())
}
