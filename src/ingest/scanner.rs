//! Scan stage
//!
//! Expands the operator's paths into a flat, classified, ordered file list.
//! Directories recurse with symlink-loop protection, dotfiles are ignored,
//! and anything already under the archive root is skipped so an archive can
//! never ingest itself.

use super::progress::ProgressTracker;
use super::types::{IngestStage, ScanResult, ScannedFile};
use crate::domain::file_kind::{classify_extension, Classification};
use crate::error::{CoreError, CoreResult};
use crate::library::settings::SCAN_BYTES_PER_SEC;
use crate::library::Library;
use crate::shared::cancel::CancelToken;
use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// ETA fallback when no throughput history exists (100 MB/s)
const DEFAULT_BYTES_PER_SEC: f64 = 100.0 * 1024.0 * 1024.0;

/// Live-photo pairing window against file mtimes
const LIVE_PHOTO_WINDOW_SECS: i64 = 5;

/// Optional include/exclude filters over scanned paths
#[derive(Default)]
pub struct ScanFilters {
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl ScanFilters {
    pub fn from_patterns(include: &[String], exclude: &[String]) -> CoreResult<Self> {
        let build = |patterns: &[String]| -> CoreResult<Option<GlobSet>> {
            if patterns.is_empty() {
                return Ok(None);
            }
            let mut builder = GlobSetBuilder::new();
            for pattern in patterns {
                builder.add(
                    Glob::new(pattern)
                        .map_err(|e| CoreError::Invalid(format!("glob {pattern:?}: {e}")))?,
                );
            }
            Ok(Some(builder.build().map_err(|e| {
                CoreError::Invalid(format!("glob set: {e}"))
            })?))
        };
        Ok(Self {
            include: build(include)?,
            exclude: build(exclude)?,
        })
    }

    fn allows(&self, path: &Path) -> bool {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        match &self.include {
            Some(include) => include.is_match(path),
            None => true,
        }
    }
}

#[cfg(unix)]
fn dir_identity(meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn dir_identity(_meta: &std::fs::Metadata) -> Option<(u64, u64)> {
    None
}

pub(crate) async fn scan(
    library: &Library,
    sources: &[PathBuf],
    filters: &ScanFilters,
    cancel: &CancelToken,
    progress: &ProgressTracker,
) -> CoreResult<ScanResult> {
    let archive_root = library.paths().root().to_path_buf();
    let mut files = Vec::new();
    let mut visited_dirs: HashSet<(u64, u64)> = HashSet::new();

    for (source_index, source) in sources.iter().enumerate() {
        cancel.check()?;
        collect(
            source,
            &archive_root,
            filters,
            cancel,
            &mut visited_dirs,
            &mut files,
        )
        .await?;
        progress.emit(
            IngestStage::Scan,
            (source_index + 1) as f32 / sources.len().max(1) as f32,
        );
    }

    let mut scanned: Vec<ScannedFile> = Vec::with_capacity(files.len());
    for (id, (path, size, modified_at)) in files.into_iter().enumerate() {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let classification = classify_extension(&extension);
        let kind = classification.media_kind();
        let is_sidecar = classification.is_sidecar();

        if classification == Classification::Unknown {
            debug!("unknown extension, skipping {}", path.display());
        }

        scanned.push(ScannedFile {
            id: id as u64,
            original_path: path,
            filename,
            extension,
            size,
            kind,
            should_skip: kind.is_none(),
            should_hide: is_sidecar,
            is_sidecar,
            is_live_photo: false,
            modified_at,
        });
    }

    pair_live_photos(&mut scanned);

    let total_bytes: u64 = scanned.iter().filter(|f| !f.should_skip).map(|f| f.size).sum();
    let total_files = scanned.len() as u64;

    let bytes_per_sec = library
        .get_setting_f64(SCAN_BYTES_PER_SEC)
        .await?
        .filter(|bps| *bps > 0.0)
        .unwrap_or(DEFAULT_BYTES_PER_SEC);
    let estimated_duration_ms = ((total_bytes as f64 / bytes_per_sec) * 1000.0) as u64;

    progress.stage_done(IngestStage::Scan);
    debug!("scanned {} files, {} bytes", total_files, total_bytes);

    Ok(ScanResult {
        files: scanned,
        total_files,
        total_bytes,
        estimated_duration_ms,
    })
}

async fn collect(
    source: &Path,
    archive_root: &Path,
    filters: &ScanFilters,
    cancel: &CancelToken,
    visited_dirs: &mut HashSet<(u64, u64)>,
    out: &mut Vec<(PathBuf, u64, Option<DateTime<Utc>>)>,
) -> CoreResult<()> {
    let mut stack = vec![source.to_path_buf()];

    while let Some(path) = stack.pop() {
        cancel.check()?;

        if path.starts_with(archive_root) {
            debug!("ignoring archive-internal path {}", path.display());
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!("cannot stat {}: {}", path.display(), e);
                continue;
            }
        };

        if meta.is_dir() {
            if let Some(identity) = dir_identity(&meta) {
                if !visited_dirs.insert(identity) {
                    warn!("symlink loop at {}, refusing to recurse", path.display());
                    continue;
                }
            }
            let mut entries = Vec::new();
            let mut dir = tokio::fs::read_dir(&path).await?;
            while let Some(entry) = dir.next_entry().await? {
                entries.push(entry.path());
            }
            // readdir order is filesystem-dependent; sort for a stable scan
            entries.sort();
            // reversed so the stack pops in lexical order
            for entry in entries.into_iter().rev() {
                stack.push(entry);
            }
        } else if meta.is_file() {
            if !filters.allows(&path) {
                continue;
            }
            let modified_at = meta.modified().ok().map(DateTime::<Utc>::from);
            out.push((path, meta.len(), modified_at));
        }
    }
    Ok(())
}

/// Pair a still and a motion clip sharing a base name when their mtimes sit
/// within a small window. The motion half is hidden; real capture-time
/// pairing runs again in the background once metadata lands.
fn pair_live_photos(files: &mut [ScannedFile]) {
    use crate::domain::media::MediaKind;
    use std::collections::HashMap;

    let mut by_stem: HashMap<(PathBuf, String), Vec<usize>> = HashMap::new();
    for (index, file) in files.iter().enumerate() {
        if file.should_skip {
            continue;
        }
        let parent = file
            .original_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = file
            .filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&file.filename)
            .to_ascii_lowercase();
        by_stem.entry((parent, stem)).or_default().push(index);
    }

    for indices in by_stem.values() {
        if indices.len() != 2 {
            continue;
        }
        let (a, b) = (indices[0], indices[1]);
        let (image_idx, video_idx) = match (files[a].kind, files[b].kind) {
            (Some(MediaKind::Image), Some(MediaKind::Video)) => (a, b),
            (Some(MediaKind::Video), Some(MediaKind::Image)) => (b, a),
            _ => continue,
        };
        let close = match (files[image_idx].modified_at, files[video_idx].modified_at) {
            (Some(x), Some(y)) => (x - y).num_seconds().abs() <= LIVE_PHOTO_WINDOW_SECS,
            _ => false,
        };
        if close {
            files[image_idx].is_live_photo = true;
            files[video_idx].is_live_photo = true;
            files[video_idx].should_hide = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::MediaKind;

    fn scanned(id: u64, name: &str, kind: MediaKind, mtime_secs: i64) -> ScannedFile {
        ScannedFile {
            id,
            original_path: PathBuf::from(format!("/src/{name}")),
            filename: name.to_string(),
            extension: name.rsplit_once('.').map(|(_, e)| e).unwrap_or("").to_string(),
            size: 10,
            kind: Some(kind),
            should_skip: false,
            should_hide: false,
            is_sidecar: false,
            is_live_photo: false,
            modified_at: Some(DateTime::<Utc>::from_timestamp(mtime_secs, 0).unwrap()),
        }
    }

    #[test]
    fn still_and_motion_with_close_mtimes_pair() {
        let mut files = vec![
            scanned(0, "IMG_0001.heic", MediaKind::Image, 1_000),
            scanned(1, "IMG_0001.mov", MediaKind::Video, 1_002),
            scanned(2, "IMG_0002.heic", MediaKind::Image, 2_000),
        ];
        pair_live_photos(&mut files);
        assert!(files[0].is_live_photo);
        assert!(files[1].is_live_photo);
        assert!(files[1].should_hide);
        assert!(!files[2].is_live_photo);
    }

    #[test]
    fn distant_mtimes_do_not_pair() {
        let mut files = vec![
            scanned(0, "clip.jpg", MediaKind::Image, 1_000),
            scanned(1, "clip.mp4", MediaKind::Video, 5_000),
        ];
        pair_live_photos(&mut files);
        assert!(!files[0].is_live_photo);
        assert!(!files[1].should_hide);
    }

    #[test]
    fn filters_restrict_matches() {
        let filters =
            ScanFilters::from_patterns(&["**/*.jpg".to_string()], &["**/skip/**".to_string()])
                .unwrap();
        assert!(filters.allows(Path::new("/a/b.jpg")));
        assert!(!filters.allows(Path::new("/a/b.mp4")));
        assert!(!filters.allows(Path::new("/a/skip/b.jpg")));
    }
}
