//! Hash stage
//!
//! Hashes scanned files on a bounded pool (cpu count minus one) while
//! completion callbacks fire in input order, then marks duplicates against
//! the archive index and earlier files in the same batch in one pass.

use super::progress::ProgressTracker;
use super::types::{FileCompleteEvent, FileCompleteFn, HashResult, HashedFile, IngestStage, ScanResult};
use crate::domain::media::MediaKind;
use crate::error::CoreResult;
use crate::library::Library;
use crate::shared::cancel::CancelToken;
use crate::shared::fingerprint::FileHasher;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub(crate) async fn fingerprint(
    library: &Library,
    scan: &ScanResult,
    concurrency: usize,
    cancel: &CancelToken,
    progress: &ProgressTracker,
    on_file_complete: Option<&FileCompleteFn>,
) -> CoreResult<HashResult> {
    let hasher = FileHasher::new();
    let total = scan.files.len().max(1);

    // buffered() dispatches up to `concurrency` hashes at once but yields
    // results in input order, which is what the streaming callback needs.
    let mut hash_stream = stream::iter(scan.files.clone())
        .map(|file| {
            let cancel = cancel.clone();
            async move {
                if file.should_skip {
                    return (file.id, None, None);
                }
                if cancel.is_cancelled() {
                    return (file.id, None, Some("Cancelled".to_string()));
                }
                match hasher.hash_file(&file.original_path).await {
                    Ok(fp) => (file.id, Some(fp.to_string()), None),
                    Err(e) => (file.id, None, Some(e.to_string())),
                }
            }
        })
        .buffered(concurrency.max(1));

    let mut hashed: Vec<HashedFile> = Vec::with_capacity(scan.files.len());
    while let Some((file_id, fingerprint, error)) = hash_stream.next().await {
        cancel.check()?;

        if let Some(on_file_complete) = on_file_complete {
            on_file_complete(FileCompleteEvent {
                file_id,
                stage: IngestStage::Hash,
                fingerprint: fingerprint.clone(),
                archive_path: None,
                error: error.clone(),
            })
            .await;
        }

        hashed.push(HashedFile {
            file_id,
            fingerprint,
            error,
            is_duplicate: false,
        });
        progress.emit(IngestStage::Hash, hashed.len() as f32 / total as f32);
    }
    drop(hash_stream);

    mark_duplicates(library, scan, &mut hashed).await?;
    progress.stage_done(IngestStage::Hash);

    Ok(HashResult { files: hashed })
}

/// Single read pass: a file is a duplicate when its fingerprint is already
/// in the matching kind table, or appeared earlier in this batch.
async fn mark_duplicates(
    library: &Library,
    scan: &ScanResult,
    hashed: &mut [HashedFile],
) -> CoreResult<()> {
    let kind_of: HashMap<u64, MediaKind> = scan
        .files
        .iter()
        .filter_map(|f| f.kind.map(|k| (f.id, k)))
        .collect();

    let mut candidates: HashMap<MediaKind, Vec<String>> = HashMap::new();
    for entry in hashed.iter() {
        if let (Some(fp), Some(kind)) = (&entry.fingerprint, kind_of.get(&entry.file_id)) {
            candidates.entry(*kind).or_default().push(fp.clone());
        }
    }

    let mut indexed: HashMap<MediaKind, HashSet<String>> = HashMap::new();
    for (kind, fingerprints) in &candidates {
        indexed.insert(
            *kind,
            library.existing_fingerprints(*kind, fingerprints).await?,
        );
    }

    let mut seen_in_batch: HashSet<(MediaKind, String)> = HashSet::new();
    let mut duplicates = 0usize;
    for entry in hashed.iter_mut() {
        let (Some(fp), Some(kind)) = (entry.fingerprint.clone(), kind_of.get(&entry.file_id).copied())
        else {
            continue;
        };
        let in_index = indexed
            .get(&kind)
            .map(|set| set.contains(&fp))
            .unwrap_or(false);
        if in_index || !seen_in_batch.insert((kind, fp)) {
            entry.is_duplicate = true;
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        debug!("marked {} duplicates", duplicates);
    }
    Ok(())
}
