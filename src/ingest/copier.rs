//! Copy stage
//!
//! Probes the cheapest placement strategy once per session (hardlink, then
//! CoW clone, then streaming copy) and places every non-duplicate file as
//! tmp → fsync → rename, so a crash can never leave a partial file at the
//! final path.

use super::progress::ProgressTracker;
use super::types::{
    CopiedFile, CopyResult, CopyStrategy, FileCompleteEvent, FileCompleteFn, HashResult,
    IngestStage, ScanResult, ScannedFile,
};
use crate::domain::location::Location;
use crate::error::{CoreError, CoreResult};
use crate::library::Library;
use crate::shared::cancel::CancelToken;
use crate::shared::fingerprint::{FileHasher, Fingerprint};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Streaming copy buffer
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Pick the placement strategy for a session. Runs once; the orchestrator
/// caches the result on the session row.
pub async fn select_strategy(
    archive_root: &Path,
    sample: Option<&Path>,
    forced: Option<CopyStrategy>,
) -> CoreResult<CopyStrategy> {
    if let Some(forced) = forced {
        info!("copy strategy forced to {forced}");
        return Ok(forced);
    }

    let Some(sample) = sample else {
        return Ok(CopyStrategy::Copy);
    };

    let probe_dir = archive_root.join(".probe");
    tokio::fs::create_dir_all(&probe_dir).await?;
    let probe = probe_dir.join(format!("probe-{}", Uuid::new_v4()));

    let strategy = if tokio::fs::hard_link(sample, &probe).await.is_ok() {
        CopyStrategy::Hardlink
    } else {
        let sample = sample.to_path_buf();
        let clone_target = probe.clone();
        let cloned = tokio::task::spawn_blocking(move || {
            reflink_copy::reflink(&sample, &clone_target).is_ok()
        })
        .await
        .unwrap_or(false);
        if cloned {
            CopyStrategy::Reflink
        } else {
            CopyStrategy::Copy
        }
    };

    let _ = tokio::fs::remove_file(&probe).await;
    let _ = tokio::fs::remove_dir(&probe_dir).await;
    info!("selected copy strategy {strategy}");
    Ok(strategy)
}

pub(crate) async fn copy_files(
    library: &Library,
    location: &Location,
    scan: &ScanResult,
    hashes: &HashResult,
    strategy: CopyStrategy,
    cancel: &CancelToken,
    progress: &ProgressTracker,
    on_file_complete: Option<&FileCompleteFn>,
) -> CoreResult<CopyResult> {
    let hash_by_id: HashMap<u64, _> = hashes.files.iter().map(|h| (h.file_id, h)).collect();
    let hasher = FileHasher::new();
    let total = scan.files.len().max(1);
    let mut results = Vec::with_capacity(scan.files.len());

    for (index, file) in scan.files.iter().enumerate() {
        // Token check between files; a cancel mid-stage leaves no tmp behind
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let hashed = hash_by_id.get(&file.id);
        let outcome = match hashed {
            None => CopiedFile {
                file_id: file.id,
                fingerprint: None,
                archive_path: None,
                bytes_copied: 0,
                copy_strategy: strategy,
                copy_error: Some("Missing hash result".to_string()),
            },
            Some(h) if file.should_skip => CopiedFile {
                file_id: file.id,
                fingerprint: h.fingerprint.clone(),
                archive_path: None,
                bytes_copied: 0,
                copy_strategy: strategy,
                copy_error: Some("Skipped: unknown extension".to_string()),
            },
            Some(h) if h.is_duplicate => CopiedFile {
                file_id: file.id,
                fingerprint: h.fingerprint.clone(),
                archive_path: None,
                bytes_copied: 0,
                copy_strategy: strategy,
                copy_error: Some("Duplicate".to_string()),
            },
            Some(h) => match (&h.fingerprint, &h.error) {
                (_, Some(hash_error)) => CopiedFile {
                    file_id: file.id,
                    fingerprint: None,
                    archive_path: None,
                    bytes_copied: 0,
                    copy_strategy: strategy,
                    copy_error: Some(hash_error.clone()),
                },
                (Some(fp), None) => {
                    match place_file(library, location, file, fp, strategy, cancel, &hasher).await {
                        Ok(placed) => placed,
                        // A conflicting destination fails this file only;
                        // anything else aborts the stage
                        Err(conflict @ CoreError::ArchiveConflict { .. }) => {
                            failed(file.id, Some(fp.as_str()), strategy, conflict.to_string())
                        }
                        Err(e) => return Err(e),
                    }
                }
                (None, None) => CopiedFile {
                    file_id: file.id,
                    fingerprint: None,
                    archive_path: None,
                    bytes_copied: 0,
                    copy_strategy: strategy,
                    copy_error: Some("Missing fingerprint".to_string()),
                },
            },
        };

        if let Some(on_file_complete) = on_file_complete {
            on_file_complete(FileCompleteEvent {
                file_id: file.id,
                stage: IngestStage::Copy,
                fingerprint: outcome.fingerprint.clone(),
                archive_path: outcome.archive_path.clone(),
                error: outcome.copy_error.clone(),
            })
            .await;
        }

        results.push(outcome);
        progress.emit(IngestStage::Copy, (index + 1) as f32 / total as f32);
    }

    progress.stage_done(IngestStage::Copy);
    Ok(CopyResult {
        strategy,
        files: results,
    })
}

/// Place one file. Per-file I/O failures land on the returned record;
/// cancellation and `ArchiveConflict` propagate as errors for the caller
/// to dispatch.
async fn place_file(
    library: &Library,
    location: &Location,
    file: &ScannedFile,
    fingerprint_hex: &str,
    strategy: CopyStrategy,
    cancel: &CancelToken,
    hasher: &FileHasher,
) -> CoreResult<CopiedFile> {
    let fingerprint = match Fingerprint::parse(fingerprint_hex) {
        Ok(fp) => fp,
        Err(e) => {
            return Ok(failed(file.id, None, strategy, e.to_string()));
        }
    };
    let Some(kind) = file.kind else {
        return Ok(failed(file.id, Some(fingerprint_hex), strategy, "No media kind".to_string()));
    };

    let dest = library
        .paths()
        .media_dest(location, kind, &fingerprint, &file.extension);
    let parent = dest
        .parent()
        .ok_or_else(|| CoreError::invalid_state("destination has no parent"))?
        .to_path_buf();
    if let Err(e) = tokio::fs::create_dir_all(&parent).await {
        return Ok(failed(
            file.id,
            Some(fingerprint_hex),
            strategy,
            format!("mkdir failed: {e}"),
        ));
    }

    // Idempotent re-run: an identical destination is a success, a
    // different one is a conflict the finalizer must never overwrite.
    if let Ok(existing) = tokio::fs::metadata(&dest).await {
        let same = existing.len() == file.size
            && hasher
                .hash_file(&dest)
                .await
                .map(|fp| fp == fingerprint)
                .unwrap_or(false);
        if same {
            debug!("destination already archived: {}", dest.display());
            return Ok(CopiedFile {
                file_id: file.id,
                fingerprint: Some(fingerprint_hex.to_string()),
                archive_path: Some(dest),
                bytes_copied: 0,
                copy_strategy: strategy,
                copy_error: None,
            });
        }
        return Err(CoreError::ArchiveConflict { path: dest });
    }

    let tmp = parent.join(format!(".{fingerprint}.{}.tmp", file.extension));
    if tokio::fs::metadata(&tmp).await.is_ok() {
        // Leftover from an interrupted run; re-place from scratch
        let _ = tokio::fs::remove_file(&tmp).await;
    }

    let placed = match strategy {
        CopyStrategy::Hardlink => tokio::fs::hard_link(&file.original_path, &tmp)
            .await
            .map(|_| file.size)
            .map_err(|e| format!("hardlink failed: {e}")),
        CopyStrategy::Reflink => {
            let src = file.original_path.clone();
            let dst = tmp.clone();
            match tokio::task::spawn_blocking(move || reflink_copy::reflink(&src, &dst)).await {
                Ok(Ok(())) => Ok(file.size),
                Ok(Err(e)) => Err(format!("reflink failed: {e}")),
                Err(e) => Err(format!("reflink task failed: {e}")),
            }
        }
        CopyStrategy::Copy => stream_copy(&file.original_path, &tmp).await,
    };

    let bytes_copied = match placed {
        Ok(bytes) => bytes,
        Err(message) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            warn!("copy failed for {}: {}", file.original_path.display(), message);
            return Ok(failed(file.id, Some(fingerprint_hex), strategy, message));
        }
    };

    // Durability point: file bytes and the directory entry both reach disk
    // before the atomic rename publishes the destination.
    if let Err(e) = sync_file_and_parent(&tmp, &parent).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Ok(failed(file.id, Some(fingerprint_hex), strategy, format!("fsync failed: {e}")));
    }

    if cancel.is_cancelled() {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CoreError::Cancelled);
    }

    if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Ok(failed(file.id, Some(fingerprint_hex), strategy, format!("rename failed: {e}")));
    }

    Ok(CopiedFile {
        file_id: file.id,
        fingerprint: Some(fingerprint_hex.to_string()),
        archive_path: Some(dest),
        bytes_copied,
        copy_strategy: strategy,
        copy_error: None,
    })
}

fn failed(
    file_id: u64,
    fingerprint: Option<&str>,
    strategy: CopyStrategy,
    message: String,
) -> CopiedFile {
    CopiedFile {
        file_id,
        fingerprint: fingerprint.map(str::to_string),
        archive_path: None,
        bytes_copied: 0,
        copy_strategy: strategy,
        copy_error: Some(message),
    }
}

async fn stream_copy(src: &Path, dst: &Path) -> Result<u64, String> {
    let run = async {
        let mut source = tokio::fs::File::open(src).await?;
        let mut dest = tokio::fs::File::create(dst).await?;
        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut total = 0u64;
        loop {
            let bytes_read = source.read(&mut buffer).await?;
            if bytes_read == 0 {
                break;
            }
            dest.write_all(&buffer[..bytes_read]).await?;
            total += bytes_read as u64;
        }
        dest.flush().await?;
        Ok::<u64, std::io::Error>(total)
    };
    run.await.map_err(|e| format!("copy failed: {e}"))
}

async fn sync_file_and_parent(file: &Path, parent: &Path) -> std::io::Result<()> {
    let f = tokio::fs::File::open(file).await?;
    f.sync_all().await?;

    #[cfg(unix)]
    {
        let dir = tokio::fs::File::open(parent).await?;
        dir.sync_all().await?;
    }
    #[cfg(not(unix))]
    {
        let _ = parent;
    }
    Ok(())
}
