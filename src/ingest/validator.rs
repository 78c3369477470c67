//! Validate stage
//!
//! Re-stats and re-fingerprints every placed destination. Disagreement
//! marks the file invalid and, with auto-rollback on (the default), unlinks
//! the bad destination so the archive never holds bytes the index cannot
//! vouch for.

use super::progress::ProgressTracker;
use super::types::{CopyResult, IngestStage, ScanResult, ValidateResult, ValidatedFile};
use crate::error::{CoreError, CoreResult};
use crate::shared::cancel::CancelToken;
use crate::shared::fingerprint::FileHasher;
use std::collections::HashMap;
use tracing::warn;

pub(crate) async fn validate_copies(
    scan: &ScanResult,
    copies: &CopyResult,
    auto_rollback: bool,
    cancel: &CancelToken,
    progress: &ProgressTracker,
) -> CoreResult<ValidateResult> {
    let size_by_id: HashMap<u64, u64> = scan.files.iter().map(|f| (f.id, f.size)).collect();
    let hasher = FileHasher::new();
    let total = copies.files.len().max(1);

    let mut files = Vec::with_capacity(copies.files.len());
    let mut valid_count = 0u64;
    let mut invalid_count = 0u64;

    for (index, copied) in copies.files.iter().enumerate() {
        cancel.check()?;

        let Some(archive_path) = &copied.archive_path else {
            progress.emit(IngestStage::Validate, (index + 1) as f32 / total as f32);
            continue;
        };

        let expected_size = size_by_id.get(&copied.file_id).copied().unwrap_or(0);
        let expected_fp = copied.fingerprint.as_deref().unwrap_or_default();

        let mut reason = None;
        match tokio::fs::metadata(archive_path).await {
            Ok(meta) if meta.len() != expected_size => {
                reason = Some(format!(
                    "size mismatch: expected {expected_size}, found {}",
                    meta.len()
                ));
            }
            Ok(_) => match hasher.hash_file(archive_path).await {
                Ok(fp) if fp.as_str() != expected_fp => {
                    reason = Some(format!(
                        "fingerprint mismatch: expected {expected_fp}, found {fp}"
                    ));
                }
                Ok(_) => {}
                Err(e) => reason = Some(format!("re-hash failed: {e}")),
            },
            Err(e) => {
                reason = Some(format!("cannot stat destination: {e}"));
            }
        }

        let valid = reason.is_none();
        let mut rolled_back = false;
        let error = reason.map(|reason| CoreError::ValidationFailed {
            path: archive_path.clone(),
            reason,
        });
        if let Some(error) = &error {
            warn!("{error}");
            if auto_rollback {
                rolled_back = tokio::fs::remove_file(archive_path).await.is_ok();
            }
            invalid_count += 1;
        } else {
            valid_count += 1;
        }

        files.push(ValidatedFile {
            file_id: copied.file_id,
            valid,
            rolled_back,
            error: error.map(|e| e.to_string()),
        });
        progress.emit(IngestStage::Validate, (index + 1) as f32 / total as f32);
    }

    progress.stage_done(IngestStage::Validate);
    Ok(ValidateResult {
        files,
        valid_count,
        invalid_count,
    })
}
