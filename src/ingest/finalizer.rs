//! Finalize stage
//!
//! One index transaction records every validated copy with its provenance
//! and classification flags plus the import summary. The bag regenerates,
//! and follow-up work (metadata, thumbnails, proxies, revalidation) is
//! enqueued with priorities and dependencies; the orchestrator never waits
//! on those jobs.

use super::progress::ProgressTracker;
use super::types::{CopyResult, HashResult, IngestOptions, IngestStage, ScanResult, ValidateResult};
use crate::domain::media::{HiddenReason, MediaKind};
use crate::error::{CoreError, CoreResult};
use crate::library::imports::ImportSummary;
use crate::library::media::NewMediaRow;
use crate::library::Library;
use crate::queue::handlers::{
    BagRefreshPayload, LivePhotoPayload, LocationStatsPayload, MetadataPayload, ProbePayload,
    ProxyPayload, ThumbVariant, ThumbnailPayload,
};
use crate::queue::{queues, JobPriority, NewJob};
use crate::services::bagit::{BagSummary, BagitService};
use crate::domain::location::Location;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct FinalizeOutcome {
    pub import_id: String,
    pub summary: ImportSummary,
    pub bag_summary: BagSummary,
    pub job_ids: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn finalize(
    library: &Library,
    location: &Location,
    session_id: &str,
    scan: &ScanResult,
    hashes: &HashResult,
    copies: &CopyResult,
    validations: &ValidateResult,
    options: &IngestOptions,
    progress: &ProgressTracker,
) -> CoreResult<FinalizeOutcome> {
    let scanned_by_id: HashMap<u64, _> = scan.files.iter().map(|f| (f.id, f)).collect();
    let valid_by_id: HashMap<u64, bool> = validations
        .files
        .iter()
        .map(|v| (v.file_id, v.valid))
        .collect();

    let mut rows = Vec::new();
    let mut summary = ImportSummary::default();

    for copied in &copies.files {
        if let Some(error) = &copied.copy_error {
            if error == "Duplicate" {
                summary.duplicates += 1;
            } else {
                summary.errors += 1;
            }
            continue;
        }
        let Some(archive_path) = &copied.archive_path else {
            continue;
        };
        if !valid_by_id.get(&copied.file_id).copied().unwrap_or(false) {
            summary.errors += 1;
            continue;
        }
        let file = scanned_by_id
            .get(&copied.file_id)
            .ok_or_else(|| CoreError::invalid_state("copy result without scan record"))?;
        let (Some(kind), Some(fingerprint)) = (file.kind, copied.fingerprint.as_deref()) else {
            continue;
        };

        // Metadata sidecars always archive hidden; a live-photo motion
        // half hides behind its still.
        let hidden_reason = if file.is_sidecar {
            Some(HiddenReason::MetadataSidecar)
        } else if file.should_hide && file.is_live_photo {
            Some(HiddenReason::LivePhoto)
        } else if file.should_hide {
            Some(HiddenReason::User)
        } else {
            None
        };

        match kind {
            MediaKind::Image => summary.image_count += 1,
            MediaKind::Video => summary.video_count += 1,
            MediaKind::Document => summary.document_count += 1,
            MediaKind::Map => summary.map_count += 1,
        }
        summary.bytes += file.size as i64;

        rows.push(NewMediaRow {
            kind,
            fingerprint: fingerprint.to_string(),
            original_filename: file.filename.clone(),
            archive_filename: format!("{fingerprint}.{}", file.extension),
            original_path: file.original_path.to_string_lossy().to_string(),
            archive_path: archive_path.to_string_lossy().to_string(),
            size_bytes: file.size as i64,
            hidden: hidden_reason.is_some(),
            hidden_reason,
            live_photo: file.is_live_photo,
        });
    }

    let import_id = library
        .record_ingest(
            session_id,
            &location.id,
            &copies.strategy.to_string(),
            &rows,
            &summary,
        )
        .await?;
    progress.emit(IngestStage::Finalize, 0.4);

    library.refresh_location_stats(&location.id).await?;

    let bag_summary = BagitService::write_bag(library, location).await?;
    progress.emit(IngestStage::Finalize, 0.7);

    let job_ids = enqueue_follow_ups(library, location, &rows, options).await?;

    progress.stage_done(IngestStage::Finalize);
    info!(
        "finalized session {session_id}: {} rows, {} duplicates, {} errors, Payload-Oxum {}",
        rows.len(),
        summary.duplicates,
        summary.errors,
        bag_summary.payload_oxum
    );

    Ok(FinalizeOutcome {
        import_id,
        summary,
        bag_summary,
        job_ids,
    })
}

/// Enqueue the background work for newly archived rows. Thumbnails depend
/// on metadata (orientation), posters and proxies on the probe; the bag
/// refresh chains behind any in-flight refresh for the same location.
async fn enqueue_follow_ups(
    library: &Library,
    location: &Location,
    rows: &[NewMediaRow],
    options: &IngestOptions,
) -> CoreResult<Vec<String>> {
    let queue = library.queue();
    let priority = options.priority();
    let mut job_ids = Vec::new();

    // First wave: extraction jobs whose ids gate the render jobs
    let mut extraction_jobs = Vec::new();
    for row in rows {
        match row.kind {
            MediaKind::Image => {
                extraction_jobs.push(NewJob::new(
                    queues::EXIFTOOL,
                    serde_json::to_value(MetadataPayload {
                        fingerprint: row.fingerprint.clone(),
                        archive_path: row.archive_path.clone().into(),
                        kind: MediaKind::Image,
                    })?,
                ).with_priority(priority));
            }
            MediaKind::Video => {
                extraction_jobs.push(NewJob::new(
                    queues::FFPROBE,
                    serde_json::to_value(ProbePayload {
                        fingerprint: row.fingerprint.clone(),
                        archive_path: row.archive_path.clone().into(),
                    })?,
                ).with_priority(priority));
            }
            MediaKind::Document => {
                extraction_jobs.push(NewJob::new(
                    queues::EXIFTOOL,
                    serde_json::to_value(MetadataPayload {
                        fingerprint: row.fingerprint.clone(),
                        archive_path: row.archive_path.clone().into(),
                        kind: MediaKind::Document,
                    })?,
                ).with_priority(priority));
            }
            MediaKind::Map => {}
        }
    }
    let extraction_ids = queue.enqueue_many(extraction_jobs).await?;
    job_ids.extend(extraction_ids.clone());

    // Second wave: renders gated on their extraction job
    let mut render_jobs = Vec::new();
    let mut extraction_iter = extraction_ids.iter();
    for row in rows {
        let parent = match row.kind {
            MediaKind::Image | MediaKind::Video | MediaKind::Document => {
                extraction_iter.next().cloned()
            }
            MediaKind::Map => None,
        };
        match row.kind {
            MediaKind::Image => {
                let parent = parent.ok_or_else(|| CoreError::invalid_state("missing exif job id"))?;
                for variant in [ThumbVariant::Thumbs, ThumbVariant::Preview] {
                    render_jobs.push(
                        NewJob::new(
                            queues::THUMBNAIL,
                            serde_json::to_value(ThumbnailPayload {
                                fingerprint: row.fingerprint.clone(),
                                archive_path: row.archive_path.clone().into(),
                                variant,
                            })?,
                        )
                        .with_priority(priority)
                        .depends_on(parent.clone()),
                    );
                }
            }
            MediaKind::Video => {
                let parent = parent.ok_or_else(|| CoreError::invalid_state("missing probe job id"))?;
                render_jobs.push(
                    NewJob::new(
                        queues::THUMBNAIL,
                        serde_json::to_value(ThumbnailPayload {
                            fingerprint: row.fingerprint.clone(),
                            archive_path: row.archive_path.clone().into(),
                            variant: ThumbVariant::Poster,
                        })?,
                    )
                    .with_priority(priority)
                    .depends_on(parent.clone()),
                );
                render_jobs.push(
                    NewJob::new(
                        queues::VIDEO_PROXY,
                        serde_json::to_value(ProxyPayload {
                            fingerprint: row.fingerprint.clone(),
                            archive_path: row.archive_path.clone().into(),
                        })?,
                    )
                    .with_priority(JobPriority::LOW)
                    .depends_on(parent),
                );
            }
            _ => {}
        }
    }
    job_ids.extend(queue.enqueue_many(render_jobs).await?);

    // Session-wide follow-ups
    let live_photo = NewJob::new(
        queues::LIVE_PHOTO,
        serde_json::to_value(LivePhotoPayload {
            location_id: location.id,
        })?,
    )
    .with_priority(JobPriority::LOW);
    job_ids.push(queue.enqueue(live_photo).await?);

    let stats = NewJob::new(
        queues::LOCATION_STATS,
        serde_json::to_value(LocationStatsPayload {
            location_id: location.id,
        })?,
    )
    .with_priority(JobPriority::BACKGROUND);
    job_ids.push(queue.enqueue(stats).await?);

    // One bag writer per location: chain behind any in-flight refresh
    let bag_payload = serde_json::to_value(BagRefreshPayload {
        location_id: location.id,
    })?;
    let mut bag_job = NewJob::new(queues::BAGIT, bag_payload.clone())
        .with_priority(JobPriority::BACKGROUND);
    if let Some(active) = queue.find_active(queues::BAGIT, &bag_payload).await? {
        bag_job = bag_job.depends_on(active);
    }
    job_ids.push(queue.enqueue(bag_job).await?);

    debug!("enqueued {} follow-up jobs", job_ids.len());
    Ok(job_ids)
}
