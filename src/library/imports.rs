//! Finalize-time writes: media rows and the import summary
//!
//! Everything a successful session adds to the index lands in one
//! transaction; nothing downstream ever sees a half-finalized import.

use super::media::NewMediaRow;
use super::Library;
use crate::domain::media::MediaKind;
use crate::error::CoreResult;
use crate::infrastructure::database::entities::{document, image, import, map_file, video};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use uuid::Uuid;

/// Per-kind tallies for one finished session
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub image_count: i64,
    pub video_count: i64,
    pub document_count: i64,
    pub map_count: i64,
    pub bytes: i64,
    pub duplicates: i64,
    pub errors: i64,
}

impl Library {
    /// Insert all media rows of a finished session plus its import summary
    /// in a single transaction. Returns the import id.
    pub async fn record_ingest(
        &self,
        session_id: &str,
        location_id: &Uuid,
        copy_strategy: &str,
        rows: &[NewMediaRow],
        summary: &ImportSummary,
    ) -> CoreResult<String> {
        let now = Utc::now();
        let imported_by = self.config().importer.clone();
        let location = location_id.to_string();

        let txn = self.conn().begin().await?;
        for row in rows {
            let hidden_reason = row.hidden_reason.map(|r| r.to_string());
            match row.kind {
                MediaKind::Image => {
                    image::ActiveModel {
                        fingerprint: Set(row.fingerprint.clone()),
                        original_filename: Set(row.original_filename.clone()),
                        archive_filename: Set(row.archive_filename.clone()),
                        original_path: Set(row.original_path.clone()),
                        archive_path: Set(row.archive_path.clone()),
                        location_id: Set(location.clone()),
                        sublocation_id: Set(None),
                        imported_by: Set(imported_by.clone()),
                        imported_at: Set(now),
                        size_bytes: Set(row.size_bytes),
                        width: Set(None),
                        height: Set(None),
                        date_taken: Set(None),
                        camera_make: Set(None),
                        camera_model: Set(None),
                        gps_lat: Set(None),
                        gps_lng: Set(None),
                        thumb_sm_path: Set(None),
                        thumb_lg_path: Set(None),
                        preview_path: Set(None),
                        hidden: Set(row.hidden),
                        hidden_reason: Set(hidden_reason),
                        live_photo: Set(row.live_photo),
                        contributed: Set(false),
                        contribution_source: Set(None),
                        xmp_synced: Set(false),
                        raw_metadata: Set(None),
                    }
                    .insert(&txn)
                    .await?;
                }
                MediaKind::Video => {
                    video::ActiveModel {
                        fingerprint: Set(row.fingerprint.clone()),
                        original_filename: Set(row.original_filename.clone()),
                        archive_filename: Set(row.archive_filename.clone()),
                        original_path: Set(row.original_path.clone()),
                        archive_path: Set(row.archive_path.clone()),
                        location_id: Set(location.clone()),
                        sublocation_id: Set(None),
                        imported_by: Set(imported_by.clone()),
                        imported_at: Set(now),
                        size_bytes: Set(row.size_bytes),
                        width: Set(None),
                        height: Set(None),
                        duration_secs: Set(None),
                        codec: Set(None),
                        fps: Set(None),
                        date_taken: Set(None),
                        gps_lat: Set(None),
                        gps_lng: Set(None),
                        poster_path: Set(None),
                        proxy_path: Set(None),
                        hidden: Set(row.hidden),
                        hidden_reason: Set(hidden_reason),
                        live_photo: Set(row.live_photo),
                        contributed: Set(false),
                        contribution_source: Set(None),
                        xmp_synced: Set(false),
                        raw_metadata: Set(None),
                    }
                    .insert(&txn)
                    .await?;
                }
                MediaKind::Document => {
                    document::ActiveModel {
                        fingerprint: Set(row.fingerprint.clone()),
                        original_filename: Set(row.original_filename.clone()),
                        archive_filename: Set(row.archive_filename.clone()),
                        original_path: Set(row.original_path.clone()),
                        archive_path: Set(row.archive_path.clone()),
                        location_id: Set(location.clone()),
                        sublocation_id: Set(None),
                        imported_by: Set(imported_by.clone()),
                        imported_at: Set(now),
                        size_bytes: Set(row.size_bytes),
                        page_count: Set(None),
                        hidden: Set(row.hidden),
                        hidden_reason: Set(hidden_reason),
                        contributed: Set(false),
                        contribution_source: Set(None),
                        xmp_synced: Set(false),
                        raw_metadata: Set(None),
                    }
                    .insert(&txn)
                    .await?;
                }
                MediaKind::Map => {
                    map_file::ActiveModel {
                        fingerprint: Set(row.fingerprint.clone()),
                        original_filename: Set(row.original_filename.clone()),
                        archive_filename: Set(row.archive_filename.clone()),
                        original_path: Set(row.original_path.clone()),
                        archive_path: Set(row.archive_path.clone()),
                        location_id: Set(location.clone()),
                        sublocation_id: Set(None),
                        imported_by: Set(imported_by.clone()),
                        imported_at: Set(now),
                        size_bytes: Set(row.size_bytes),
                        point_count: Set(None),
                        hidden: Set(row.hidden),
                        hidden_reason: Set(hidden_reason),
                        contributed: Set(false),
                        contribution_source: Set(None),
                        xmp_synced: Set(false),
                        raw_metadata: Set(None),
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        let import_id = Uuid::new_v4().to_string();
        import::ActiveModel {
            id: Set(import_id.clone()),
            session_id: Set(session_id.to_string()),
            location_id: Set(location),
            imported_by: Set(imported_by),
            image_count: Set(summary.image_count),
            video_count: Set(summary.video_count),
            document_count: Set(summary.document_count),
            map_count: Set(summary.map_count),
            bytes: Set(summary.bytes),
            duplicates: Set(summary.duplicates),
            errors: Set(summary.errors),
            copy_strategy: Set(copy_strategy.to_string()),
            finished_at: Set(now),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        Ok(import_id)
    }

    pub async fn imports_for_location(&self, location_id: &Uuid) -> CoreResult<Vec<import::Model>> {
        Ok(import::Entity::find()
            .filter(import::Column::LocationId.eq(location_id.to_string()))
            .all(self.conn())
            .await?)
    }
}
