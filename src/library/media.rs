//! Media store: one table per kind, addressed by fingerprint

use super::Library;
use crate::domain::media::{HiddenReason, MediaKind};
use crate::error::CoreResult;
use crate::infrastructure::database::entities::{document, image, map_file, video};
use crate::services::collaborators::{ExtractedMetadata, ProbedVideo};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use std::collections::HashSet;
use uuid::Uuid;

/// Chunk size for `IN (...)` fingerprint probes
const IN_CHUNK: usize = 400;

/// A media row the finalizer is about to insert
#[derive(Debug, Clone)]
pub struct NewMediaRow {
    pub kind: MediaKind,
    pub fingerprint: String,
    pub original_filename: String,
    pub archive_filename: String,
    pub original_path: String,
    pub archive_path: String,
    pub size_bytes: i64,
    pub hidden: bool,
    pub hidden_reason: Option<HiddenReason>,
    pub live_photo: bool,
}

/// Kind-agnostic view of an archived file, used by bag generation and
/// location statistics
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub fingerprint: String,
    pub kind: MediaKind,
    pub archive_filename: String,
    pub archive_path: String,
    pub size_bytes: i64,
    pub hidden: bool,
}

impl Library {
    /// Which of the candidate fingerprints already exist in the kind's table
    pub async fn existing_fingerprints(
        &self,
        kind: MediaKind,
        candidates: &[String],
    ) -> CoreResult<HashSet<String>> {
        let mut found = HashSet::new();
        for chunk in candidates.chunks(IN_CHUNK) {
            let present: Vec<String> = match kind {
                MediaKind::Image => image::Entity::find()
                    .filter(image::Column::Fingerprint.is_in(chunk.to_vec()))
                    .all(self.conn())
                    .await?
                    .into_iter()
                    .map(|m| m.fingerprint)
                    .collect(),
                MediaKind::Video => video::Entity::find()
                    .filter(video::Column::Fingerprint.is_in(chunk.to_vec()))
                    .all(self.conn())
                    .await?
                    .into_iter()
                    .map(|m| m.fingerprint)
                    .collect(),
                MediaKind::Document => document::Entity::find()
                    .filter(document::Column::Fingerprint.is_in(chunk.to_vec()))
                    .all(self.conn())
                    .await?
                    .into_iter()
                    .map(|m| m.fingerprint)
                    .collect(),
                MediaKind::Map => map_file::Entity::find()
                    .filter(map_file::Column::Fingerprint.is_in(chunk.to_vec()))
                    .all(self.conn())
                    .await?
                    .into_iter()
                    .map(|m| m.fingerprint)
                    .collect(),
            };
            found.extend(present);
        }
        Ok(found)
    }

    /// All archived files of a location, across the four kind tables
    pub async fn media_for_location(&self, location_id: &Uuid) -> CoreResult<Vec<MediaEntry>> {
        let id = location_id.to_string();
        let mut entries = Vec::new();

        for m in image::Entity::find()
            .filter(image::Column::LocationId.eq(&id))
            .all(self.conn())
            .await?
        {
            entries.push(MediaEntry {
                fingerprint: m.fingerprint,
                kind: MediaKind::Image,
                archive_filename: m.archive_filename,
                archive_path: m.archive_path,
                size_bytes: m.size_bytes,
                hidden: m.hidden,
            });
        }
        for m in video::Entity::find()
            .filter(video::Column::LocationId.eq(&id))
            .all(self.conn())
            .await?
        {
            entries.push(MediaEntry {
                fingerprint: m.fingerprint,
                kind: MediaKind::Video,
                archive_filename: m.archive_filename,
                archive_path: m.archive_path,
                size_bytes: m.size_bytes,
                hidden: m.hidden,
            });
        }
        for m in document::Entity::find()
            .filter(document::Column::LocationId.eq(&id))
            .all(self.conn())
            .await?
        {
            entries.push(MediaEntry {
                fingerprint: m.fingerprint,
                kind: MediaKind::Document,
                archive_filename: m.archive_filename,
                archive_path: m.archive_path,
                size_bytes: m.size_bytes,
                hidden: m.hidden,
            });
        }
        for m in map_file::Entity::find()
            .filter(map_file::Column::LocationId.eq(&id))
            .all(self.conn())
            .await?
        {
            entries.push(MediaEntry {
                fingerprint: m.fingerprint,
                kind: MediaKind::Map,
                archive_filename: m.archive_filename,
                archive_path: m.archive_path,
                size_bytes: m.size_bytes,
                hidden: m.hidden,
            });
        }

        entries.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));
        Ok(entries)
    }

    pub async fn get_image(&self, fingerprint: &str) -> CoreResult<Option<image::Model>> {
        Ok(image::Entity::find_by_id(fingerprint).one(self.conn()).await?)
    }

    pub async fn get_video(&self, fingerprint: &str) -> CoreResult<Option<video::Model>> {
        Ok(video::Entity::find_by_id(fingerprint).one(self.conn()).await?)
    }

    pub async fn get_document(&self, fingerprint: &str) -> CoreResult<Option<document::Model>> {
        Ok(document::Entity::find_by_id(fingerprint).one(self.conn()).await?)
    }

    pub async fn images_for_location(&self, location_id: &Uuid) -> CoreResult<Vec<image::Model>> {
        Ok(image::Entity::find()
            .filter(image::Column::LocationId.eq(location_id.to_string()))
            .all(self.conn())
            .await?)
    }

    pub async fn videos_for_location(&self, location_id: &Uuid) -> CoreResult<Vec<video::Model>> {
        Ok(video::Entity::find()
            .filter(video::Column::LocationId.eq(location_id.to_string()))
            .all(self.conn())
            .await?)
    }

    /// Write extractor output back onto an image row
    pub async fn apply_image_metadata(
        &self,
        fingerprint: &str,
        meta: &ExtractedMetadata,
    ) -> CoreResult<()> {
        let model = image::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            width: Set(meta.width.map(|w| w as i32)),
            height: Set(meta.height.map(|h| h as i32)),
            date_taken: Set(meta.date_taken),
            camera_make: Set(meta.camera_make.clone()),
            camera_model: Set(meta.camera_model.clone()),
            gps_lat: Set(meta.gps.map(|g| g.0)),
            gps_lng: Set(meta.gps.map(|g| g.1)),
            raw_metadata: Set(Some(meta.raw.clone())),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    /// Write prober output back onto a video row
    pub async fn apply_video_probe(
        &self,
        fingerprint: &str,
        probe: &ProbedVideo,
    ) -> CoreResult<()> {
        let model = video::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            width: Set(probe.width.map(|w| w as i32)),
            height: Set(probe.height.map(|h| h as i32)),
            duration_secs: Set(probe.duration_secs),
            codec: Set(probe.codec.clone()),
            fps: Set(probe.fps),
            gps_lat: Set(probe.gps.map(|g| g.0)),
            gps_lng: Set(probe.gps.map(|g| g.1)),
            raw_metadata: Set(Some(probe.raw.clone())),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    /// Documents keep the raw extractor blob only
    pub async fn apply_document_metadata(
        &self,
        fingerprint: &str,
        raw: &serde_json::Value,
    ) -> CoreResult<()> {
        let model = document::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            raw_metadata: Set(Some(raw.clone())),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    pub async fn set_image_thumbs(
        &self,
        fingerprint: &str,
        thumb_sm: Option<String>,
        thumb_lg: Option<String>,
    ) -> CoreResult<()> {
        let model = image::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            thumb_sm_path: Set(thumb_sm),
            thumb_lg_path: Set(thumb_lg),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    pub async fn set_image_preview(&self, fingerprint: &str, preview: String) -> CoreResult<()> {
        let model = image::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            preview_path: Set(Some(preview)),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    pub async fn set_video_poster(&self, fingerprint: &str, poster: String) -> CoreResult<()> {
        let model = video::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            poster_path: Set(Some(poster)),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    pub async fn set_video_proxy(&self, fingerprint: &str, proxy: String) -> CoreResult<()> {
        let model = video::ActiveModel {
            fingerprint: Set(fingerprint.to_string()),
            proxy_path: Set(Some(proxy)),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    /// Hide a record with a reason
    pub async fn hide_media(
        &self,
        kind: MediaKind,
        fingerprint: &str,
        reason: HiddenReason,
    ) -> CoreResult<()> {
        match kind {
            MediaKind::Image => {
                image::ActiveModel {
                    fingerprint: Set(fingerprint.to_string()),
                    hidden: Set(true),
                    hidden_reason: Set(Some(reason.to_string())),
                    ..Default::default()
                }
                .update(self.conn())
                .await?;
            }
            MediaKind::Video => {
                video::ActiveModel {
                    fingerprint: Set(fingerprint.to_string()),
                    hidden: Set(true),
                    hidden_reason: Set(Some(reason.to_string())),
                    ..Default::default()
                }
                .update(self.conn())
                .await?;
            }
            MediaKind::Document => {
                document::ActiveModel {
                    fingerprint: Set(fingerprint.to_string()),
                    hidden: Set(true),
                    hidden_reason: Set(Some(reason.to_string())),
                    ..Default::default()
                }
                .update(self.conn())
                .await?;
            }
            MediaKind::Map => {
                map_file::ActiveModel {
                    fingerprint: Set(fingerprint.to_string()),
                    hidden: Set(true),
                    hidden_reason: Set(Some(reason.to_string())),
                    ..Default::default()
                }
                .update(self.conn())
                .await?;
            }
        }
        Ok(())
    }

    /// Flag a resolved still/motion pair: both records carry the live-photo
    /// flag, the motion half is hidden.
    pub async fn mark_live_photo_pair(
        &self,
        image_fingerprint: &str,
        video_fingerprint: &str,
    ) -> CoreResult<()> {
        image::ActiveModel {
            fingerprint: Set(image_fingerprint.to_string()),
            live_photo: Set(true),
            ..Default::default()
        }
        .update(self.conn())
        .await?;

        video::ActiveModel {
            fingerprint: Set(video_fingerprint.to_string()),
            live_photo: Set(true),
            hidden: Set(true),
            hidden_reason: Set(Some(HiddenReason::LivePhoto.to_string())),
            ..Default::default()
        }
        .update(self.conn())
        .await?;
        Ok(())
    }

}
