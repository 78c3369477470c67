//! Live-photo pairing (`live-photo` queue)
//!
//! Re-resolves still/motion pairs inside a location once real capture
//! timestamps are available. The scanner's mtime-based pairing catches most
//! pairs during ingest; this pass settles the rest after metadata
//! extraction.

use crate::queue::worker::{HandlerResult, JobHandler};
use crate::services::collaborators::Services;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum capture-time distance for a still/motion pair
const PAIR_WINDOW_SECS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivePhotoPayload {
    pub location_id: Uuid,
}

pub struct LivePhotoHandler;

fn stem(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
        .to_ascii_lowercase()
}

#[async_trait]
impl JobHandler for LivePhotoHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: LivePhotoPayload = serde_json::from_value(payload)?;
        let library = &services.library;

        let images = library.images_for_location(&payload.location_id).await?;
        let videos = library.videos_for_location(&payload.location_id).await?;

        let mut images_by_stem = HashMap::new();
        for image in &images {
            images_by_stem.insert(stem(&image.original_filename), image);
        }

        let mut paired = 0usize;
        for video in &videos {
            if video.live_photo {
                continue;
            }
            let Some(image) = images_by_stem.get(&stem(&video.original_filename)) else {
                continue;
            };
            let close_capture = match (image.date_taken, video.date_taken) {
                (Some(a), Some(b)) => (a - b).num_seconds().abs() <= PAIR_WINDOW_SECS,
                _ => false,
            };
            if close_capture {
                library
                    .mark_live_photo_pair(&image.fingerprint, &video.fingerprint)
                    .await?;
                paired += 1;
            }
        }

        Ok(json!({ "paired": paired }))
    }
}
