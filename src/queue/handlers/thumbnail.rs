//! Thumbnail, preview, and poster rendering (`thumbnail` queue)

use crate::queue::worker::{HandlerResult, JobHandler};
use crate::services::collaborators::Services;
use crate::shared::fingerprint::Fingerprint;
use crate::shared::paths::ThumbSize;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbVariant {
    /// Small and large thumbnails in one pass
    Thumbs,
    /// 1920px preview
    Preview,
    /// Video poster frame
    Poster,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailPayload {
    pub fingerprint: String,
    pub archive_path: PathBuf,
    pub variant: ThumbVariant,
}

pub struct ThumbnailHandler;

#[async_trait]
impl JobHandler for ThumbnailHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: ThumbnailPayload = serde_json::from_value(payload)?;
        let fingerprint = Fingerprint::parse(&payload.fingerprint)?;

        match payload.variant {
            ThumbVariant::Thumbs => {
                let sm = services
                    .thumbs
                    .render(&payload.archive_path, ThumbSize::Small.pixels(), &fingerprint)
                    .await?;
                let lg = services
                    .thumbs
                    .render(&payload.archive_path, ThumbSize::Large.pixels(), &fingerprint)
                    .await?;
                services
                    .library
                    .set_image_thumbs(
                        &payload.fingerprint,
                        Some(sm.to_string_lossy().to_string()),
                        Some(lg.to_string_lossy().to_string()),
                    )
                    .await?;
                Ok(json!({ "thumb_sm": sm, "thumb_lg": lg }))
            }
            ThumbVariant::Preview => {
                let preview = services
                    .thumbs
                    .render(&payload.archive_path, ThumbSize::Preview.pixels(), &fingerprint)
                    .await?;
                services
                    .library
                    .set_image_preview(&payload.fingerprint, preview.to_string_lossy().to_string())
                    .await?;
                Ok(json!({ "preview": preview }))
            }
            ThumbVariant::Poster => {
                let poster = services
                    .thumbs
                    .render(&payload.archive_path, ThumbSize::Preview.pixels(), &fingerprint)
                    .await?;
                services
                    .library
                    .set_video_poster(&payload.fingerprint, poster.to_string_lossy().to_string())
                    .await?;
                Ok(json!({ "poster": poster }))
            }
        }
    }
}
