//! Metadata extraction handler (`exiftool` queue)

use crate::domain::media::MediaKind;
use crate::queue::worker::{HandlerError, HandlerResult, JobHandler};
use crate::services::collaborators::Services;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataPayload {
    pub fingerprint: String,
    pub archive_path: PathBuf,
    pub kind: MediaKind,
}

pub struct MetadataHandler;

#[async_trait]
impl JobHandler for MetadataHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: MetadataPayload = serde_json::from_value(payload)?;
        let meta = services.metadata.extract(&payload.archive_path).await?;

        match payload.kind {
            MediaKind::Image => {
                services
                    .library
                    .apply_image_metadata(&payload.fingerprint, &meta)
                    .await?;
            }
            MediaKind::Document => {
                services
                    .library
                    .apply_document_metadata(&payload.fingerprint, &meta.raw)
                    .await?;
            }
            other => {
                return Err(HandlerError::new(format!(
                    "metadata extraction does not apply to {other}"
                )));
            }
        }

        Ok(json!({
            "fingerprint": payload.fingerprint,
            "width": meta.width,
            "height": meta.height,
        }))
    }
}
