//! Video proxy encoding (`video-proxy` queue)

use crate::queue::worker::{HandlerResult, JobHandler};
use crate::services::collaborators::Services;
use crate::shared::fingerprint::Fingerprint;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyPayload {
    pub fingerprint: String,
    pub archive_path: PathBuf,
}

pub struct ProxyHandler;

#[async_trait]
impl JobHandler for ProxyHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: ProxyPayload = serde_json::from_value(payload)?;
        let fingerprint = Fingerprint::parse(&payload.fingerprint)?;

        let encoded = services
            .proxy
            .encode(&payload.archive_path, &fingerprint)
            .await?;
        services
            .library
            .set_video_proxy(
                &payload.fingerprint,
                encoded.proxy_path.to_string_lossy().to_string(),
            )
            .await?;

        Ok(json!({
            "proxy_path": encoded.proxy_path,
            "width": encoded.width,
            "height": encoded.height,
        }))
    }
}
