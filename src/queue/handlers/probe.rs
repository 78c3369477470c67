//! Video probe handler (`ffprobe` queue)

use crate::queue::worker::{HandlerResult, JobHandler};
use crate::services::collaborators::Services;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbePayload {
    pub fingerprint: String,
    pub archive_path: PathBuf,
}

pub struct ProbeHandler;

#[async_trait]
impl JobHandler for ProbeHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: ProbePayload = serde_json::from_value(payload)?;
        let probe = services.prober.probe(&payload.archive_path).await?;

        services
            .library
            .apply_video_probe(&payload.fingerprint, &probe)
            .await?;

        Ok(json!({
            "fingerprint": payload.fingerprint,
            "duration_secs": probe.duration_secs,
            "codec": probe.codec,
        }))
    }
}
