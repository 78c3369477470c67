//! Location counter refresh (`location-stats` queue)

use crate::queue::worker::{HandlerResult, JobHandler};
use crate::services::collaborators::Services;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationStatsPayload {
    pub location_id: Uuid,
}

pub struct LocationStatsHandler;

#[async_trait]
impl JobHandler for LocationStatsHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: LocationStatsPayload = serde_json::from_value(payload)?;
        services
            .library
            .refresh_location_stats(&payload.location_id)
            .await?;
        Ok(json!({ "location_id": payload.location_id }))
    }
}
