//! Bag refresh and revalidation (`bagit` queue)
//!
//! All bag writes are routed through this queue; chaining each refresh to
//! the previous in-flight job keeps one writer per `_archive/` folder.

use crate::queue::worker::{HandlerResult, JobHandler};
use crate::services::bagit::BagitService;
use crate::services::collaborators::Services;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagRefreshPayload {
    pub location_id: Uuid,
}

pub struct BagRefreshHandler;

#[async_trait]
impl JobHandler for BagRefreshHandler {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult {
        let payload: BagRefreshPayload = serde_json::from_value(payload)?;
        let library = &services.library;
        let location = library.require_location(&payload.location_id).await?;

        let summary = BagitService::write_bag(library, &location).await?;
        let outcome = BagitService::validate(library, &location).await?;

        Ok(json!({
            "payload_oxum": summary.payload_oxum,
            "status": outcome.status.to_string(),
        }))
    }
}
