//! Worker runtime
//!
//! A worker binds to one named queue and loops `get_next` → handler →
//! `complete`/`fail`. Handlers are pure functions of `(payload, services)`
//! and must be idempotent: a crash between handler completion and
//! `complete()` replays the job.

use super::handlers;
use super::queue::JobQueue;
use crate::services::collaborators::Services;
use crate::shared::cancel::CancelToken;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};


#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(msg: impl std::fmt::Display) -> Self {
        Self(msg.to_string())
    }
}

impl From<crate::error::CoreError> for HandlerError {
    fn from(e: crate::error::CoreError) -> Self {
        Self(e.to_string())
    }
}

impl From<crate::services::collaborators::CollaboratorError> for HandlerError {
    fn from(e: crate::services::collaborators::CollaboratorError) -> Self {
        Self(e.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        Self(format!("payload: {e}"))
    }
}

pub type HandlerResult = Result<JsonValue, HandlerError>;

/// One background job implementation
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, payload: JsonValue, services: &Services) -> HandlerResult;
}

pub struct Worker {
    id: String,
    queue_name: String,
    queue: JobQueue,
    handler: Arc<dyn JobHandler>,
    services: Arc<Services>,
    poll_interval: Duration,
    cancel: CancelToken,
}

impl Worker {
    /// Build a worker for one of the named queues
    pub fn bind(
        queue_name: &str,
        services: Arc<Services>,
        cancel: CancelToken,
    ) -> Option<Self> {
        let handler = handlers::handler_for(queue_name)?;
        Some(Self {
            id: format!("{}-{}", queue_name, &uuid::Uuid::new_v4().to_string()[..8]),
            queue_name: queue_name.to_string(),
            queue: services.library.queue(),
            handler,
            poll_interval: services.library.config().poll_interval(),
            services,
            cancel,
        })
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    pub async fn run(self) {
        info!("worker {} polling {}", self.id, self.queue_name);
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.queue.get_next(&self.queue_name, &self.id).await {
                Ok(Some(job)) => {
                    let payload: JsonValue =
                        serde_json::from_str(&job.payload).unwrap_or(JsonValue::Null);
                    debug!("worker {} running job {}", self.id, job.id);

                    match self.handler.run(payload, &self.services).await {
                        Ok(result) => {
                            if let Err(e) = self.queue.complete(&job.id, Some(result)).await {
                                error!("failed to complete job {}: {}", job.id, e);
                            }
                        }
                        Err(handler_error) => {
                            if let Err(e) = self.queue.fail(&job.id, &handler_error.0).await {
                                error!("failed to record failure for {}: {}", job.id, e);
                            }
                        }
                    }
                }
                Ok(None) => {
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                Err(e) => {
                    error!("worker {} poll error: {}", self.id, e);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
        info!("worker {} stopped", self.id);
    }
}

/// Spawn `per_queue` workers for every named queue
pub fn spawn_all(
    services: Arc<Services>,
    cancel: CancelToken,
    per_queue: usize,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();
    for &queue_name in super::types::queues::ALL {
        for _ in 0..per_queue.max(1) {
            if let Some(worker) = Worker::bind(queue_name, services.clone(), cancel.child()) {
                handles.push(worker.spawn());
            }
        }
    }
    handles
}
