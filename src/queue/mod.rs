//! Durable job queue and worker runtime

pub mod error;
pub mod handlers;
pub mod queue;
pub mod types;
pub mod worker;

pub use error::{QueueError, QueueResult};
pub use queue::{backoff_ms, JobQueue, QueueStats};
pub use types::{queues, JobPriority, JobStatus, NewJob};
pub use worker::{spawn_all, HandlerError, JobHandler, Worker};
