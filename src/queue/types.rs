//! Core types for the job queue

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Current status of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be claimed
    Pending,
    /// Leased by a worker
    Processing,
    /// Finished successfully
    Completed,
    /// Failed; may still be retried
    Failed,
    /// Exceeded its retry budget and moved to the dead-letter queue
    Dead,
}

impl JobStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "dead" => Some(Self::Dead),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Dead)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Dead => "dead",
        };
        f.write_str(s)
    }
}

/// Priority level for job execution; higher runs sooner
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobPriority(pub i32);

impl JobPriority {
    pub const CRITICAL: Self = Self(100);
    pub const HIGH: Self = Self(50);
    pub const NORMAL: Self = Self(10);
    pub const LOW: Self = Self(1);
    pub const BACKGROUND: Self = Self(0);
}

impl Default for JobPriority {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Named queues consumed by the worker runtime
pub mod queues {
    pub const EXIFTOOL: &str = "exiftool";
    pub const FFPROBE: &str = "ffprobe";
    pub const THUMBNAIL: &str = "thumbnail";
    pub const VIDEO_PROXY: &str = "video-proxy";
    pub const LIVE_PHOTO: &str = "live-photo";
    pub const BAGIT: &str = "bagit";
    pub const LOCATION_STATS: &str = "location-stats";

    pub const ALL: &[&str] = &[
        EXIFTOOL,
        FFPROBE,
        THUMBNAIL,
        VIDEO_PROXY,
        LIVE_PHOTO,
        BAGIT,
        LOCATION_STATS,
    ];
}

/// A job to be enqueued
#[derive(Debug, Clone)]
pub struct NewJob {
    pub queue: String,
    pub priority: JobPriority,
    pub payload: JsonValue,
    pub depends_on: Option<String>,
    pub max_attempts: i32,
}

impl NewJob {
    pub fn new(queue: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            queue: queue.into(),
            priority: JobPriority::default(),
            payload,
            depends_on: None,
            max_attempts: 3,
        }
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on(mut self, job_id: impl Into<String>) -> Self {
        self.depends_on = Some(job_id.into());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}
