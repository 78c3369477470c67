//! Ingest pipeline types
//!
//! Stage results are serde types: the orchestrator persists each one on the
//! session row as JSON so a later run can resume without redoing work.

use crate::domain::media::MediaKind;
use crate::queue::JobPriority;
use crate::shared::cancel::CancelToken;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Scanning,
    Hashing,
    Copying,
    Validating,
    Finalizing,
    Completed,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "scanning" => Some(Self::Scanning),
            "hashing" => Some(Self::Hashing),
            "copying" => Some(Self::Copying),
            "validating" => Some(Self::Validating),
            "finalizing" => Some(Self::Finalizing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Scanning => "scanning",
            Self::Hashing => "hashing",
            Self::Copying => "copying",
            Self::Validating => "validating",
            Self::Finalizing => "finalizing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The five pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStage {
    Scan,
    Hash,
    Copy,
    Validate,
    Finalize,
}

impl IngestStage {
    /// Stage checkpoint index stored on the session (1-based)
    pub fn index(&self) -> i32 {
        match self {
            Self::Scan => 1,
            Self::Hash => 2,
            Self::Copy => 3,
            Self::Validate => 4,
            Self::Finalize => 5,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Scan => SessionStatus::Scanning,
            Self::Hash => SessionStatus::Hashing,
            Self::Copy => SessionStatus::Copying,
            Self::Validate => SessionStatus::Validating,
            Self::Finalize => SessionStatus::Finalizing,
        }
    }
}

/// Placement strategy, probed once per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyStrategy {
    Hardlink,
    Reflink,
    Copy,
}

impl CopyStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hardlink" => Some(Self::Hardlink),
            "reflink" => Some(Self::Reflink),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }
}

impl fmt::Display for CopyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hardlink => "hardlink",
            Self::Reflink => "reflink",
            Self::Copy => "copy",
        };
        f.write_str(s)
    }
}

/// One file discovered by the scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Position in the scan, the join key across stage results
    pub id: u64,
    pub original_path: PathBuf,
    pub filename: String,
    pub extension: String,
    pub size: u64,
    /// The kind table this file lands in; `None` for unknown extensions
    pub kind: Option<MediaKind>,
    /// Unknown extension: carried through but never copied
    pub should_skip: bool,
    /// Hidden on insert (metadata sidecars, live-photo motion halves)
    pub should_hide: bool,
    /// Metadata sidecar (srt/lrf/thm/xmp/aae)
    pub is_sidecar: bool,
    /// Half of a still/motion pair detected in this scan
    pub is_live_photo: bool,
    pub modified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub total_files: u64,
    pub total_bytes: u64,
    pub estimated_duration_ms: u64,
}

/// Hash outcome for one scanned file, aligned by `file_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashedFile {
    pub file_id: u64,
    pub fingerprint: Option<String>,
    pub error: Option<String>,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashResult {
    pub files: Vec<HashedFile>,
}

/// Copy outcome for one scanned file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopiedFile {
    pub file_id: u64,
    pub fingerprint: Option<String>,
    pub archive_path: Option<PathBuf>,
    pub bytes_copied: u64,
    pub copy_strategy: CopyStrategy,
    pub copy_error: Option<String>,
}

impl CopiedFile {
    pub fn succeeded(&self) -> bool {
        self.archive_path.is_some() && self.copy_error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyResult {
    pub strategy: CopyStrategy,
    pub files: Vec<CopiedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedFile {
    pub file_id: u64,
    pub valid: bool,
    pub rolled_back: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResult {
    pub files: Vec<ValidatedFile>,
    pub valid_count: u64,
    pub invalid_count: u64,
}

/// Weighted overall progress snapshot
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub session_id: String,
    pub stage: IngestStage,
    pub stage_fraction: f32,
    /// Monotone in [0, 100]
    pub overall_percent: f32,
}

/// Per-file completion event from the hashing and copy stages
#[derive(Debug, Clone)]
pub struct FileCompleteEvent {
    pub file_id: u64,
    pub stage: IngestStage,
    pub fingerprint: Option<String>,
    pub archive_path: Option<PathBuf>,
    pub error: Option<String>,
}

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;
pub type FileCompleteFn = Arc<dyn Fn(FileCompleteEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Operator options for one import
#[derive(Clone, Default)]
pub struct IngestOptions {
    pub force_strategy: Option<CopyStrategy>,
    pub delete_originals: bool,
    /// Unlink destinations that fail post-copy validation (default on)
    pub auto_rollback: Option<bool>,
    /// Glob patterns; when set, only matching files are ingested
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Priority inherited by all follow-up jobs
    pub priority: Option<JobPriority>,
    pub cancel: Option<CancelToken>,
    pub on_progress: Option<ProgressFn>,
    pub on_file_complete: Option<FileCompleteFn>,
}

impl IngestOptions {
    pub fn auto_rollback(&self) -> bool {
        self.auto_rollback.unwrap_or(true)
    }

    pub fn priority(&self) -> JobPriority {
        self.priority.unwrap_or_default()
    }
}

/// Final report for a finished import
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub session_id: String,
    pub status: SessionStatus,
    pub strategy: Option<CopyStrategy>,
    pub total_files: u64,
    pub total_bytes: u64,
    pub files_copied: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub import_id: Option<String>,
}
