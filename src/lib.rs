//! Curator Core
//!
//! A local-first archival ingest engine for a content-addressed media
//! archive. Operators point the engine at source files and a location; it
//! deduplicates, classifies, places bytes into a deterministic layout,
//! records provenance in SQLite, and keeps an RFC 8493 bag in every
//! location folder so the archive stays intelligible without the database.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ingest;
pub mod library;
pub mod queue;
pub mod services;
pub mod shared;

pub use config::AppConfig;
pub use error::{CoreError, CoreResult};
pub use ingest::{CopyStrategy, IngestEngine, IngestOptions, IngestReport, SessionStatus};
pub use library::Library;
pub use queue::{JobPriority, JobQueue, JobStatus, NewJob};
pub use services::{BagitService, Services};
pub use shared::{ArchivePaths, CancelToken, FileHasher, Fingerprint};
