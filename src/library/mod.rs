//! Library facade
//!
//! Owns the database, the config, and the path service. All reads and
//! writes of archive records go through the typed store methods spread
//! across this module's submodules; the filesystem stays the canonical
//! owner of payload bytes.

pub mod imports;
pub mod locations;
pub mod media;
pub mod reference;
pub mod sessions;
pub mod settings;

pub use media::MediaEntry;

use crate::config::AppConfig;
use crate::error::CoreResult;
use crate::infrastructure::database::Database;
use crate::queue::JobQueue;
use crate::shared::paths::ArchivePaths;
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::info;

pub struct Library {
    config: AppConfig,
    db: Database,
    paths: ArchivePaths,
}

impl Library {
    /// Open (or create) the archive library described by the config
    pub async fn open(config: AppConfig) -> CoreResult<Self> {
        config.ensure_directories()?;
        let db = Database::open(&config.database_path()).await?;
        let paths = ArchivePaths::new(config.archive_root.clone());
        info!("Library open at {}", config.archive_root.display());
        Ok(Self { config, db, paths })
    }

    pub fn conn(&self) -> &DatabaseConnection {
        self.db.conn()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn paths(&self) -> &ArchivePaths {
        &self.paths
    }

    /// Handle on the durable job queue backed by this library's database
    pub fn queue(&self) -> JobQueue {
        JobQueue::new(
            self.db.conn().clone(),
            Duration::from_secs(self.config.stale_lock_timeout_secs),
        )
    }
}
