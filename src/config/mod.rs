//! Application configuration

pub mod migration;

pub use migration::Migrate;

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config filename inside the archive root
const CONFIG_FILE: &str = "curator.json";

/// Current config schema version
const CONFIG_VERSION: u32 = 2;

fn default_poll_interval_ms() -> u64 {
    500
}

/// Default archive location when the operator names none
pub fn default_archive_root() -> CoreResult<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join("curator-archive"))
        .ok_or_else(|| CoreError::config("no home directory; pass an archive root explicitly"))
}

/// Main application configuration, persisted as JSON next to the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config schema version
    pub version: u32,

    /// Archive root directory
    pub archive_root: PathBuf,

    /// Database filename, relative to the archive root
    pub database_file: String,

    /// Number of queue workers the CLI spawns
    pub worker_count: usize,

    /// Seconds before a worker lease is considered stale. Treated as a
    /// floor: raise it when handlers (proxy encodes) can run longer.
    pub stale_lock_timeout_secs: u64,

    /// Milliseconds an idle worker sleeps between queue polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Override for hash concurrency; defaults to cpu count minus one
    pub hash_concurrency: Option<usize>,

    /// `Source-Organization` written into bag-info.txt
    pub source_organization: String,

    /// Importer identity recorded on media provenance
    pub importer: String,
}

impl AppConfig {
    /// Load configuration from the default archive root
    pub fn load() -> CoreResult<Self> {
        let archive_root = default_archive_root()?;
        Self::load_from(&archive_root)
    }

    /// Load configuration from a specific archive root
    pub fn load_from(archive_root: &Path) -> CoreResult<Self> {
        let config_path = archive_root.join(CONFIG_FILE);
        if !config_path.exists() {
            return Err(CoreError::config(format!(
                "no config at {}",
                config_path.display()
            )));
        }

        info!("Loading config from {:?}", config_path);
        let json = fs::read_to_string(&config_path)?;
        let mut config: AppConfig = serde_json::from_str(&json)?;

        if config.version > Self::target_version() {
            return Err(CoreError::config(format!(
                "config version {} is newer than supported {}",
                config.version,
                Self::target_version()
            )));
        }
        if config.needs_migration() {
            info!(
                "Migrating config from v{} to v{}",
                config.version,
                Self::target_version()
            );
            config.migrate()?;
            config.save()?;
        }

        Ok(config)
    }

    /// Load configuration, creating a default when absent
    pub fn load_or_create(archive_root: &Path) -> CoreResult<Self> {
        Self::load_from(archive_root).or_else(|_| {
            warn!("No config found, creating default under {:?}", archive_root);
            let config = Self::default_with_root(archive_root);
            config.save()?;
            Ok(config)
        })
    }

    /// Default configuration rooted at the given archive directory
    pub fn default_with_root(archive_root: impl Into<PathBuf>) -> Self {
        Self {
            version: CONFIG_VERSION,
            archive_root: archive_root.into(),
            database_file: "curator.db".to_string(),
            worker_count: 2,
            stale_lock_timeout_secs: 300,
            poll_interval_ms: default_poll_interval_ms(),
            hash_concurrency: None,
            source_organization: "Curator Archive".to_string(),
            importer: whoami(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.archive_root)?;
        let config_path = self.archive_root.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, json)?;
        Ok(())
    }

    /// Ensure the archive skeleton exists: root, location tree, and the
    /// bucketed artifact caches
    pub fn ensure_directories(&self) -> CoreResult<()> {
        fs::create_dir_all(&self.archive_root)?;
        fs::create_dir_all(self.archive_root.join("locations"))?;
        for cache in [".thumbnails", ".previews", ".posters", ".video-proxies"] {
            fs::create_dir_all(self.archive_root.join(cache))?;
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.archive_root.join(&self.database_file)
    }

    pub fn hash_concurrency(&self) -> usize {
        self.hash_concurrency
            .unwrap_or_else(|| num_cpus::get().saturating_sub(1))
            .max(1)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let archive_root = default_archive_root().unwrap_or_else(|_| PathBuf::from("."));
        Self::default_with_root(archive_root)
    }
}

impl Migrate for AppConfig {
    fn current_version(&self) -> u32 {
        self.version
    }

    fn target_version() -> u32 {
        CONFIG_VERSION
    }

    fn migrate(&mut self) -> CoreResult<()> {
        while self.needs_migration() {
            match self.version {
                1 => {
                    // v2 added the worker poll interval; serde already
                    // filled the default, the version just catches up
                    self.poll_interval_ms = self.poll_interval_ms.max(1);
                    self.version = 2;
                }
                v => {
                    return Err(CoreError::config(format!("unknown config version: {v}")));
                }
            }
        }
        Ok(())
    }
}

fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "operator".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default_with_root(dir.path());
        config.save().unwrap();

        let loaded = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.version, CONFIG_VERSION);
        assert_eq!(loaded.database_file, config.database_file);
        assert_eq!(loaded.stale_lock_timeout_secs, 300);
    }

    #[test]
    fn load_or_create_writes_a_default() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load_from(dir.path()).is_err());
        let created = AppConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(created.poll_interval_ms, 500);
        assert!(dir.path().join("curator.json").exists());
    }

    #[test]
    fn v1_configs_migrate_forward_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = serde_json::json!({
            "version": 1,
            "archive_root": dir.path(),
            "database_file": "curator.db",
            "worker_count": 2,
            "stale_lock_timeout_secs": 300,
            "hash_concurrency": null,
            "source_organization": "Curator Archive",
            "importer": "operator",
        });
        std::fs::write(
            dir.path().join("curator.json"),
            serde_json::to_string_pretty(&v1).unwrap(),
        )
        .unwrap();

        let migrated = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(migrated.version, CONFIG_VERSION);
        assert_eq!(migrated.poll_interval_ms, 500);

        // The migrated config was written back
        let reloaded = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.version, CONFIG_VERSION);
    }

    #[test]
    fn newer_configs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default_with_root(dir.path());
        config.version = CONFIG_VERSION + 1;
        config.save().unwrap();
        assert!(AppConfig::load_from(dir.path()).is_err());
    }

    #[test]
    fn ensure_directories_builds_the_archive_skeleton() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default_with_root(dir.path().join("archive"));
        config.ensure_directories().unwrap();
        assert!(config.archive_root.join("locations").is_dir());
        assert!(config.archive_root.join(".thumbnails").is_dir());
    }

    #[test]
    fn hash_concurrency_is_at_least_one() {
        let mut config = AppConfig::default_with_root("/tmp/a");
        config.hash_concurrency = Some(0);
        assert_eq!(config.hash_concurrency(), 1);
    }
}
