//! Shared fixtures for the integration suites

#![allow(dead_code)]

use curator_core::domain::Location;
use curator_core::{AppConfig, Library};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A library rooted in a fresh temp directory; keep the guard alive
pub async fn test_library() -> (TempDir, Arc<Library>) {
    let dir = tempfile::tempdir().unwrap();
    let archive_root = dir.path().join("archive");
    let config = AppConfig::default_with_root(&archive_root);
    let library = Library::open(config).await.unwrap();
    (dir, Arc::new(library))
}

/// The canonical test location: NY factory with a pinned short id
pub async fn factory_location(library: &Library) -> Location {
    let mut location = Location::new("Old Factory", "Old Factory", "Factory").with_state("NY");
    location.short_id = "ABC123".to_string();
    library.create_location(&location).await.unwrap();
    location
}

pub async fn write_source(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(&path, content).await.unwrap();
    path
}

/// Every regular file under a root, relative paths, sorted
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                found.push(path.strip_prefix(root).unwrap().to_path_buf());
            }
        }
    }
    found.sort();
    found
}
