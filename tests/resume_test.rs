//! Checkpointed resume: no re-hash, no re-copy, restart on missing blobs

mod common;

use curator_core::domain::MediaKind;
use curator_core::infrastructure::database::entities::image;
use curator_core::ingest::{
    CopiedFile, CopyResult, CopyStrategy, HashResult, HashedFile, IngestOptions, ScanResult,
    ScannedFile,
};
use curator_core::{Fingerprint, IngestEngine};
use pretty_assertions::assert_eq;
use sea_orm::EntityTrait;
use std::path::{Path, PathBuf};

fn scanned_file(id: u64, path: &Path, size: u64) -> ScannedFile {
    ScannedFile {
        id,
        original_path: path.to_path_buf(),
        filename: path.file_name().unwrap().to_string_lossy().to_string(),
        extension: "jpg".to_string(),
        size,
        kind: Some(MediaKind::Image),
        should_skip: false,
        should_hide: false,
        is_sidecar: false,
        is_live_photo: false,
        modified_at: None,
    }
}

fn scan_blob(files: Vec<ScannedFile>) -> String {
    let total_bytes = files.iter().map(|f| f.size).sum();
    serde_json::to_string(&ScanResult {
        total_files: files.len() as u64,
        total_bytes,
        estimated_duration_ms: 0,
        files,
    })
    .unwrap()
}

#[tokio::test]
async fn resume_honors_persisted_duplicate_marks() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let source =
        common::write_source(&guard.path().join("sources"), "photo.jpg", b"not a duplicate").await;
    let fingerprint = Fingerprint::of_bytes(b"not a duplicate");

    // A prior run hashed this file and decided it was a duplicate. The
    // index holds no such fingerprint, so a re-hash would disagree.
    let session = library
        .create_session(&location.id, &[source.clone()])
        .await
        .unwrap();
    library
        .save_stage_result(&session.id, 1, Some(scan_blob(vec![scanned_file(0, &source, 15)])))
        .await
        .unwrap();
    library
        .save_stage_result(
            &session.id,
            2,
            Some(
                serde_json::to_string(&HashResult {
                    files: vec![HashedFile {
                        file_id: 0,
                        fingerprint: Some(fingerprint.to_string()),
                        error: None,
                        is_duplicate: true,
                    }],
                })
                .unwrap(),
            ),
        )
        .await
        .unwrap();

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .resume(&session.id, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 0);
    assert_eq!(report.duplicates, 1);
    assert_eq!(
        image::Entity::find().all(library.conn()).await.unwrap().len(),
        0
    );

    let finished = library.require_session(&session.id).await.unwrap();
    assert_eq!(finished.status, "completed");
    assert_eq!(finished.last_step, 5);
    assert!(!finished.can_resume);
}

#[tokio::test]
async fn resume_after_copy_never_touches_the_source() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let content = b"resume payload";
    let source =
        common::write_source(&guard.path().join("sources"), "photo.jpg", content).await;
    let fingerprint = Fingerprint::of_bytes(content);

    // Previous run finished the copy stage, then the process died.
    let dest = library
        .paths()
        .media_dest(&location, MediaKind::Image, &fingerprint, "jpg");
    tokio::fs::create_dir_all(dest.parent().unwrap()).await.unwrap();
    tokio::fs::write(&dest, content).await.unwrap();

    let session = library
        .create_session(&location.id, &[source.clone()])
        .await
        .unwrap();
    library
        .save_stage_result(
            &session.id,
            1,
            Some(scan_blob(vec![scanned_file(0, &source, content.len() as u64)])),
        )
        .await
        .unwrap();
    library
        .save_stage_result(
            &session.id,
            2,
            Some(
                serde_json::to_string(&HashResult {
                    files: vec![HashedFile {
                        file_id: 0,
                        fingerprint: Some(fingerprint.to_string()),
                        error: None,
                        is_duplicate: false,
                    }],
                })
                .unwrap(),
            ),
        )
        .await
        .unwrap();
    library
        .save_stage_result(
            &session.id,
            3,
            Some(
                serde_json::to_string(&CopyResult {
                    strategy: CopyStrategy::Copy,
                    files: vec![CopiedFile {
                        file_id: 0,
                        fingerprint: Some(fingerprint.to_string()),
                        archive_path: Some(dest.clone()),
                        bytes_copied: content.len() as u64,
                        copy_strategy: CopyStrategy::Copy,
                        copy_error: None,
                    }],
                })
                .unwrap(),
            ),
        )
        .await
        .unwrap();
    library
        .set_session_strategy(&session.id, "copy")
        .await
        .unwrap();

    // If resume re-hashed or re-copied, the missing source would fail it
    tokio::fs::remove_file(&source).await.unwrap();

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .resume(&session.id, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(report.errors, 0);

    let images = image::Entity::find().all(library.conn()).await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].archive_path, dest.to_string_lossy().to_string());
}

#[tokio::test]
async fn missing_blob_restarts_from_scan() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "fresh.jpg", b"fresh content").await;

    // Checkpoint says hashing finished, but the scan blob is gone
    let session = library
        .create_session(&location.id, &[PathBuf::from(&sources)])
        .await
        .unwrap();
    library
        .save_stage_result(
            &session.id,
            2,
            Some(serde_json::to_string(&HashResult { files: vec![] }).unwrap()),
        )
        .await
        .unwrap();

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .resume(&session.id, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_files, 1);
    assert_eq!(report.files_copied, 1);
    assert_eq!(
        image::Entity::find().all(library.conn()).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn resumable_listing_tracks_lifecycle() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "img.jpg", b"listing test").await;

    let session = library
        .create_session(&location.id, &[PathBuf::from(&sources)])
        .await
        .unwrap();
    let listed = library.list_resumable().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, session.id);

    let engine = IngestEngine::new(library.clone());
    engine
        .resume(&session.id, IngestOptions::default())
        .await
        .unwrap();

    assert!(library.list_resumable().await.unwrap().is_empty());
}
