//! End-to-end ingest pipeline behavior

mod common;

use curator_core::domain::MediaKind;
use curator_core::infrastructure::database::entities::{document, image, video};
use curator_core::ingest::{CopyResult, CopyStrategy, IngestOptions, IngestStage};
use curator_core::{CancelToken, CoreError, Fingerprint, IngestEngine};
use pretty_assertions::assert_eq;
use sea_orm::EntityTrait;
use std::sync::Arc;

#[tokio::test]
async fn dedupe_and_hardlink_on_same_device() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "A.jpg", b"test content").await;
    common::write_source(&sources, "B.jpg", b"test content").await;

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.files_copied, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.strategy, Some(CopyStrategy::Hardlink));

    let fingerprint = Fingerprint::of_bytes(b"test content");
    let expected = library.paths().root().join(format!(
        "locations/NY-factory/old-factory-ABC123/org-img-ABC123/{fingerprint}.jpg"
    ));
    assert!(expected.is_file());
    assert_eq!(std::fs::read(&expected).unwrap(), b"test content");

    // The loser of the dedupe carries no archive path, only the marker
    let session = library
        .require_session(&report.session_id)
        .await
        .unwrap();
    assert_eq!(session.copy_strategy.as_deref(), Some("hardlink"));
    let copies: CopyResult = serde_json::from_str(session.copy_result.as_deref().unwrap()).unwrap();
    let placed: Vec<_> = copies.files.iter().filter(|f| f.succeeded()).collect();
    let duplicates: Vec<_> = copies
        .files
        .iter()
        .filter(|f| f.copy_error.as_deref() == Some("Duplicate"))
        .collect();
    assert_eq!(placed.len(), 1);
    assert_eq!(duplicates.len(), 1);
    assert!(duplicates[0].archive_path.is_none());

    // Exactly one image row; the bag records Payload-Oxum 12.1
    let images = image::Entity::find().all(library.conn()).await.unwrap();
    assert_eq!(images.len(), 1);
    let row = library.get_image(fingerprint.as_str()).await.unwrap().unwrap();
    assert_eq!(row.size_bytes, 12);
    assert_eq!(row.archive_filename, format!("{fingerprint}.jpg"));
    assert_eq!(row.imported_by, library.config().importer);

    let bag_info = std::fs::read_to_string(
        library
            .paths()
            .bag_folder(&location)
            .join("bag-info.txt"),
    )
    .unwrap();
    assert!(bag_info.contains("Payload-Oxum: 12.1"), "{bag_info}");

    // The archived image can become the hero; a stranger cannot
    library
        .set_hero_image(&location.id, fingerprint.as_str())
        .await
        .unwrap();
    assert!(library
        .set_hero_image(&location.id, "ffffffffffffffff")
        .await
        .is_err());
    let stored = library.require_location(&location.id).await.unwrap();
    assert_eq!(stored.hero_fingerprint.as_deref(), Some(fingerprint.as_str()));

    let sub_id = library
        .create_sublocation(&location.id, "Boiler House", None)
        .await
        .unwrap();
    let subs = library.sublocations_for_location(&location.id).await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].id, sub_id);
}

#[tokio::test]
async fn rerunning_the_same_ingest_adds_nothing() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "one.jpg", b"first image bytes").await;
    common::write_source(&sources, "two.jpg", b"second image bytes").await;

    let engine = IngestEngine::new(library.clone());
    let first = engine
        .import(vec![sources.clone()], location.id, IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(first.files_copied, 2);

    let archived_before = common::files_under(library.paths().root());

    let second = engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();
    assert_eq!(second.files_copied, 0);
    assert_eq!(second.duplicates, 2);

    let images = image::Entity::find().all(library.conn()).await.unwrap();
    assert_eq!(images.len(), 2);

    // No new payload bytes landed; only bookkeeping files may differ
    let archived_after = common::files_under(library.paths().root());
    let payload_before: Vec<_> = archived_before
        .iter()
        .filter(|p| p.to_string_lossy().contains("org-img"))
        .collect();
    let payload_after: Vec<_> = archived_after
        .iter()
        .filter(|p| p.to_string_lossy().contains("org-img"))
        .collect();
    assert_eq!(payload_before, payload_after);
}

#[tokio::test]
async fn immediate_cancel_rejects_and_leaves_nothing() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    for index in 0..10 {
        common::write_source(&sources, &format!("clip_{index}.jpg"), b"0123456789").await;
    }

    let token = CancelToken::new();
    token.cancel();
    let engine = IngestEngine::new(library.clone());
    let result = engine
        .import(
            vec![sources],
            location.id,
            IngestOptions {
                cancel: Some(token),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(CoreError::Cancelled)));

    let sessions = library.list_resumable().await.unwrap();
    assert!(sessions.is_empty(), "cancelled sessions are not resumable");

    assert_eq!(
        image::Entity::find().all(library.conn()).await.unwrap().len(),
        0
    );
    assert!(common::files_under(&library.paths().root().join("locations")).is_empty());
}

#[tokio::test]
async fn cancel_mid_copy_removes_tmp_files_and_rows() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    for index in 0..10 {
        common::write_source(
            &sources,
            &format!("clip_{index}.jpg"),
            format!("image payload {index}").as_bytes(),
        )
        .await;
    }

    let token = CancelToken::new();
    let trip = token.clone();
    let on_file_complete: curator_core::ingest::FileCompleteFn = Arc::new(move |event| {
        let trip = trip.clone();
        Box::pin(async move {
            if event.stage == IngestStage::Copy {
                trip.cancel();
            }
        })
    });

    let engine = IngestEngine::new(library.clone());
    let result = engine
        .import(
            vec![sources],
            location.id,
            IngestOptions {
                cancel: Some(token),
                on_file_complete: Some(on_file_complete),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(CoreError::Cancelled)));

    // No tmp remnants anywhere under the archive, no index rows
    let leftovers: Vec<_> = common::files_under(library.paths().root())
        .into_iter()
        .filter(|p| p.to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "tmp files left behind: {leftovers:?}");
    assert_eq!(
        image::Entity::find().all(library.conn()).await.unwrap().len(),
        0
    );
}

#[tokio::test]
async fn sidecars_archive_as_hidden_documents() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "flight.mp4", b"video bytes").await;
    common::write_source(&sources, "flight.srt", b"1\n00:00 subtitle\n").await;
    common::write_source(&sources, "notes.xyzzy", b"???").await;

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();

    // The unknown extension is skipped, not fatal
    assert_eq!(report.total_files, 3);
    assert_eq!(report.files_copied, 2);
    assert_eq!(report.errors, 1);

    let documents = document::Entity::find().all(library.conn()).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert!(documents[0].hidden);
    assert_eq!(documents[0].hidden_reason.as_deref(), Some("metadata_sidecar"));
    let sidecar_fp = Fingerprint::of_bytes(b"1\n00:00 subtitle\n");
    assert!(library
        .get_document(sidecar_fp.as_str())
        .await
        .unwrap()
        .is_some());

    let video_fp = Fingerprint::of_bytes(b"video bytes");
    let video_row = library.get_video(video_fp.as_str()).await.unwrap().unwrap();
    assert!(!video_row.hidden);
    let videos = video::Entity::find().all(library.conn()).await.unwrap();
    assert_eq!(videos.len(), 1);
}

#[tokio::test]
async fn conflicting_destination_is_never_overwritten() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "photo.jpg", b"incoming bytes").await;

    // Someone already parked different content at this fingerprint's slot
    let fingerprint = Fingerprint::of_bytes(b"incoming bytes");
    let dest = library
        .paths()
        .media_dest(&location, MediaKind::Image, &fingerprint, "jpg");
    tokio::fs::create_dir_all(dest.parent().unwrap()).await.unwrap();
    tokio::fs::write(&dest, b"squatter bytes!").await.unwrap();

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 0);
    assert_eq!(report.errors, 1);

    // The squatter survives untouched; the conflict lands on the record
    assert_eq!(std::fs::read(&dest).unwrap(), b"squatter bytes!");
    let session = library.require_session(&report.session_id).await.unwrap();
    let copies: CopyResult = serde_json::from_str(session.copy_result.as_deref().unwrap()).unwrap();
    let conflict = copies.files[0].copy_error.as_deref().unwrap();
    assert!(conflict.contains("Archive conflict"), "{conflict}");
    assert_eq!(
        image::Entity::find().all(library.conn()).await.unwrap().len(),
        0
    );
}

#[tokio::test]
async fn corrupted_copy_is_rolled_back_by_validation() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "photo.jpg", b"pristine bytes").await;

    // Corrupt the destination as soon as the copier reports it; a forced
    // byte copy keeps the source inode out of harm's way.
    let on_file_complete: curator_core::ingest::FileCompleteFn = Arc::new(|event| {
        Box::pin(async move {
            if event.stage == IngestStage::Copy {
                if let Some(path) = event.archive_path {
                    tokio::fs::write(&path, b"corrupted byte").await.unwrap();
                }
            }
        })
    });

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .import(
            vec![sources],
            location.id,
            IngestOptions {
                force_strategy: Some(CopyStrategy::Copy),
                on_file_complete: Some(on_file_complete),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(report.errors, 1);
    assert_eq!(
        image::Entity::find().all(library.conn()).await.unwrap().len(),
        0
    );

    let session = library.require_session(&report.session_id).await.unwrap();
    let validations: curator_core::ingest::ValidateResult =
        serde_json::from_str(session.validate_result.as_deref().unwrap()).unwrap();
    let failure = validations.files[0].error.as_deref().unwrap();
    assert!(failure.contains("Validation failed"), "{failure}");

    // Rollback removed the bad destination
    let fingerprint = Fingerprint::of_bytes(b"pristine bytes");
    let dest = library.paths().media_dest(
        &location,
        MediaKind::Image,
        &fingerprint,
        "jpg",
    );
    assert!(!dest.exists());
}

#[tokio::test]
async fn stale_tmp_from_a_kill_does_not_block_replacement() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "photo.jpg", b"payload after crash").await;

    // A previous process died between tmp write and rename
    let fingerprint = Fingerprint::of_bytes(b"payload after crash");
    let dest = library
        .paths()
        .media_dest(&location, MediaKind::Image, &fingerprint, "jpg");
    let parent = dest.parent().unwrap().to_path_buf();
    tokio::fs::create_dir_all(&parent).await.unwrap();
    let stale_tmp = parent.join(format!(".{fingerprint}.jpg.tmp"));
    tokio::fs::write(&stale_tmp, b"half-written garbage").await.unwrap();

    let engine = IngestEngine::new(library.clone());
    let report = engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();

    assert_eq!(report.files_copied, 1);
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload after crash");
    assert!(!stale_tmp.exists());
}

#[tokio::test]
async fn progress_is_monotone_and_reaches_completion() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    for index in 0..5 {
        common::write_source(
            &sources,
            &format!("img_{index}.jpg"),
            format!("payload {index}").as_bytes(),
        )
        .await;
    }

    let seen = Arc::new(std::sync::Mutex::new(Vec::<f32>::new()));
    let sink = seen.clone();
    let on_progress: curator_core::ingest::ProgressFn = Arc::new(move |update| {
        sink.lock().unwrap().push(update.overall_percent);
    });

    let engine = IngestEngine::new(library.clone());
    engine
        .import(
            vec![sources],
            location.id,
            IngestOptions {
                on_progress: Some(on_progress),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let values = seen.lock().unwrap().clone();
    assert!(!values.is_empty());
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
    assert_eq!(*values.last().unwrap(), 100.0);
    assert!(values.iter().all(|v| (0.0..=100.0).contains(v)));
}
