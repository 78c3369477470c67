//! BagIt sidecar generation and drift detection

mod common;

use curator_core::domain::BagStatus;
use curator_core::ingest::IngestOptions;
use curator_core::{BagitService, Fingerprint, IngestEngine};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn bags_are_complete_and_validate_clean() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "front.jpg", b"front elevation").await;
    common::write_source(&sources, "plan.pdf", b"floor plan document bytes").await;

    let engine = IngestEngine::new(library.clone());
    engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();

    let bag_dir = library.paths().bag_folder(&location);

    let declaration = std::fs::read_to_string(bag_dir.join("bagit.txt")).unwrap();
    assert_eq!(
        declaration,
        "BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n"
    );

    let bag_info = std::fs::read_to_string(bag_dir.join("bag-info.txt")).unwrap();
    let keys: Vec<&str> = bag_info
        .lines()
        .map(|line| line.split(':').next().unwrap())
        .collect();
    assert_eq!(&keys[..3], &["Source-Organization", "Bagging-Date", "Bag-Software-Agent"]);
    assert!(bag_info.contains("External-Identifier: ABC123"));
    assert!(bag_info.contains("External-Description: Old Factory"));
    assert!(bag_info.contains("Location-State: NY"));
    let bytes = b"front elevation".len() + b"floor plan document bytes".len();
    assert!(bag_info.contains(&format!("Payload-Oxum: {bytes}.2")));

    let manifest = std::fs::read_to_string(bag_dir.join("manifest-sha256.txt")).unwrap();
    let lines: Vec<&str> = manifest.lines().collect();
    assert_eq!(lines.len(), 2);
    let mut sorted = lines.clone();
    sorted.sort();
    assert_eq!(lines, sorted, "manifest must be sorted");
    let image_fp = Fingerprint::of_bytes(b"front elevation");
    assert!(manifest.contains(&format!(
        "{image_fp}  ../../org-img-ABC123/{image_fp}.jpg"
    )));

    let tagmanifest = std::fs::read_to_string(bag_dir.join("tagmanifest-sha256.txt")).unwrap();
    let tag_files: Vec<&str> = tagmanifest
        .lines()
        .map(|line| line.split("  ").nth(1).unwrap())
        .collect();
    assert_eq!(tag_files, vec!["bagit.txt", "bag-info.txt", "manifest-sha256.txt"]);

    let outcome = BagitService::validate(&library, &location).await.unwrap();
    assert_eq!(outcome.status, BagStatus::Valid);
    let quick = BagitService::quick_validate(&library, &location).await.unwrap();
    assert_eq!(quick.status, BagStatus::Valid);

    let stored = library.require_location(&location.id).await.unwrap();
    assert_eq!(stored.bag_status, BagStatus::Valid);
    assert!(stored.bag_last_verified.is_some());
}

#[tokio::test]
async fn out_of_band_deletion_is_detected_without_mutation() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let sources = guard.path().join("sources");
    common::write_source(&sources, "keep.jpg", b"kept payload").await;
    common::write_source(&sources, "lose.jpg", b"doomed payload").await;

    let engine = IngestEngine::new(library.clone());
    engine
        .import(vec![sources], location.id, IngestOptions::default())
        .await
        .unwrap();

    let doomed_fp = Fingerprint::of_bytes(b"doomed payload");
    let doomed = library
        .paths()
        .kind_folder(&location, curator_core::domain::MediaKind::Image)
        .join(format!("{doomed_fp}.jpg"));
    std::fs::remove_file(&doomed).unwrap();

    let quick = BagitService::quick_validate(&library, &location).await.unwrap();
    assert_eq!(quick.status, BagStatus::Incomplete);
    assert!(
        quick.errors[0].contains("Payload-Oxum mismatch"),
        "{:?}",
        quick.errors
    );

    let full = BagitService::validate(&library, &location).await.unwrap();
    assert_eq!(full.status, BagStatus::Invalid);
    assert!(
        full.errors.iter().any(|e| e.contains(doomed_fp.as_str())),
        "{:?}",
        full.errors
    );

    // Validation reports, never repairs
    assert!(!doomed.exists());
    let kept_fp = Fingerprint::of_bytes(b"kept payload");
    let kept = library
        .paths()
        .kind_folder(&location, curator_core::domain::MediaKind::Image)
        .join(format!("{kept_fp}.jpg"));
    assert!(kept.exists());
    let bag_dir = library.paths().bag_folder(&location);
    assert!(bag_dir.join("manifest-sha256.txt").exists());

    let stored = library.require_location(&location.id).await.unwrap();
    assert_eq!(stored.bag_status, BagStatus::Invalid);
    assert!(stored.bag_last_error.is_some());
}

#[tokio::test]
async fn absent_archive_folder_reports_none() {
    let (_guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;

    let outcome = BagitService::validate(&library, &location).await.unwrap();
    assert_eq!(outcome.status, BagStatus::None);
}
