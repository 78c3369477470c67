//! Job queue behavior: ordering, dependencies, retry, DLQ, leases

mod common;

use chrono::Utc;
use curator_core::infrastructure::database::entities::job;
use curator_core::queue::{queues, JobPriority, JobStatus, NewJob, Worker};
use curator_core::{CancelToken, Services};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::json;
use std::time::Duration;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Make a job immediately claimable again after a backoff was scheduled
async fn clear_retry_after(library: &curator_core::Library, id: &str) {
    job::ActiveModel {
        id: Set(id.to_string()),
        retry_after: Set(Some(now_ms() - 1)),
        ..Default::default()
    }
    .update(library.conn())
    .await
    .unwrap();
}

#[tokio::test]
async fn strict_priority_then_fifo() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let low = queue
        .enqueue(NewJob::new("exiftool", json!({"n": 1})).with_priority(JobPriority::LOW))
        .await
        .unwrap();
    let first_normal = queue
        .enqueue(NewJob::new("exiftool", json!({"n": 2})).with_priority(JobPriority::NORMAL))
        .await
        .unwrap();
    let second_normal = queue
        .enqueue(NewJob::new("exiftool", json!({"n": 3})).with_priority(JobPriority::NORMAL))
        .await
        .unwrap();
    let critical = queue
        .enqueue(NewJob::new("exiftool", json!({"n": 4})).with_priority(JobPriority::CRITICAL))
        .await
        .unwrap();

    let mut claimed = Vec::new();
    while let Some(job) = queue.get_next("exiftool", "worker-1").await.unwrap() {
        claimed.push(job.id.clone());
        queue.complete(&job.id, None).await.unwrap();
    }

    assert_eq!(claimed, vec![critical, first_normal, second_normal, low]);
}

#[tokio::test]
async fn claimed_jobs_are_invisible_to_rivals() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    queue
        .enqueue(NewJob::new("thumbnail", json!({})))
        .await
        .unwrap();

    let won = queue.get_next("thumbnail", "worker-a").await.unwrap();
    assert!(won.is_some());
    let lost = queue.get_next("thumbnail", "worker-b").await.unwrap();
    assert!(lost.is_none());

    let model = won.unwrap();
    assert_eq!(model.status, "processing");
    assert_eq!(model.locked_by.as_deref(), Some("worker-a"));
    assert_eq!(model.attempts, 1);
    assert!(model.locked_at.is_some());
    assert!(model.started_at.is_some());
}

#[tokio::test]
async fn dependency_gates_until_parent_completes() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let parent = queue
        .enqueue(NewJob::new("bagit", json!({"who": "parent"})))
        .await
        .unwrap();
    let child = queue
        .enqueue(NewJob::new("bagit", json!({"who": "child"})).depends_on(parent.clone()))
        .await
        .unwrap();

    let first = queue.get_next("bagit", "w").await.unwrap().unwrap();
    assert_eq!(first.id, parent);

    // Child stays gated while the parent is processing
    assert!(queue.get_next("bagit", "w").await.unwrap().is_none());

    queue.complete(&parent, None).await.unwrap();
    let second = queue.get_next("bagit", "w").await.unwrap().unwrap();
    assert_eq!(second.id, child);
}

#[tokio::test]
async fn dead_parent_never_releases_child() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let parent = queue
        .enqueue(NewJob::new("ffprobe", json!({})).with_max_attempts(1))
        .await
        .unwrap();
    queue
        .enqueue(NewJob::new("ffprobe", json!({})).depends_on(parent.clone()))
        .await
        .unwrap();

    let claimed = queue.get_next("ffprobe", "w").await.unwrap().unwrap();
    queue.fail(&claimed.id, "boom").await.unwrap();

    let parent_row = queue.get_job(&parent).await.unwrap().unwrap();
    assert_eq!(parent_row.status, "dead");

    assert!(queue.get_next("ffprobe", "w").await.unwrap().is_none());
}

#[tokio::test]
async fn retry_backoff_then_dead_letter() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let id = queue
        .enqueue(NewJob::new("video-proxy", json!({"file": "x.mp4"})).with_max_attempts(3))
        .await
        .unwrap();

    // Attempt 1
    let claimed = queue.get_next("video-proxy", "w").await.unwrap().unwrap();
    let before = now_ms();
    queue.fail(&claimed.id, "encode failed").await.unwrap();
    let row = queue.get_job(&id).await.unwrap().unwrap();
    assert_eq!(row.status, "pending");
    assert_eq!(row.last_error.as_deref(), Some("encode failed"));
    assert_eq!(row.error, None);
    let delta = row.retry_after.unwrap() - before;
    assert!((1_000..1_900).contains(&delta), "first retry delta {delta}");

    // Attempt 2
    clear_retry_after(&library, &id).await;
    let claimed = queue.get_next("video-proxy", "w").await.unwrap().unwrap();
    let before = now_ms();
    queue.fail(&claimed.id, "encode failed again").await.unwrap();
    let row = queue.get_job(&id).await.unwrap().unwrap();
    let delta = row.retry_after.unwrap() - before;
    assert!((2_000..2_900).contains(&delta), "second retry delta {delta}");

    // Attempt 3 exhausts the budget
    clear_retry_after(&library, &id).await;
    let claimed = queue.get_next("video-proxy", "w").await.unwrap().unwrap();
    queue.fail(&claimed.id, "gave up").await.unwrap();

    let row = queue.get_job(&id).await.unwrap().unwrap();
    assert_eq!(row.status, "dead");
    assert_eq!(row.attempts, 3);
    assert_eq!(row.error.as_deref(), Some("gave up"));

    let dead = queue.list_dead(false).await.unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].job_id, id);
    assert_eq!(dead[0].attempts, 3);
    assert!(!dead[0].acknowledged);
}

#[tokio::test]
async fn dead_letters_acknowledge_and_retry_as_fresh_jobs() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let id = queue
        .enqueue(NewJob::new("exiftool", json!({"path": "a.jpg"})).with_max_attempts(1))
        .await
        .unwrap();
    let claimed = queue.get_next("exiftool", "w").await.unwrap().unwrap();
    queue.fail(&claimed.id, "no extractor").await.unwrap();

    let dead = queue.list_dead(false).await.unwrap();
    assert_eq!(dead.len(), 1);

    let fresh = queue.retry_dead(dead[0].id).await.unwrap();
    assert_ne!(fresh, id);

    // The dead row is acknowledged but preserved for audit
    assert!(queue.list_dead(false).await.unwrap().is_empty());
    let all = queue.list_dead(true).await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].acknowledged);

    let fresh_row = queue.get_job(&fresh).await.unwrap().unwrap();
    assert_eq!(fresh_row.status, "pending");
    assert_eq!(fresh_row.attempts, 0);
    assert_eq!(fresh_row.payload, json!({"path": "a.jpg"}).to_string());
}

#[tokio::test]
async fn stale_leases_are_reclaimed() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let id = queue
        .enqueue(NewJob::new("thumbnail", json!({})))
        .await
        .unwrap();
    let claimed = queue.get_next("thumbnail", "crashed-worker").await.unwrap();
    assert!(claimed.is_some());

    // Pretend the worker died eleven minutes ago
    job::ActiveModel {
        id: Set(id.clone()),
        locked_at: Set(Some(now_ms() - 11 * 60 * 1000)),
        ..Default::default()
    }
    .update(library.conn())
    .await
    .unwrap();

    let reclaimed = queue.get_next("thumbnail", "fresh-worker").await.unwrap().unwrap();
    assert_eq!(reclaimed.id, id);
    assert_eq!(reclaimed.locked_by.as_deref(), Some("fresh-worker"));
    assert_eq!(reclaimed.attempts, 2);
}

#[tokio::test]
async fn bulk_insert_returns_ids_in_input_order() {
    let (_guard, library) = common::test_library().await;
    let queue = library.queue();

    let ids = queue
        .enqueue_many(vec![
            NewJob::new("exiftool", json!({"n": 0})),
            NewJob::new("exiftool", json!({"n": 1})),
            NewJob::new("exiftool", json!({"n": 2})),
        ])
        .await
        .unwrap();
    assert_eq!(ids.len(), 3);

    for (expected, id) in ids.iter().enumerate() {
        let row = queue.get_job(id).await.unwrap().unwrap();
        assert_eq!(row.payload, json!({"n": expected}).to_string());
    }

    // Equal priority, equal timestamps: claims come back in insert order
    for id in &ids {
        let claimed = queue.get_next("exiftool", "w").await.unwrap().unwrap();
        assert_eq!(&claimed.id, id);
        queue.complete(&claimed.id, None).await.unwrap();
    }
}

#[tokio::test]
async fn worker_runs_location_stats_job_end_to_end() {
    let (_guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;
    let queue = library.queue();

    let id = queue
        .enqueue(NewJob::new(
            queues::LOCATION_STATS,
            json!({ "location_id": location.id }),
        ))
        .await
        .unwrap();

    let cancel = CancelToken::new();
    let services = std::sync::Arc::new(Services::new(library.clone()));
    let worker = Worker::bind(queues::LOCATION_STATS, services, cancel.clone()).unwrap();
    let handle = worker.spawn();

    let mut status = JobStatus::Pending;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let row = queue.get_job(&id).await.unwrap().unwrap();
        if let Some(parsed) = JobStatus::parse(&row.status) {
            status = parsed;
            if parsed.is_terminal() {
                break;
            }
        }
    }
    cancel.cancel();
    let _ = handle.await;

    assert_eq!(status, JobStatus::Completed);
}
