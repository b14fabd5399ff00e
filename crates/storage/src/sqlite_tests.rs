// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use anneal_core::JobStatus;
use serde_json::json;
use tempfile::tempdir;

async fn open_store(dir: &tempfile::TempDir, buffer_size: usize) -> SqliteStore {
    SqliteStore::create(dir.path().join("jobs.db"), buffer_size)
        .await
        .unwrap()
}

fn record(id: &str, created_at: f64) -> JobRecord {
    JobRecord {
        id: JobId::from_string(id),
        status: JobStatus::Pending,
        created_at,
        updated_at: created_at,
        result: None,
    }
}

fn event(job_id: &str, id: u64, event_type: &str) -> EventEnvelope {
    EventEnvelope::new(event_type, JobId::from_string(job_id), id as f64, id, json!({"i": id}))
}

#[tokio::test]
async fn create_is_idempotent_on_existing_file() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;
    store.save_job(&record("job-1", 1.0)).await.unwrap();
    store.close().await.unwrap();

    let reopened = open_store(&dir, 8).await;
    let got = reopened.get_job("job-1").await.unwrap().unwrap();
    assert_eq!(got.id.as_str(), "job-1");
}

#[tokio::test]
async fn save_and_get_round_trips_result_json() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;

    let mut rec = record("job-1", 10.0);
    rec.status = JobStatus::Failed;
    rec.result = Some(json!({"error": "sse_backpressure"}));
    store.save_job(&rec).await.unwrap();

    let got = store.get_job("job-1").await.unwrap().unwrap();
    assert_eq!(got.status, JobStatus::Failed);
    assert_eq!(got.result, Some(json!({"error": "sse_backpressure"})));
}

#[tokio::test]
async fn upsert_overwrites_status() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;

    let mut rec = record("job-1", 10.0);
    store.save_job(&rec).await.unwrap();
    rec.status = JobStatus::Running;
    rec.updated_at = 12.0;
    store.save_job(&rec).await.unwrap();

    let got = store.get_job("job-1").await.unwrap().unwrap();
    assert_eq!(got.status, JobStatus::Running);
}

#[tokio::test]
async fn list_jobs_newest_first() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;
    store.save_job(&record("job-a", 1.0)).await.unwrap();
    store.save_job(&record("job-b", 3.0)).await.unwrap();
    store.save_job(&record("job-c", 2.0)).await.unwrap();

    let ids: Vec<String> = store
        .list_jobs()
        .await
        .unwrap()
        .iter()
        .map(|j| j.id.to_string())
        .collect();
    assert_eq!(ids, vec!["job-b", "job-c", "job-a"]);
}

#[tokio::test]
async fn events_ring_buffer_prunes_old_ids() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 3).await;
    for id in 1..=5 {
        store.save_event(&event("job-1", id, "progress")).await.unwrap();
    }

    let ids: Vec<u64> = store
        .events_since("job-1", 0)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[tokio::test]
async fn events_since_returns_strictly_greater_ids() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;
    for id in 1..=4 {
        store.save_event(&event("job-1", id, "progress")).await.unwrap();
    }

    let events = store.events_since("job-1", 2).await.unwrap();
    let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3, 4]);
    assert_eq!(events[0].data, json!({"i": 3}));
}

#[tokio::test]
async fn delete_job_drops_rows_and_events() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;
    store.save_job(&record("job-1", 1.0)).await.unwrap();
    store.save_event(&event("job-1", 1, "started")).await.unwrap();

    store.delete_job("job-1").await.unwrap();

    assert!(store.get_job("job-1").await.unwrap().is_none());
    assert!(store.events_since("job-1", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn idempotency_ttl_window() {
    let dir = tempdir().unwrap();
    let store = open_store(&dir, 8).await;
    let job_id = JobId::from_string("job-1");
    store.save_idempotency("demo", &job_id, 100.0).await.unwrap();

    assert_eq!(
        store.get_idempotent("demo", 150.0, 100.0).await.unwrap(),
        Some(job_id.clone())
    );
    assert!(store.get_idempotent("demo", 250.0, 100.0).await.unwrap().is_none());

    // Upsert refreshes the record.
    store.save_idempotency("demo", &job_id, 240.0).await.unwrap();
    assert_eq!(
        store.get_idempotent("demo", 250.0, 100.0).await.unwrap(),
        Some(job_id)
    );
}
