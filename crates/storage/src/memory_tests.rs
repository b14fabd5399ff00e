// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use anneal_core::{EventEnvelope, JobStatus};
use serde_json::json;

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
    EventEnvelope::new(event_type, JobId::from_string(job_id), id as f64, id, json!({}))
}

#[tokio::test]
async fn save_and_get_round_trips() {
    let store = MemoryStore::new(8);
    let mut rec = record("job-1", 10.0);
    rec.status = JobStatus::Finished;
    rec.result = Some(json!({"proposal": "p"}));

    store.save_job(&rec).await.unwrap();

    let got = store.get_job("job-1").await.unwrap().unwrap();
    assert_eq!(got, rec);
    assert!(store.get_job("job-missing").await.unwrap().is_none());
}

#[tokio::test]
async fn save_job_overwrites() {
    let store = MemoryStore::new(8);
    let mut rec = record("job-1", 10.0);
    store.save_job(&rec).await.unwrap();

    rec.status = JobStatus::Running;
    rec.updated_at = 11.0;
    store.save_job(&rec).await.unwrap();

    let got = store.get_job("job-1").await.unwrap().unwrap();
    assert_eq!(got.status, JobStatus::Running);
    assert!((got.updated_at - 11.0).abs() < 1e-9);
}

#[tokio::test]
async fn list_jobs_newest_first() {
    let store = MemoryStore::new(8);
    store.save_job(&record("job-old", 1.0)).await.unwrap();
    store.save_job(&record("job-new", 3.0)).await.unwrap();
    store.save_job(&record("job-mid", 2.0)).await.unwrap();

    let jobs = store.list_jobs().await.unwrap();
    let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["job-new", "job-mid", "job-old"]);
}

#[tokio::test]
async fn delete_job_removes_events() {
    let store = MemoryStore::new(8);
    store.save_job(&record("job-1", 1.0)).await.unwrap();
    store.save_event(&event("job-1", 1, "started")).await.unwrap();

    store.delete_job("job-1").await.unwrap();

    assert!(store.get_job("job-1").await.unwrap().is_none());
    assert!(store.events_since("job-1", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn ring_buffer_keeps_last_n() {
    let store = MemoryStore::new(3);
    for id in 1..=5 {
        store.save_event(&event("job-1", id, "progress")).await.unwrap();
    }

    let events = store.events_since("job-1", 0).await.unwrap();
    let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3, 4, 5]);
}

#[tokio::test]
async fn terminal_event_survives_ring_prune() {
    let store = MemoryStore::new(1);
    for id in 1..=4 {
        store.save_event(&event("job-1", id, "progress")).await.unwrap();
    }
    store.save_event(&event("job-1", 5, "finished")).await.unwrap();

    let events = store.events_since("job-1", 0).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "finished");
    assert_eq!(events[0].id, 5);
}

#[tokio::test]
async fn events_since_filters_and_orders() {
    let store = MemoryStore::new(8);
    for id in 1..=4 {
        store.save_event(&event("job-1", id, "progress")).await.unwrap();
    }

    let events = store.events_since("job-1", 2).await.unwrap();
    let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3, 4]);

    assert!(store.events_since("job-other", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn idempotency_respects_ttl() {
    let store = MemoryStore::new(8);
    let job_id = JobId::from_string("job-1");
    store.save_idempotency("demo", &job_id, 100.0).await.unwrap();

    let hit = store.get_idempotent("demo", 150.0, 100.0).await.unwrap();
    assert_eq!(hit, Some(job_id));

    let expired = store.get_idempotent("demo", 250.0, 100.0).await.unwrap();
    assert!(expired.is_none());

    let missing = store.get_idempotent("other", 150.0, 100.0).await.unwrap();
    assert!(missing.is_none());
}
