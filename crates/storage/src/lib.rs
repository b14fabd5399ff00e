// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! anneal-storage: durable job, event-log, and idempotency storage.
//!
//! Two interchangeable backends honor the same [`JobStore`] contract: an
//! in-memory store for tests and single-process deployments, and a SQLite
//! store for deployments that need terminal state to survive restarts.
//! Per-job event logs are ring-buffered: at most `buffer_size` envelopes
//! are retained, pruned on append. The terminal event always carries the
//! greatest id for its job, so it is never the one pruned.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anneal_core::{EventEnvelope, JobId, JobRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Storage failure. Backend-specific causes are flattened to strings so
/// callers never depend on a particular backend's error types.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Durable mapping for jobs, per-job ordered event logs, and the
/// idempotency index.
///
/// Operations are serialized inside each implementation; the store never
/// blocks on the registry. All methods either succeed or fail with a
/// [`StoreError`].
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Upsert by id. Overwrites status, `updated_at`, and result.
    async fn save_job(&self, record: &JobRecord) -> Result<(), StoreError>;

    /// Snapshot of a job row, if present.
    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError>;

    /// All job rows, newest first.
    async fn list_jobs(&self) -> Result<Vec<JobRecord>, StoreError>;

    /// Delete the job row and all of its events.
    async fn delete_job(&self, job_id: &str) -> Result<(), StoreError>;

    /// Append one envelope, then prune events with `id <= id - buffer`.
    async fn save_event(&self, envelope: &EventEnvelope) -> Result<(), StoreError>;

    /// All stored envelopes with `id > after_id`, ordered by id.
    async fn events_since(
        &self,
        job_id: &str,
        after_id: u64,
    ) -> Result<Vec<EventEnvelope>, StoreError>;

    /// Upsert an idempotency record.
    async fn save_idempotency(&self, key: &str, job_id: &JobId, ts: f64) -> Result<(), StoreError>;

    /// Job id for a key whose record is younger than `ttl_secs`. Expired
    /// records are treated as absent.
    async fn get_idempotent(
        &self,
        key: &str,
        now: f64,
        ttl_secs: f64,
    ) -> Result<Option<JobId>, StoreError>;

    /// Release backend resources. Idempotent.
    async fn close(&self) -> Result<(), StoreError>;
}
