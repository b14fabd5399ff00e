// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite store backend.
//!
//! Schema: `jobs(id PK, status, created_at, updated_at, result)`,
//! `events(job_id, id, envelope, PK(job_id, id))`,
//! `idempotency(key PK, job_id, created_at)`. The connection runs with a
//! WAL journal and a bounded busy timeout; a single pooled connection
//! serializes writes.

use std::path::Path;
use std::time::Duration;

use anneal_core::{EventEnvelope, JobId, JobRecord, JobStatus};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::{JobStore, StoreError};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS jobs (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        created_at REAL NOT NULL,
        updated_at REAL NOT NULL,
        result TEXT
    )",
    "CREATE TABLE IF NOT EXISTS events (
        job_id TEXT NOT NULL,
        id INTEGER NOT NULL,
        envelope TEXT NOT NULL,
        PRIMARY KEY(job_id, id)
    )",
    "CREATE TABLE IF NOT EXISTS idempotency (
        key TEXT PRIMARY KEY,
        job_id TEXT NOT NULL,
        created_at REAL NOT NULL
    )",
];

/// SQLite-backed implementation of [`JobStore`].
pub struct SqliteStore {
    pool: SqlitePool,
    buffer_size: i64,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub async fn create(path: impl AsRef<Path>, buffer_size: usize) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&pool).await?;
        }
        Ok(Self {
            pool,
            buffer_size: buffer_size.max(1) as i64,
        })
    }
}

fn row_to_record(row: &SqliteRow) -> Result<JobRecord, StoreError> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let status = JobStatus::parse(&status)
        .ok_or_else(|| StoreError::Io(format!("unknown job status in store: {status}")))?;
    let result: Option<String> = row.try_get("result")?;
    let result = result.as_deref().map(serde_json::from_str).transpose()?;
    Ok(JobRecord {
        id: JobId::from_string(id),
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        result,
    })
}

#[async_trait]
impl JobStore for SqliteStore {
    async fn save_job(&self, record: &JobRecord) -> Result<(), StoreError> {
        let result = record
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            "INSERT INTO jobs(id, status, created_at, updated_at, result)
             VALUES(?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status,
                 created_at = excluded.created_at,
                 updated_at = excluded.updated_at,
                 result = excluded.result",
        )
        .bind(record.id.as_str())
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(result)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT id, status, created_at, updated_at, result FROM jobs WHERE id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_record).transpose()
    }

    async fn list_jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, status, created_at, updated_at, result FROM jobs
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM events WHERE job_id = ?")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_event(&self, envelope: &EventEnvelope) -> Result<(), StoreError> {
        let event_id = envelope.id as i64;
        sqlx::query("INSERT OR REPLACE INTO events(job_id, id, envelope) VALUES(?, ?, ?)")
            .bind(envelope.job_id.as_str())
            .bind(event_id)
            .bind(envelope.to_json()?)
            .execute(&self.pool)
            .await?;
        // Amortized ring buffer: drop rows that slid out of the window.
        let cutoff = event_id - self.buffer_size;
        if cutoff > 0 {
            sqlx::query("DELETE FROM events WHERE job_id = ? AND id <= ?")
                .bind(envelope.job_id.as_str())
                .bind(cutoff)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn events_since(
        &self,
        job_id: &str,
        after_id: u64,
    ) -> Result<Vec<EventEnvelope>, StoreError> {
        let rows = sqlx::query("SELECT envelope FROM events WHERE job_id = ? AND id > ? ORDER BY id")
            .bind(job_id)
            .bind(after_id as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                let raw: String = row.try_get("envelope")?;
                Ok(serde_json::from_str(&raw)?)
            })
            .collect()
    }

    async fn save_idempotency(&self, key: &str, job_id: &JobId, ts: f64) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO idempotency(key, job_id, created_at) VALUES(?, ?, ?)")
            .bind(key)
            .bind(job_id.as_str())
            .bind(ts)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_idempotent(
        &self,
        key: &str,
        now: f64,
        ttl_secs: f64,
    ) -> Result<Option<JobId>, StoreError> {
        let row = sqlx::query("SELECT job_id, created_at FROM idempotency WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let created_at: f64 = row.try_get("created_at")?;
        if now - created_at < ttl_secs {
            let job_id: String = row.try_get("job_id")?;
            Ok(Some(JobId::from_string(job_id)))
        } else {
            Ok(None)
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
