// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store backend.

use std::collections::{HashMap, VecDeque};

use anneal_core::{EventEnvelope, JobId, JobRecord};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{JobStore, StoreError};

struct Inner {
    jobs: HashMap<String, JobRecord>,
    events: HashMap<String, VecDeque<EventEnvelope>>,
    idempotency: HashMap<String, (JobId, f64)>,
}

/// Hash-map store with a bounded per-job event deque.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    buffer_size: usize,
}

impl MemoryStore {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                jobs: HashMap::new(),
                events: HashMap::new(),
                idempotency: HashMap::new(),
            }),
            buffer_size: buffer_size.max(1),
        }
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn save_job(&self, record: &JobRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.jobs.insert(record.id.to_string(), record.clone());
        Ok(())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.jobs.get(job_id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<JobRecord>, StoreError> {
        let inner = self.inner.lock();
        let mut jobs: Vec<JobRecord> = inner.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.total_cmp(&a.created_at));
        Ok(jobs)
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.jobs.remove(job_id);
        inner.events.remove(job_id);
        Ok(())
    }

    async fn save_event(&self, envelope: &EventEnvelope) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let buf = inner
            .events
            .entry(envelope.job_id.to_string())
            .or_insert_with(VecDeque::new);
        buf.push_back(envelope.clone());
        while buf.len() > self.buffer_size {
            buf.pop_front();
        }
        Ok(())
    }

    async fn events_since(
        &self,
        job_id: &str,
        after_id: u64,
    ) -> Result<Vec<EventEnvelope>, StoreError> {
        let inner = self.inner.lock();
        let Some(buf) = inner.events.get(job_id) else {
            return Ok(Vec::new());
        };
        Ok(buf.iter().filter(|env| env.id > after_id).cloned().collect())
    }

    async fn save_idempotency(&self, key: &str, job_id: &JobId, ts: f64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.idempotency.insert(key.to_string(), (job_id.clone(), ts));
        Ok(())
    }

    async fn get_idempotent(
        &self,
        key: &str,
        now: f64,
        ttl_secs: f64,
    ) -> Result<Option<JobId>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .idempotency
            .get(key)
            .filter(|(_, created_at)| now - created_at < ttl_secs)
            .map(|(job_id, _)| job_id.clone()))
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
