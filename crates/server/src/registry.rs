// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job registry and lifecycle coordination.
//!
//! The registry is the single writer of the live job table. Each created
//! job owns one spawned task running the driver, a bounded event channel
//! for its subscriber, and a cancellation token. The emitter injected
//! into the driver assigns monotonic event ids, persists envelopes, and
//! broadcasts them; the status state machine advances exactly on event
//! emission (`started` → running, terminal event → terminal status).

use std::collections::HashMap;
use std::sync::Arc;

use anneal_core::{
    Clock, Driver, DriverError, EmitError, EventEnvelope, EventSink, Job, JobId, JobRecord,
    JobStatus, RunSpec,
};
use anneal_storage::{JobStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::metrics::Metrics;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One live job: state, subscriber channel, and execution handle.
pub struct JobEntry {
    job: Mutex<Job>,
    tx: mpsc::Sender<EventEnvelope>,
    /// Held by at most one stream reader at a time; returned on exit.
    receiver: tokio::sync::Mutex<Option<mpsc::Receiver<EventEnvelope>>>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl JobEntry {
    fn new(job: Job, capacity: usize) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Arc::new(Self {
            job: Mutex::new(job),
            tx,
            receiver: tokio::sync::Mutex::new(Some(rx)),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        })
    }

    pub fn snapshot(&self) -> JobRecord {
        self.job.lock().record()
    }

    pub fn status(&self) -> JobStatus {
        self.job.lock().status
    }

    pub fn terminal_emitted(&self) -> bool {
        self.job.lock().terminal_emitted
    }

    pub(crate) async fn take_receiver(&self) -> Option<mpsc::Receiver<EventEnvelope>> {
        self.receiver.lock().await.take()
    }

    pub(crate) async fn return_receiver(&self, rx: mpsc::Receiver<EventEnvelope>) {
        *self.receiver.lock().await = Some(rx);
    }
}

/// The mediator between a driver and the job's channel + store.
pub(crate) struct Emitter<C: Clock> {
    entry: Arc<JobEntry>,
    store: Arc<dyn JobStore>,
    clock: C,
    settings: Arc<Settings>,
    metrics: Arc<Metrics>,
}

impl<C: Clock> Emitter<C> {
    /// Backpressure protocol: fail the job, reserve a strictly greater id
    /// for the synthetic `failed` envelope, persist it, and try a
    /// non-blocking enqueue. No further emits are accepted.
    async fn fail_backpressure(&self) -> Result<(), EmitError> {
        let envelope = {
            let mut job = self.entry.job.lock();
            let ts = self.clock.epoch_secs();
            let id = job.allocate_event_id();
            let data = json!({"error": "sse_backpressure"});
            job.apply_terminal("failed", &data);
            job.updated_at = ts;
            EventEnvelope::new("failed", job.id.clone(), ts, id, data)
        };
        Metrics::inc(&self.metrics.jobs_failed);
        if let Err(err) = self.store.save_event(&envelope).await {
            warn!(job_id = %envelope.job_id, error = %err, "failed to persist backpressure event");
        }
        let _ = self.entry.tx.try_send(envelope);
        let record = self.entry.snapshot();
        if let Err(err) = self.store.save_job(&record).await {
            warn!(job_id = %record.id, error = %err, "failed to persist backpressure state");
        }
        Err(EmitError::Backpressure)
    }
}

#[async_trait]
impl<C: Clock> EventSink for Emitter<C> {
    async fn emit(&self, event_type: &str, data: Value) -> Result<(), EmitError> {
        let envelope = {
            let mut job = self.entry.job.lock();
            if job.terminal_emitted {
                return Err(EmitError::Terminal);
            }
            if event_type == "started" && job.status == JobStatus::Pending {
                job.status = JobStatus::Running;
            }
            let id = job.allocate_event_id();
            EventEnvelope::new(event_type, job.id.clone(), self.clock.epoch_secs(), id, data)
        };

        let timeout = self.settings.sse_backpressure_fail_timeout;
        if self.entry.tx.send_timeout(envelope.clone(), timeout).await.is_err() {
            return self.fail_backpressure().await;
        }

        // Store failures are logged, not fatal: the subscriber already saw
        // the event and the job must not be terminalized for it.
        if let Err(err) = self.store.save_event(&envelope).await {
            warn!(job_id = %envelope.job_id, error = %err, "failed to persist event");
        }

        let record = {
            let mut job = self.entry.job.lock();
            if envelope.is_terminal() {
                job.apply_terminal(&envelope.event_type, &envelope.data);
                match envelope.event_type.as_str() {
                    "finished" => Metrics::inc(&self.metrics.jobs_finished),
                    "failed" => Metrics::inc(&self.metrics.jobs_failed),
                    "cancelled" => Metrics::inc(&self.metrics.jobs_cancelled),
                    _ => {}
                }
            }
            job.updated_at = envelope.ts;
            job.record()
        };
        if let Err(err) = self.store.save_job(&record).await {
            warn!(job_id = %record.id, error = %err, "failed to persist job");
        }
        Ok(())
    }
}

/// Authoritative in-memory job table plus lifecycle coordination.
pub struct JobRegistry<C: Clock> {
    settings: Arc<Settings>,
    store: Arc<dyn JobStore>,
    driver: Arc<dyn Driver>,
    clock: C,
    metrics: Arc<Metrics>,
    jobs: Mutex<HashMap<JobId, Arc<JobEntry>>>,
    shutdown: CancellationToken,
}

impl<C: Clock> JobRegistry<C> {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn JobStore>,
        driver: Arc<dyn Driver>,
        clock: C,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            settings,
            store,
            driver,
            clock,
            metrics,
            jobs: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    fn emitter(&self, entry: &Arc<JobEntry>) -> Emitter<C> {
        Emitter {
            entry: Arc::clone(entry),
            store: Arc::clone(&self.store),
            clock: self.clock.clone(),
            settings: Arc::clone(&self.settings),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Submission gate: idempotent create-or-return.
    ///
    /// With an idempotency key, a live registry entry wins, then a stored
    /// row (returned as a read-only stub). Otherwise a fresh job is
    /// created, persisted, and its driver task started. The
    /// lookup-then-insert is not transactional; simultaneous duplicate
    /// submissions may both create a job (the loser is reaped normally).
    pub async fn create(
        self: &Arc<Self>,
        iterations: u32,
        payload: Value,
        idempotency_key: Option<&str>,
    ) -> Result<(JobRecord, bool), RegistryError> {
        let now = self.clock.epoch_secs();
        if let Some(key) = idempotency_key {
            if let Some(existing) = self
                .store
                .get_idempotent(key, now, self.settings.idempotency_ttl_secs)
                .await?
            {
                if let Some(entry) = self.jobs.lock().get(existing.as_str()).cloned() {
                    return Ok((entry.snapshot(), false));
                }
                if let Some(record) = self.store.get_job(existing.as_str()).await? {
                    return Ok((record, false));
                }
            }
        }

        let iterations = iterations.clamp(1, self.settings.max_iterations.max(1));
        let job = Job::new(JobId::new(), &self.clock);
        let job_id = job.id.clone();
        let record = job.record();
        let entry = JobEntry::new(job, self.settings.sse_buffer_size);
        self.jobs.lock().insert(job_id.clone(), Arc::clone(&entry));
        self.store.save_job(&record).await?;

        let task = tokio::spawn(Arc::clone(self).run_job(Arc::clone(&entry), iterations, payload));
        *entry.task.lock() = Some(task);

        if let Some(key) = idempotency_key {
            self.store.save_idempotency(key, &job_id, now).await?;
        }
        Metrics::inc(&self.metrics.jobs_created);
        Ok((record, true))
    }

    async fn run_job(self: Arc<Self>, entry: Arc<JobEntry>, iterations: u32, payload: Value) {
        let sink = self.emitter(&entry);
        let spec = RunSpec {
            iterations,
            payload,
            deadline: self.clock.now() + self.settings.max_wall_time,
        };
        let cancel = entry.cancel.clone();

        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            result = self.driver.run(&sink, spec) => Some(result),
        };

        match outcome {
            // Cancel won the race; the registry supplies the terminal.
            // The latch makes this a no-op if a terminal already landed.
            None => {
                if let Err(err) = sink.emit("cancelled", json!({})).await {
                    debug!(error = %err, "cancel terminal suppressed");
                }
            }
            Some(Ok(())) => {}
            // Backpressure or late emit: the job is already terminal.
            Some(Err(DriverError::Emit(_))) => {}
            Some(Err(DriverError::Failed(message))) => {
                if let Err(err) = sink.emit("failed", json!({"error": message})).await {
                    debug!(error = %err, "failure terminal suppressed");
                }
            }
        }
    }

    /// Signal cancellation. Returns false unless the job is live and
    /// running; the status transition happens in the job task's
    /// cancellation handler.
    pub fn cancel(&self, job_id: &str) -> bool {
        let Some(entry) = self.jobs.lock().get(job_id).cloned() else {
            return false;
        };
        if entry.status() != JobStatus::Running {
            return false;
        }
        entry.cancel.cancel();
        true
    }

    /// Live snapshot of a job, if it is still in the table.
    pub fn get_job(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.lock().get(job_id).map(|entry| entry.snapshot())
    }

    /// Entry handle for a stream reader.
    pub fn subscribe(&self, job_id: &str) -> Option<Arc<JobEntry>> {
        self.jobs.lock().get(job_id).cloned()
    }

    /// Pop a job from the table, cancelling and aborting its task so an
    /// admin delete cannot leave an orphan writer behind.
    pub fn remove(&self, job_id: &str) -> Option<Arc<JobEntry>> {
        let entry = self.jobs.lock().remove(job_id)?;
        entry.cancel.cancel();
        let task = entry.task.lock().take();
        if let Some(task) = task {
            task.abort();
        }
        Some(entry)
    }

    pub fn live_jobs(&self) -> usize {
        self.jobs.lock().len()
    }

    /// One reaper sweep: drop terminal jobs older than their TTL from the
    /// in-memory table. Store rows are kept for admin deletion.
    pub fn reap_once(&self) {
        let now = self.clock.epoch_secs();
        let mut jobs = self.jobs.lock();
        jobs.retain(|_, entry| {
            let job = entry.job.lock();
            let Some(ttl) = self.settings.ttl_for_secs(job.status) else {
                return true;
            };
            now - job.updated_at <= ttl
        });
    }

    /// Periodic sweep until shutdown.
    pub async fn reaper_loop(self: Arc<Self>) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.settings.job_reaper_interval) => {}
            }
            self.reap_once();
        }
    }

    /// Stop the reaper, emit a `shutdown` terminal to every job that has
    /// not terminalized, and cancel all execution handles. In-flight
    /// cancellations are superseded by the shutdown terminal.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let entries: Vec<Arc<JobEntry>> = self.jobs.lock().values().cloned().collect();
        for entry in entries {
            if !entry.terminal_emitted() {
                let sink = self.emitter(&entry);
                if let Err(err) = sink.emit("shutdown", json!({})).await {
                    debug!(error = %err, "shutdown terminal suppressed");
                }
            }
            entry.cancel.cancel();
            let task = entry.task.lock().take();
            if let Some(task) = task {
                task.abort();
            }
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
