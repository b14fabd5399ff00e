// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine and durable job record.

use crate::clock::Clock;
use crate::envelope;
use crate::id::JobId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a job.
///
/// Transitions run only along `pending → running → (finished | failed |
/// cancelled)`; terminal states are absorbing. The transition into a
/// terminal state happens exactly when the matching terminal event is
/// emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Finished,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed | JobStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status string. Unknown strings map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "finished" => Some(JobStatus::Finished),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Finished => "finished",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// A job instance, as held live in the registry.
///
/// The registry owns the companion event channel and execution handle;
/// this struct carries only the state that both the emitter and the
/// durable store care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// Epoch seconds at creation.
    pub created_at: f64,
    /// Epoch seconds of the last emit or status change.
    pub updated_at: f64,
    /// Terminal payload; populated only for finished/failed jobs.
    pub result: Option<Value>,
    /// Next per-job event id to hand out. Strictly increasing from 1.
    pub next_event_id: u64,
    /// Latch set when a terminal event has been enqueued.
    pub terminal_emitted: bool,
}

impl Job {
    /// Create a new pending job.
    pub fn new(id: JobId, clock: &impl Clock) -> Self {
        let now = clock.epoch_secs();
        Self {
            id,
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            result: None,
            next_event_id: 1,
            terminal_emitted: false,
        }
    }

    /// Hand out the next event id and advance the counter.
    pub fn allocate_event_id(&mut self) -> u64 {
        let id = self.next_event_id;
        self.next_event_id += 1;
        id
    }

    /// Apply the status effect of an emitted terminal event and set the
    /// latch. `shutdown` is a courtesy terminal for subscribers only; the
    /// job keeps its last observed status.
    pub fn apply_terminal(&mut self, event_type: &str, data: &Value) {
        debug_assert!(envelope::is_terminal(event_type));
        match event_type {
            "finished" => {
                self.status = JobStatus::Finished;
                self.result = Some(data.clone());
            }
            "failed" => {
                self.status = JobStatus::Failed;
                self.result = Some(data.clone());
            }
            "cancelled" => {
                self.status = JobStatus::Cancelled;
            }
            _ => {}
        }
        self.terminal_emitted = true;
    }

    /// Snapshot for the durable store.
    pub fn record(&self) -> JobRecord {
        JobRecord {
            id: self.id.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            result: self.result.clone(),
        }
    }
}

/// Durable row shape for a job, shared by both store backends and by the
/// read-only stubs the submission gate synthesizes for idempotent replays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub created_at: f64,
    pub updated_at: f64,
    pub result: Option<Value>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
