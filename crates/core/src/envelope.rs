// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical event envelope and its serialized form.
//!
//! The envelope is the unit of everything observable about a job: it is
//! what the emitter enqueues, what the store persists, and what the wire
//! layer frames for subscribers. Serialization is compact JSON with a
//! fixed field order (`type, schema_version, job_id, ts, id, data`), so a
//! given envelope always produces identical bytes.

use crate::id::JobId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope schema version carried on every event.
pub const SCHEMA_VERSION: u32 = 1;

/// Event types that end a job's stream. Exactly one per job.
pub const TERMINAL_EVENTS: [&str; 4] = ["finished", "failed", "cancelled", "shutdown"];

/// Whether the given event type ends a job's stream.
pub fn is_terminal(event_type: &str) -> bool {
    TERMINAL_EVENTS.contains(&event_type)
}

/// One step in a job's observable progress.
///
/// `event_type` is free-form for non-terminal events; drivers may emit
/// their own progress subtypes (`mutation`, `selected`, ...) which are
/// stored and forwarded verbatim. `data` is opaque to the control plane
/// apart from the terminal `error` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub schema_version: u32,
    pub job_id: JobId,
    /// Event timestamp, epoch seconds.
    pub ts: f64,
    /// Monotonic per-job event id, starting at 1.
    pub id: u64,
    pub data: Value,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, job_id: JobId, ts: f64, id: u64, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            schema_version: SCHEMA_VERSION,
            job_id,
            ts,
            id,
            data,
        }
    }

    pub fn is_terminal(&self) -> bool {
        is_terminal(&self.event_type)
    }

    /// Compact JSON with stable key order; the canonical wire and storage
    /// representation of this envelope.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
