// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request and response DTOs for the optimize and admin surfaces.

use anneal_core::{JobId, JobRecord, JobStatus};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Submission body for `POST /optimize`.
///
/// Only `prompt` is required; everything else is handed to the driver
/// verbatim. Unknown option fields are collected rather than rejected so
/// driver-specific knobs (seed, objectives, model options, ...) pass
/// through without the control plane naming them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl OptimizeRequest {
    /// Flatten into the opaque driver payload.
    pub fn into_payload(self) -> Value {
        let mut payload = self.options;
        payload.insert("prompt".into(), Value::String(self.prompt));
        if let Some(context) = self.context {
            payload.insert("context".into(), context);
        }
        Value::Object(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResponse {
    pub job_id: JobId,
}

/// Full job view returned by `GET /optimize/{id}` and on cancel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: f64,
    pub updated_at: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

impl From<JobRecord> for JobState {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.id,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            result: record.result,
        }
    }
}

/// Row projection for the admin job listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: f64,
    pub updated_at: f64,
}

impl From<JobRecord> for JobSummary {
    fn from(record: JobRecord) -> Self {
        Self {
            job_id: record.id,
            status: record.status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobSummary>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
