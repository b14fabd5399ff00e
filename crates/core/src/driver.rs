// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver-facing contract.
//!
//! The control plane sees the optimization algorithm as a [`Driver`]: a
//! task that, given an [`EventSink`] and a [`RunSpec`], emits `started`,
//! any number of progress events, and exactly one terminal event, while
//! honoring the deadline cooperatively. Cancellation reaches the driver
//! at its next await point; if cancel or shutdown wins, the registry
//! supplies the terminal event instead.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;

/// Why an emit was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EmitError {
    /// The subscriber channel stayed full past the backpressure timeout.
    /// The job has already been failed with `error = "sse_backpressure"`;
    /// the driver must stop emitting and return.
    #[error("subscriber channel backpressure")]
    Backpressure,

    /// A terminal event has already been emitted for this job.
    #[error("job already terminal")]
    Terminal,
}

/// Driver failure. Any error that escapes the driver becomes a `failed`
/// terminal with `data.error` set to the stringified cause.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("{0}")]
    Failed(String),
}

/// Emission handle the registry injects into the driver.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event. Assigns the next monotonic id, persists the
    /// envelope, and broadcasts it to the job's subscriber channel.
    async fn emit(&self, event_type: &str, data: Value) -> Result<(), EmitError>;
}

/// Parameters for one optimization run.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Iteration budget, already clamped to the configured maximum.
    pub iterations: u32,
    /// Opaque submission payload (prompt, options, ...).
    pub payload: Value,
    /// Wall-clock deadline. The driver checks this at every iteration
    /// boundary and emits `failed {error: "deadline_exceeded"}` itself;
    /// the control plane never interrupts externally.
    pub deadline: Instant,
}

impl RunSpec {
    pub fn deadline_exceeded(&self) -> bool {
        Instant::now() > self.deadline
    }
}

/// The optimization task contract.
///
/// Implementations must emit `started` before anything else and must
/// yield between emits so cancellation can take effect. Returning `Ok`
/// means the driver emitted its own terminal (`finished`, or `failed` on
/// deadline). Returning `Err` makes the registry emit `failed` with the
/// error text, unless the error is [`EmitError::Backpressure`], in which
/// case the job is already terminal.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    async fn run(&self, sink: &dyn EventSink, spec: RunSpec) -> Result<(), DriverError>;
}
