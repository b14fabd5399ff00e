// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! anneal-wire: wire shapes for the optimization job server.
//!
//! Event-stream framing, request/response DTOs, and the error envelope
//! shared by every non-stream error response.

mod error;
mod sse;
mod types;

pub use error::{ApiError, ErrorBody, ErrorCode};
pub use sse::{frame, keep_alive, retry_prelude};
pub use types::{JobState, JobSummary, ListJobsResponse, OptimizeRequest, OptimizeResponse};
