// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! anneal-server: the job control plane.
//!
//! Owns the live job table, runs one task per job driving the optimizer,
//! mediates driver events into the store and the per-job subscriber
//! channel, and serves the HTTP/SSE surface.

pub mod config;
pub mod http;
pub mod metrics;
pub mod registry;
pub mod stream;

pub use config::{Settings, StoreKind};
pub use http::{router, AppState};
pub use metrics::Metrics;
pub use registry::{JobRegistry, RegistryError};
