// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized configuration for the server.
//!
//! Every option can be overridden through an environment variable of the
//! same name; defaults are chosen for a single-process deployment.

use std::time::Duration;

/// Which store backend to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen address for the HTTP surface.
    pub bind_addr: String,
    pub job_store: StoreKind,
    pub sqlite_path: String,

    /// Max per-job events retained in the store and max channel depth.
    pub sse_buffer_size: usize,
    /// Keep-alive cadence and channel read timeout.
    pub sse_ping_interval: Duration,
    /// Max wait before the emitter declares backpressure.
    pub sse_backpressure_fail_timeout: Duration,
    /// Reconnect delay advertised in the stream prelude.
    pub sse_retry_ms: u64,

    /// Clamp on submitted iteration counts.
    pub max_iterations: u32,
    /// Per-job wall-clock deadline.
    pub max_wall_time: Duration,
    /// Max age of a usable idempotency record, seconds.
    pub idempotency_ttl_secs: f64,

    pub job_reaper_interval: Duration,
    /// In-memory retention by terminal status, seconds.
    pub job_ttl_finished_secs: f64,
    pub job_ttl_failed_secs: f64,
    pub job_ttl_cancelled_secs: f64,

    pub require_auth: bool,
    pub api_bearer_tokens: Vec<String>,
    pub rate_limit_per_min: f64,
    pub rate_limit_burst: f64,
    pub max_request_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            job_store: StoreKind::Memory,
            sqlite_path: "anneal.db".to_string(),
            sse_buffer_size: 64,
            sse_ping_interval: Duration::from_secs(5),
            sse_backpressure_fail_timeout: Duration::from_secs(2),
            sse_retry_ms: 1500,
            max_iterations: 50,
            max_wall_time: Duration::from_secs(300),
            idempotency_ttl_secs: 600.0,
            job_reaper_interval: Duration::from_secs(60),
            job_ttl_finished_secs: 3600.0,
            job_ttl_failed_secs: 600.0,
            job_ttl_cancelled_secs: 600.0,
            require_auth: false,
            api_bearer_tokens: Vec::new(),
            rate_limit_per_min: 60.0,
            rate_limit_burst: 10.0,
            max_request_bytes: 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_var(name).and_then(|s| s.parse().ok())
}

/// Seconds expressed as a float, e.g. `SSE_BACKPRESSURE_FAIL_TIMEOUT_S=0.001`.
fn env_duration_secs(name: &str) -> Option<Duration> {
    env_parse::<f64>(name).and_then(duration_from_secs)
}

fn duration_from_secs(secs: f64) -> Option<Duration> {
    if secs.is_finite() && secs >= 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

fn env_list(name: &str) -> Option<Vec<String>> {
    env_var(name).map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
}

impl Settings {
    /// Read settings from the environment, falling back to defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut settings = Settings::default();
        if let Some(v) = env_var("BIND_ADDR") {
            settings.bind_addr = v;
        }
        if let Some(v) = env_var("JOB_STORE") {
            settings.job_store = match v.as_str() {
                "sqlite" => StoreKind::Sqlite,
                _ => StoreKind::Memory,
            };
        }
        if let Some(v) = env_var("SQLITE_PATH") {
            settings.sqlite_path = v;
        }
        if let Some(v) = env_parse("SSE_BUFFER_SIZE") {
            settings.sse_buffer_size = v;
        }
        if let Some(v) = env_duration_secs("SSE_PING_INTERVAL_S") {
            settings.sse_ping_interval = v;
        }
        if let Some(v) = env_duration_secs("SSE_BACKPRESSURE_FAIL_TIMEOUT_S") {
            settings.sse_backpressure_fail_timeout = v;
        }
        if let Some(v) = env_parse("SSE_RETRY_MS") {
            settings.sse_retry_ms = v;
        }
        if let Some(v) = env_parse("MAX_ITERATIONS") {
            settings.max_iterations = v;
        }
        if let Some(v) = env_duration_secs("MAX_WALL_TIME_S") {
            settings.max_wall_time = v;
        }
        if let Some(v) = env_parse("IDEMPOTENCY_TTL_S") {
            settings.idempotency_ttl_secs = v;
        }
        if let Some(v) = env_duration_secs("JOB_REAPER_INTERVAL_S") {
            settings.job_reaper_interval = v;
        }
        if let Some(v) = env_parse("JOB_TTL_FINISHED_S") {
            settings.job_ttl_finished_secs = v;
        }
        if let Some(v) = env_parse("JOB_TTL_FAILED_S") {
            settings.job_ttl_failed_secs = v;
        }
        if let Some(v) = env_parse("JOB_TTL_CANCELLED_S") {
            settings.job_ttl_cancelled_secs = v;
        }
        if let Some(v) = env_parse("REQUIRE_AUTH") {
            settings.require_auth = v;
        }
        if let Some(v) = env_list("API_BEARER_TOKENS") {
            settings.api_bearer_tokens = v;
            settings.require_auth = true;
        }
        if let Some(v) = env_parse("RATE_LIMIT_PER_MIN") {
            settings.rate_limit_per_min = v;
        }
        if let Some(v) = env_parse("RATE_LIMIT_BURST") {
            settings.rate_limit_burst = v;
        }
        if let Some(v) = env_parse("MAX_REQUEST_BYTES") {
            settings.max_request_bytes = v;
        }
        if let Some(v) = env_list("CORS_ALLOWED_ORIGINS") {
            settings.cors_allowed_origins = v;
        }
        settings
    }

    pub fn ttl_for_secs(&self, status: anneal_core::JobStatus) -> Option<f64> {
        match status {
            anneal_core::JobStatus::Finished => Some(self.job_ttl_finished_secs),
            anneal_core::JobStatus::Failed => Some(self.job_ttl_failed_secs),
            anneal_core::JobStatus::Cancelled => Some(self.job_ttl_cancelled_secs),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
