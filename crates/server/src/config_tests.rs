// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use anneal_core::JobStatus;
use serial_test::serial;
use std::time::Duration;

fn clear_env() {
    for name in [
        "BIND_ADDR",
        "JOB_STORE",
        "SQLITE_PATH",
        "SSE_BUFFER_SIZE",
        "SSE_PING_INTERVAL_S",
        "SSE_BACKPRESSURE_FAIL_TIMEOUT_S",
        "SSE_RETRY_MS",
        "MAX_ITERATIONS",
        "MAX_WALL_TIME_S",
        "IDEMPOTENCY_TTL_S",
        "JOB_REAPER_INTERVAL_S",
        "JOB_TTL_FINISHED_S",
        "JOB_TTL_FAILED_S",
        "JOB_TTL_CANCELLED_S",
        "REQUIRE_AUTH",
        "API_BEARER_TOKENS",
        "RATE_LIMIT_PER_MIN",
        "RATE_LIMIT_BURST",
        "MAX_REQUEST_BYTES",
        "CORS_ALLOWED_ORIGINS",
    ] {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn defaults_when_env_unset() {
    clear_env();
    let settings = Settings::from_env();
    assert_eq!(settings.job_store, StoreKind::Memory);
    assert_eq!(settings.sse_buffer_size, 64);
    assert_eq!(settings.sse_ping_interval, Duration::from_secs(5));
    assert_eq!(settings.max_iterations, 50);
    assert!(!settings.require_auth);
}

#[test]
#[serial]
fn env_overrides_apply() {
    clear_env();
    std::env::set_var("JOB_STORE", "sqlite");
    std::env::set_var("SSE_BUFFER_SIZE", "1");
    std::env::set_var("SSE_BACKPRESSURE_FAIL_TIMEOUT_S", "0.001");
    std::env::set_var("MAX_WALL_TIME_S", "0.01");
    std::env::set_var("API_BEARER_TOKENS", "alpha, beta");

    let settings = Settings::from_env();
    assert_eq!(settings.job_store, StoreKind::Sqlite);
    assert_eq!(settings.sse_buffer_size, 1);
    assert_eq!(settings.sse_backpressure_fail_timeout, Duration::from_millis(1));
    assert_eq!(settings.max_wall_time, Duration::from_millis(10));
    assert_eq!(settings.api_bearer_tokens, vec!["alpha", "beta"]);
    assert!(settings.require_auth);
    clear_env();
}

#[test]
#[serial]
fn invalid_values_fall_back_to_defaults() {
    clear_env();
    std::env::set_var("SSE_BUFFER_SIZE", "not-a-number");
    std::env::set_var("MAX_WALL_TIME_S", "-5");

    let settings = Settings::from_env();
    assert_eq!(settings.sse_buffer_size, 64);
    assert_eq!(settings.max_wall_time, Duration::from_secs(300));
    clear_env();
}

#[test]
fn ttl_by_status() {
    let settings = Settings::default();
    assert_eq!(settings.ttl_for_secs(JobStatus::Finished), Some(3600.0));
    assert_eq!(settings.ttl_for_secs(JobStatus::Failed), Some(600.0));
    assert_eq!(settings.ttl_for_secs(JobStatus::Cancelled), Some(600.0));
    assert_eq!(settings.ttl_for_secs(JobStatus::Running), None);
    assert_eq!(settings.ttl_for_secs(JobStatus::Pending), None);
}
