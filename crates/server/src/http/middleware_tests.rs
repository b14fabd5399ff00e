// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn ct_eq_matches_equal_strings() {
    assert!(ct_eq("secret-token", "secret-token"));
    assert!(!ct_eq("secret-token", "secret-tokem"));
    assert!(!ct_eq("short", "longer-token"));
    assert!(ct_eq("", ""));
}

#[test]
fn limiter_allows_burst_then_blocks() {
    let limiter = RateLimiter::new(60.0, 2.0);
    assert!(limiter.acquire("k").is_ok());
    assert!(limiter.acquire("k").is_ok());
    let retry_after = limiter.acquire("k").unwrap_err();
    assert!(retry_after >= 1);
}

#[test]
fn limiter_isolates_keys() {
    let limiter = RateLimiter::new(60.0, 1.0);
    assert!(limiter.acquire("a").is_ok());
    assert!(limiter.acquire("b").is_ok());
    assert!(limiter.acquire("a").is_err());
}

#[test]
fn limiter_with_zero_rate_reports_fallback_retry() {
    let limiter = RateLimiter::new(0.0, 1.0);
    assert!(limiter.acquire("k").is_ok());
    assert_eq!(limiter.acquire("k").unwrap_err(), 60);
}
