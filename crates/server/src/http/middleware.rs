// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary middleware: request logging with correlation ids, bearer
//! auth, a token-bucket rate limit on submission, and the request body
//! size limit.

use std::collections::HashMap;
use std::time::Instant;

use anneal_wire::ErrorCode;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use parking_lot::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{error_response, AppState};
use crate::config::Settings;
use crate::metrics::Metrics;

const PUBLIC_PATHS: [&str; 3] = ["/healthz", "/readyz", "/metrics"];

/// Attach/propagate a correlation id, log the request lifecycle, and
/// count it.
pub(crate) async fn request_log(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    state.metrics.record_request(method.as_str(), &path, status);
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    info!(
        method = %method,
        path = %path,
        status,
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %request_id,
        "request"
    );
    response
}

/// Bearer-token auth for non-public paths.
pub(crate) async fn auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let settings = &state.settings;
    if !settings.require_auth || PUBLIC_PATHS.contains(&req.uri().path()) {
        return next.run(req).await;
    }
    let authorized = bearer_token(&req)
        .map(|token| settings.api_bearer_tokens.iter().any(|t| ct_eq(token, t)))
        .unwrap_or(false);
    if authorized {
        next.run(req).await
    } else {
        error_response(StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, "Unauthorized")
    }
}

/// Token bucket per bearer token on `POST /optimize`.
pub(crate) async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if req.method() != Method::POST || req.uri().path() != "/optimize" {
        return next.run(req).await;
    }
    let key = bearer_token(&req).unwrap_or("anonymous").to_string();
    match state.limiter.acquire(&key) {
        Ok(()) => next.run(req).await,
        Err(retry_after_secs) => {
            Metrics::inc(&state.metrics.rate_limited);
            let mut response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                ErrorCode::RateLimited,
                "Rate limit exceeded",
            );
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            response
        }
    }
}

/// Reject bodies over `MAX_REQUEST_BYTES`.
pub(crate) async fn size_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method();
    if method != Method::POST && method != Method::PUT && method != Method::PATCH {
        return next.run(req).await;
    }
    let limit = state.settings.max_request_bytes;

    if let Some(length) = req.headers().get(header::CONTENT_LENGTH) {
        let within = length
            .to_str()
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .is_some_and(|n| n <= limit);
        if !within {
            Metrics::inc(&state.metrics.oversize_rejected);
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorCode::PayloadTooLarge,
                "Payload too large",
            );
        }
        return next.run(req).await;
    }

    // No content-length; buffer the stream up to the limit.
    let (parts, body) = req.into_parts();
    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(_) => {
            Metrics::inc(&state.metrics.oversize_rejected);
            error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorCode::PayloadTooLarge,
                "Payload too large",
            )
        }
    }
}

pub(crate) fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
}

/// Constant-time string comparison for token checks.
fn ct_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Token bucket keyed by caller identity.
pub struct RateLimiter {
    rate_per_sec: f64,
    burst: f64,
    buckets: Mutex<HashMap<String, (f64, Instant)>>,
}

impl RateLimiter {
    pub fn new(per_min: f64, burst: f64) -> Self {
        Self {
            rate_per_sec: (per_min / 60.0).max(0.0),
            burst: burst.max(1.0),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take one token, or report how many seconds until one is available.
    pub fn acquire(&self, key: &str) -> Result<(), u64> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock();
        let (tokens, last) = buckets.get(key).copied().unwrap_or((self.burst, now));
        let tokens = (tokens + now.duration_since(last).as_secs_f64() * self.rate_per_sec)
            .min(self.burst);
        if tokens < 1.0 {
            buckets.insert(key.to_string(), (tokens, now));
            let retry_after = if self.rate_per_sec > 0.0 {
                ((1.0 - tokens) / self.rate_per_sec).ceil().max(1.0) as u64
            } else {
                60
            };
            Err(retry_after)
        } else {
            buckets.insert(key.to_string(), (tokens - 1.0, now));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
