// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: routes, shared state, and the error envelope helper.

pub mod admin;
pub mod health;
pub mod middleware;
pub mod optimize;

use std::sync::Arc;

use anneal_core::{JobRecord, SystemClock};
use anneal_storage::{JobStore, StoreError};
use anneal_wire::{ErrorBody, ErrorCode};
use axum::http::StatusCode;
use axum::middleware as axum_middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::registry::JobRegistry;

/// The concrete registry type the HTTP surface serves.
pub type Registry = JobRegistry<SystemClock>;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub store: Arc<dyn JobStore>,
    pub settings: Arc<Settings>,
    pub metrics: Arc<Metrics>,
    pub limiter: Arc<middleware::RateLimiter>,
}

impl AppState {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn JobStore>,
        settings: Arc<Settings>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let limiter = Arc::new(middleware::RateLimiter::new(
            settings.rate_limit_per_min,
            settings.rate_limit_burst,
        ));
        Self {
            registry,
            store,
            settings,
            metrics,
            limiter,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/optimize", post(optimize::create_job))
        .route(
            "/optimize/:id",
            get(optimize::get_job).delete(optimize::cancel_job),
        )
        .route("/optimize/:id/events", get(optimize::stream_events))
        .route("/admin/jobs", get(admin::list_jobs))
        .route(
            "/admin/jobs/:id",
            get(admin::get_job).delete(admin::delete_job),
        )
        .route("/admin/jobs/:id/cancel", post(admin::cancel_job))
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/metrics", get(health::metrics))
        // Added innermost-first; requests traverse logging → auth →
        // rate limit → size limit before reaching a handler.
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::size_limit,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_log,
        ));
    if !state.settings.cors_allowed_origins.is_empty() {
        router = router.layer(middleware::cors_layer(&state.settings));
    }
    router.with_state(state)
}

pub(crate) fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(code, message))).into_response()
}

pub(crate) fn internal_error(err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "internal error");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorCode::InternalError,
        "Internal server error",
    )
}

/// Registry first, then the store.
pub(crate) async fn lookup_job(
    state: &AppState,
    job_id: &str,
) -> Result<Option<JobRecord>, StoreError> {
    if let Some(record) = state.registry.get_job(job_id) {
        return Ok(Some(record));
    }
    state.store.get_job(job_id).await
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
