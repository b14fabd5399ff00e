// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The optimize surface: submit, inspect, cancel, and stream a job.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use anneal_core::JobStatus;
use anneal_wire::{ErrorCode, JobState, OptimizeRequest, OptimizeResponse};
use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::{error_response, internal_error, lookup_job, AppState};
use crate::stream::run_stream;

/// `POST /optimize` — submit a job.
pub(crate) async fn create_job(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let iterations = match params.get("iterations") {
        None => 1,
        Some(raw) => match raw.parse::<u32>() {
            Ok(n) if n >= 1 => n,
            _ => {
                return error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorCode::ValidationError,
                    "iterations must be an integer >= 1",
                )
            }
        },
    };

    let request: OptimizeRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(
                    anneal_wire::ErrorBody::new(ErrorCode::ValidationError, "Invalid request")
                        .with_details(json!({"error": err.to_string()})),
                ),
            )
                .into_response()
        }
    };

    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match state
        .registry
        .create(iterations, request.into_payload(), idempotency_key.as_deref())
        .await
    {
        Ok((record, _fresh)) => Json(OptimizeResponse { job_id: record.id }).into_response(),
        Err(err) => internal_error(err),
    }
}

/// `GET /optimize/{id}` — job state, registry first then store.
pub(crate) async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match lookup_job(&state, &id).await {
        Ok(Some(record)) => Json(JobState::from(record)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Job not found"),
        Err(err) => internal_error(err),
    }
}

/// `DELETE /optimize/{id}` — request cancellation of a running job.
pub(crate) async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if let Some(entry) = state.registry.subscribe(&id) {
        if entry.status() != JobStatus::Running {
            return error_response(
                StatusCode::CONFLICT,
                ErrorCode::NotCancelable,
                "Job is not running",
            );
        }
        state.registry.cancel(&id);
        return Json(JobState::from(entry.snapshot())).into_response();
    }
    match state.store.get_job(&id).await {
        // Present in the store but not live: terminal, so not cancelable.
        Ok(Some(_)) => error_response(
            StatusCode::CONFLICT,
            ErrorCode::NotCancelable,
            "Job is not running",
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Job not found"),
        Err(err) => internal_error(err),
    }
}

/// `GET /optimize/{id}/events` — resumable event stream.
pub(crate) async fn stream_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let entry = state.registry.subscribe(&id);
    if entry.is_none() {
        match state.store.get_job(&id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Job not found")
            }
            Err(err) => return internal_error(err),
        }
    }

    let last_id = headers
        .get("last-event-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .or_else(|| params.get("last_event_id").and_then(|v| v.parse().ok()))
        .unwrap_or(0);

    let (tx, rx) = mpsc::channel::<String>(16);
    tokio::spawn(run_stream(
        id,
        last_id,
        entry,
        Arc::clone(&state.store),
        Arc::clone(&state.settings),
        Arc::clone(&state.metrics),
        tx,
    ));

    let body = Body::from_stream(
        ReceiverStream::new(rx).map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk))),
    );
    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-store"),
            (header::CONNECTION, "keep-alive"),
            (header::HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        body,
    )
        .into_response()
}
