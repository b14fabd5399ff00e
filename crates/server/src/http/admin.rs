// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin surface over the registry and store.

use anneal_core::JobStatus;
use anneal_wire::{ErrorCode, JobState, JobSummary, ListJobsResponse};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::{error_response, internal_error, lookup_job, AppState};

/// `GET /admin/jobs` — project store rows to summaries.
pub(crate) async fn list_jobs(State(state): State<AppState>) -> Response {
    match state.store.list_jobs().await {
        Ok(records) => Json(ListJobsResponse {
            jobs: records.into_iter().map(JobSummary::from).collect(),
        })
        .into_response(),
        Err(err) => internal_error(err),
    }
}

/// `GET /admin/jobs/{id}`.
pub(crate) async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match lookup_job(&state, &id).await {
        Ok(Some(record)) => Json(JobState::from(record)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Job not found"),
        Err(err) => internal_error(err),
    }
}

/// `DELETE /admin/jobs/{id}` — pop from the registry, then delete the
/// store row and its events.
pub(crate) async fn delete_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    state.registry.remove(&id);
    match state.store.delete_job(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => internal_error(err),
    }
}

/// `POST /admin/jobs/{id}/cancel`.
pub(crate) async fn cancel_job(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = state.registry.subscribe(&id) else {
        return error_response(StatusCode::NOT_FOUND, ErrorCode::NotFound, "Job not found");
    };
    if entry.status() != JobStatus::Running {
        return error_response(
            StatusCode::CONFLICT,
            ErrorCode::NotCancelable,
            "Job not cancelable",
        );
    }
    state.registry.cancel(&id);
    Json(JobState::from(entry.snapshot())).into_response()
}
