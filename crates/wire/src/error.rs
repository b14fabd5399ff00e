// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error envelope for all non-stream error responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Machine-readable error code carried in every error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    NotFound,
    RateLimited,
    PayloadTooLarge,
    NotCancelable,
    SseBackpressure,
    ValidationError,
    InternalError,
}

anneal_core::simple_display! {
    ErrorCode {
        Unauthorized => "unauthorized",
        NotFound => "not_found",
        RateLimited => "rate_limited",
        PayloadTooLarge => "payload_too_large",
        NotCancelable => "not_cancelable",
        SseBackpressure => "sse_backpressure",
        ValidationError => "validation_error",
        InternalError => "internal_error",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// `{"error": {"code", "message", "details"?}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ApiError {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
