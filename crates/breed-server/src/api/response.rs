//! API response types
//!
//! Every non-2xx response carries the same flat `{message, status, code}`
//! body, where `status` is a stable machine-readable tag and `code` repeats
//! the HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Standard error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub status: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.into(),
            code: code.as_u16(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Body of `GET /_healthz`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub code: u16,
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn available() -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            status: "OK".to_string(),
            message: "Available!".to_string(),
        }
    }
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
