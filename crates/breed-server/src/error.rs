//! Server-specific error types
//!
//! [`AppError`] is the only error a handler returns. Its response never
//! carries the underlying detail; that goes to the log instead.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

use crate::api::response::ErrorResponse;
use crate::db::DbError;
use crate::features::breeds::ListBreedsError;

pub const BINDING_ERROR_MESSAGE: &str = "Request body must be a valid JSON.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request body: {0}")]
    Binding(#[from] JsonRejection),

    #[error("Breed inquiry failed: {0}")]
    ListBreeds(#[from] ListBreedsError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Health check timed out after {0:?}")]
    HealthTimeout(Duration),

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Binding(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::ListBreeds(_)
            | AppError::Database(_)
            | AppError::HealthTimeout(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            AppError::Binding(ref rejection) => {
                tracing::debug!(error = %rejection, "Rejected request body");
                ErrorResponse::new(status, "BINDING_ERROR", BINDING_ERROR_MESSAGE)
            },
            AppError::NotFound => ErrorResponse::new(status, "NOT_FOUND", "Not found"),
            AppError::MethodNotAllowed => {
                ErrorResponse::new(status, "METHOD_NOT_ALLOWED", "Method not allowed")
            },
            AppError::RateLimited => ErrorResponse::new(
                status,
                "RESOURCE_EXHAUSTED",
                "Too many requests. Please try again later.",
            ),
            AppError::ListBreeds(ref e) => {
                tracing::error!(error = ?e, "Breed inquiry failed");
                ErrorResponse::new(status, "INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            },
            AppError::Database(ref e) => {
                tracing::error!(error = ?e, "Database error");
                ErrorResponse::new(status, "INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            },
            AppError::HealthTimeout(timeout) => {
                tracing::error!(?timeout, "Health check timed out");
                ErrorResponse::new(status, "INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                ErrorResponse::new(status, "INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            },
        };

        body.into_response()
    }
}
