use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::models::FieldError;

/// Failure to persist a submission.
#[derive(Debug)]
pub enum StoreError {
    /// One entry per violated field.
    Validation(Vec<FieldError>),
    /// Uniqueness conflict, carrying the conflicting field.
    Conflict(String),
    Database(sqlx::Error),
    Unknown(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation failed: {joined}")
            }
            StoreError::Conflict(field) => write!(f, "Conflict on field: {field}"),
            StoreError::Database(err) => write!(f, "Database Error: {err}"),
            StoreError::Unknown(msg) => write!(f, "Storage Error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Validation(Vec<FieldError>),
    RateLimited(u64),
    /// Persistence failed. The cause is never sent to the client.
    Persistence(StoreError),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Validation(errors) => write!(f, "Validation Error: {} field(s)", errors.len()),
            AppError::RateLimited(secs) => write!(f, "Rate Limited: retry after {secs}s"),
            AppError::Persistence(err) => write!(f, "Persistence Error: {err}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => AppError::Validation(errors),
            other => AppError::Persistence(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                axum::Json(json!({ "success": false, "message": msg })),
            )
                .into_response(),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({ "success": false, "message": msg })),
            )
                .into_response(),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({
                    "success": false,
                    "message": "Validation Error",
                    "errors": errors,
                })),
            )
                .into_response(),
            AppError::RateLimited(retry_after) => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                axum::Json(json!({
                    "success": false,
                    "message": "Too many submissions, please try again later.",
                })),
            )
                .into_response(),
            AppError::Persistence(err) => {
                let mut body = json!({
                    "success": false,
                    "message": "Failed to process your request",
                    "error": "The submission could not be stored",
                });
                if let StoreError::Conflict(field) = &err {
                    body["field"] = json!(field);
                }
                (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(json!({
                        "success": false,
                        "message": "Internal server error",
                    })),
                )
                    .into_response()
            }
        }
    }
}
