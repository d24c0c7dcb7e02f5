use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde_json::json;

use crate::error::AppError;
use crate::state::SharedState;
use crate::submission::workflow::{self, SubmissionOutcome};
use crate::submission::{client_ip, fields, parser};

pub const STORED_AND_SENT: &str = "Message sent and stored successfully";
pub const STORED_EMAIL_FAILED: &str =
    "Your message was stored successfully, but email notification failed. We will contact you soon.";

pub async fn submit(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let ip = client_ip::resolve(&headers, addr.ip(), &state.config.trusted_proxies);
    if let Err(retry_after) = state.submission_limiter.check(ip) {
        tracing::warn!("Rate limited contact submission from {ip}");
        return Err(AppError::RateLimited(retry_after));
    }

    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok());
    let payload = parser::parse_body(content_type, &body).map_err(AppError::BadRequest)?;

    let form = fields::validate(payload).map_err(AppError::Validation)?;

    let outcome = workflow::run(state.store.as_ref(), state.notifier.as_ref(), form).await;

    respond(outcome)
}

/// Map a workflow outcome to the JSON contract.
pub fn respond(outcome: SubmissionOutcome) -> Result<Response, AppError> {
    match outcome {
        SubmissionOutcome::Delivered(submission) => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": STORED_AND_SENT,
                "formId": submission.id,
            })),
        )
            .into_response()),
        SubmissionOutcome::EmailFailed { submission, .. } => Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": STORED_EMAIL_FAILED,
                "formId": submission.id,
                "emailError": true,
            })),
        )
            .into_response()),
        SubmissionOutcome::Failed(e) => Err(AppError::from(e)),
    }
}
