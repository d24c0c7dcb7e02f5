pub mod contact;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .route("/api/forms/contact", post(contact::submit))
}

async fn welcome() -> Json<Value> {
    Json(json!({ "status": "success", "message": "Welcome to API" }))
}

async fn health(State(state): State<SharedState>) -> Json<Value> {
    let mail = if state.mail_ready() { "ready" } else { "unverified" };
    Json(json!({ "status": "ok", "mail": mail }))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}
