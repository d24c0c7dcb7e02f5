pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod submission;

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any as AnyOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::SubmissionStore;
use crate::email::Notifier;
use crate::error::AppError;
use crate::rate_limit::SubmissionRateLimiter;
use crate::state::{AppState, SharedState};

pub fn build_app(
    config: Config,
    store: Arc<dyn SubmissionStore>,
    notifier: Option<Notifier>,
) -> (Router, SharedState) {
    let state: SharedState = Arc::new(AppState {
        submission_limiter: SubmissionRateLimiter::new(&config.rate_limit),
        mail_ready: AtomicBool::new(false),
        config,
        store,
        notifier,
    });

    let cors = cors_layer(&state.config.allowed_origins);

    let app = Router::new()
        .merge(routes::api_routes())
        .fallback(routes::not_found)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic)),
        )
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    (app, state)
}

/// Run the mail self-test in the background. Failure only leaves
/// `mail_ready` unset; the service keeps accepting submissions.
pub fn spawn_mail_check(state: SharedState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let Some(notifier) = state.notifier.as_ref() else {
            tracing::warn!("Email is not configured; submissions will be stored without notifications");
            return;
        };

        match notifier.self_test().await {
            Ok(()) => {
                state.mail_ready.store(true, Ordering::Relaxed);
                tracing::info!("Mail transport verified");
            }
            Err(e) => {
                tracing::warn!("Email configuration error: {e}");
                tracing::warn!("Application will continue to run, but email functionality may not work");
            }
        }
    })
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins.is_empty() {
        return base.allow_origin(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(format!("Request handler panicked: {detail}")).into_response()
}
