//! Web server module for receiving WPForms webhooks.
//!
//! The server:
//! - Receives signed form submissions on `POST /webhooks/wpforms`
//! - Verifies signature and freshness before anything else
//! - Forwards accepted submissions to the workflow queue

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, wpforms_webhook, AppState, HealthResponse, WebhookResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/webhooks/wpforms", post(wpforms_webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
