//! Webhook endpoint handlers.
//!
//! The WPForms handler:
//! 1. Captures the raw body before any JSON parsing
//! 2. Runs the verification pipeline
//! 3. Sends the explicit error payload on rejection, or forwards the
//!    submission and answers with the default acknowledgement

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::queue::{Publisher, SubmissionEvent};
use crate::respond::{evaluate, ResponsePayload};
use crate::verify::{unix_now, IncomingRequest, TIMESTAMP_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when forwarding is not configured
    pub publisher: Option<Publisher>,
}

impl AppState {
    pub fn new(config: Config, publisher: Option<Publisher>) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// WPForms Webhook
// =============================================================================

/// Default acknowledgement sent once a submission is accepted.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub message: &'static str,
}

/// WPForms webhook endpoint.
pub async fn wpforms_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = incoming_request(&headers, &body);

    info!(
        body_length = body.len(),
        header_count = request.headers().len(),
        "wpforms_webhook_received"
    );

    let validation = &state.config.validation;
    let received_at = unix_now();
    let payload = evaluate(&request, validation, received_at);

    if payload.suppress_host_default_response {
        return explicit_response(payload);
    }

    let event = SubmissionEvent::new(
        request
            .header(TIMESTAMP_HEADER)
            .unwrap_or_default()
            .trim()
            .to_string(),
        received_at,
        request.raw_body(),
        validation.output_mode,
        payload.body,
    );

    match &state.publisher {
        Some(publisher) => {
            if let Err(e) = publisher.publish_submission(&event).await {
                error!(error = %e, "wpforms_publish_failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(WebhookResponse {
                        message: "Error in workflow",
                    }),
                )
                    .into_response();
            }
            info!(message_id = %event.message_id(), "wpforms_submission_forwarded");
        }
        None => {
            info!(message_id = %event.message_id(), "wpforms_forwarding_disabled");
        }
    }

    (
        StatusCode::OK,
        Json(WebhookResponse {
            message: "Workflow was started",
        }),
    )
        .into_response()
}

/// Build the core request from the HTTP parts.
///
/// Header values that are not valid visible ASCII are skipped.
fn incoming_request(headers: &HeaderMap, body: &Bytes) -> IncomingRequest {
    let pairs = headers.iter().filter_map(|(name, value)| match value.to_str() {
        Ok(v) => Some((name.as_str(), v)),
        Err(_) => {
            warn!(header = %name, "wpforms_header_not_utf8");
            None
        }
    });

    IncomingRequest::new(pairs, body.to_vec())
}

/// Send a payload exactly as the shaper built it.
fn explicit_response(payload: ResponsePayload) -> Response {
    let status = StatusCode::from_u16(payload.status_code).unwrap_or(StatusCode::FORBIDDEN);
    (status, Json(payload.body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[tokio::test]
    async fn test_health() {
        let Json(response) = health().await;
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn test_incoming_request_lowercases_and_skips_opaque_values() {
        let mut headers = HeaderMap::new();
        headers.insert("X-WPForms-Timestamp", HeaderValue::from_static("1700000000"));
        headers.insert(
            "x-binary",
            HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap(),
        );

        let request = incoming_request(&headers, &Bytes::from_static(b"{}"));

        assert_eq!(request.header(TIMESTAMP_HEADER), Some("1700000000"));
        assert!(request.header("x-binary").is_none());
        assert_eq!(request.raw_body(), b"{}");
    }

    #[test]
    fn test_explicit_response_keeps_status() {
        let payload = ResponsePayload::error(401, json!({"success": false}));
        let response = explicit_response(payload);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
