//! Builds success and error payloads from a validation outcome.

use serde_json::{json, Map, Value};

use super::types::ResponsePayload;
use crate::verify::{
    IncomingRequest, OutputMode, RejectReason, Rejection, ValidationConfig, ValidationOutcome,
};

/// Turn an outcome into the payload the host will send.
pub fn shape_response(
    outcome: &ValidationOutcome,
    request: &IncomingRequest,
    config: &ValidationConfig,
) -> ResponsePayload {
    match outcome {
        ValidationOutcome::Valid => shape_success(request, config.output_mode),
        ValidationOutcome::Invalid(rejection) => shape_rejection(rejection, config),
    }
}

/// Error payload: `{ success: false, message, description?, data? }`.
///
/// `data` only appears when diagnostics are exposed, and never carries the
/// expected digest.
pub fn shape_rejection(rejection: &Rejection, config: &ValidationConfig) -> ResponsePayload {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(false));
    body.insert(
        "message".to_string(),
        Value::from(rejection.reason.message()),
    );

    if let Some(description) = describe(rejection.reason, config) {
        body.insert("description".to_string(), Value::from(description));
    }

    if config.expose_diagnostics {
        if let Some(data) = rejection.detail.public_data() {
            body.insert("data".to_string(), data);
        }
    }

    ResponsePayload::error(rejection.http_status, Value::Object(body))
}

/// Success payload in the requested output mode.
pub fn shape_success(request: &IncomingRequest, mode: OutputMode) -> ResponsePayload {
    let body = match mode {
        OutputMode::Default => default_output(request),
        OutputMode::Raw => raw_output(request),
    };

    ResponsePayload::success(body)
}

fn describe(reason: RejectReason, config: &ValidationConfig) -> Option<String> {
    match reason {
        RejectReason::MissingHeaders => None,
        RejectReason::TimestampSkewExceeded => Some(format!(
            "Timestamp is outside the allowed {}s skew.",
            config.allowed_skew_seconds
        )),
        RejectReason::SignatureMismatch => {
            Some("Signature does not match the request body.".to_string())
        }
        RejectReason::MalformedTimestamp => {
            Some("Timestamp must be whole seconds since the Unix epoch.".to_string())
        }
        RejectReason::MalformedSignatureFormat => {
            Some("Signature must be a 64-character lower-case hex digest.".to_string())
        }
    }
}

/// The submission as sent, with `success: true` added.
///
/// Top-level keys (`form`, `entry`, `fields`, `files`, `meta`, ...) pass
/// through untouched.
fn default_output(request: &IncomingRequest) -> Value {
    match request.parsed_body() {
        Some(Value::Object(fields)) => {
            let mut output = fields.clone();
            output.insert("success".to_string(), Value::Bool(true));
            Value::Object(output)
        }
        Some(other) => json!({ "success": true, "data": other }),
        None => json!({ "success": true, "body": raw_body_string(request) }),
    }
}

fn raw_output(request: &IncomingRequest) -> Value {
    json!({
        "success": true,
        "body": raw_body_string(request),
        "headers": request.headers(),
    })
}

fn raw_body_string(request: &IncomingRequest) -> String {
    String::from_utf8_lossy(request.raw_body()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{Diagnostic, SecretKey};

    fn config() -> ValidationConfig {
        ValidationConfig::new(SecretKey::new("s3cr3t").unwrap())
    }

    fn request(body: &str) -> IncomingRequest {
        IncomingRequest::new(
            [
                ("X-WPForms-Signature", "abc"),
                ("X-WPForms-Timestamp", "1700000000"),
            ],
            body,
        )
    }

    fn mismatch() -> Rejection {
        Rejection {
            reason: RejectReason::SignatureMismatch,
            http_status: 403,
            detail: Diagnostic::Digest {
                expected_prefix: "deadbeef".to_string(),
                received_prefix: "01234567".to_string(),
            },
        }
    }

    #[test]
    fn test_default_output_merges_success_marker() {
        let body = r#"{"form":{"id":12},"entry":{"id":7},"fields":[],"meta":{}}"#;
        let payload = shape_success(&request(body), OutputMode::Default);

        assert_eq!(payload.status_code, 200);
        assert!(!payload.suppress_host_default_response);
        assert_eq!(payload.body["success"], json!(true));
        assert_eq!(payload.body["form"], json!({"id": 12}));
        assert_eq!(payload.body["entry"], json!({"id": 7}));
    }

    #[test]
    fn test_default_output_overrides_sender_success_field() {
        let payload = shape_success(&request(r#"{"success":false}"#), OutputMode::Default);
        assert_eq!(payload.body, json!({"success": true}));
    }

    #[test]
    fn test_default_output_wraps_non_object() {
        let payload = shape_success(&request("[1,2]"), OutputMode::Default);
        assert_eq!(payload.body, json!({"success": true, "data": [1, 2]}));

        let payload = shape_success(&request("a=1"), OutputMode::Default);
        assert_eq!(payload.body, json!({"success": true, "body": "a=1"}));
    }

    #[test]
    fn test_raw_output_keeps_body_and_headers_verbatim() {
        let body = r#"{ "url": "https://example.com/a/b" }"#;
        let payload = shape_success(&request(body), OutputMode::Raw);

        assert_eq!(payload.body["success"], json!(true));
        assert_eq!(payload.body["body"], json!(body));
        assert_eq!(
            payload.body["headers"],
            json!({
                "x-wpforms-signature": "abc",
                "x-wpforms-timestamp": "1700000000",
            })
        );
    }

    #[test]
    fn test_rejection_payload_hides_diagnostics_by_default() {
        let payload = shape_rejection(&mismatch(), &config());

        assert_eq!(payload.status_code, 403);
        assert!(payload.suppress_host_default_response);
        assert_eq!(
            payload.body,
            json!({
                "success": false,
                "message": "Invalid signature.",
                "description": "Signature does not match the request body.",
            })
        );
    }

    #[test]
    fn test_rejection_payload_never_echoes_expected_digest() {
        let config = config().with_exposed_diagnostics(true);
        let payload = shape_rejection(&mismatch(), &config);
        let rendered = payload.body.to_string();

        assert!(!rendered.contains("deadbeef"));
        assert!(!rendered.contains("s3cr3t"));
        assert_eq!(payload.body["data"], json!({"receivedDigestPrefix": "01234567"}));
    }

    #[test]
    fn test_skew_rejection_describes_window() {
        let rejection = Rejection {
            reason: RejectReason::TimestampSkewExceeded,
            http_status: 403,
            detail: Diagnostic::Skew {
                now: 1000,
                timestamp: 600,
                delta: 400,
            },
        };
        let config = config().with_exposed_diagnostics(true);

        let payload = shape_rejection(&rejection, &config);
        assert_eq!(
            payload.body["description"],
            json!("Timestamp is outside the allowed 300s skew.")
        );
        assert_eq!(
            payload.body["data"],
            json!({"now": 1000, "timestamp": 600, "delta": 400})
        );
    }

    #[test]
    fn test_missing_headers_has_no_description() {
        let rejection = Rejection {
            reason: RejectReason::MissingHeaders,
            http_status: 403,
            detail: Diagnostic::Empty,
        };

        let payload = shape_rejection(&rejection, &config());
        assert!(payload.body.get("description").is_none());
        assert!(payload.body.get("data").is_none());
    }

    #[test]
    fn test_malformed_timestamp_rejection_body() {
        let rejection = Rejection {
            reason: RejectReason::MalformedTimestamp,
            http_status: 403,
            detail: Diagnostic::Empty,
        };
        let config = config().with_exposed_diagnostics(true);

        let payload = shape_rejection(&rejection, &config);
        assert_eq!(payload.status_code, 403);
        assert!(payload.suppress_host_default_response);
        assert_eq!(
            payload.body,
            json!({
                "success": false,
                "message": "Malformed timestamp header.",
                "description": "Timestamp must be whole seconds since the Unix epoch.",
            })
        );
    }

    #[test]
    fn test_malformed_signature_rejection_body() {
        let rejection = Rejection {
            reason: RejectReason::MalformedSignatureFormat,
            http_status: 401,
            detail: Diagnostic::Format {
                received_length: 71,
            },
        };

        let hidden = shape_rejection(&rejection, &config());
        assert_eq!(hidden.status_code, 401);
        assert_eq!(
            hidden.body,
            json!({
                "success": false,
                "message": "Malformed signature header.",
                "description": "Signature must be a 64-character lower-case hex digest.",
            })
        );

        let exposed = shape_rejection(&rejection, &config().with_exposed_diagnostics(true));
        assert_eq!(exposed.body["data"], json!({"receivedLength": 71}));
    }

    #[test]
    fn test_shape_response_dispatches_on_outcome() {
        let config = config().with_output_mode(OutputMode::Raw);
        let request = request("{}");

        let ok = shape_response(&ValidationOutcome::Valid, &request, &config);
        assert!(ok.is_success());
        assert_eq!(ok.body["body"], json!("{}"));

        let err = shape_response(&ValidationOutcome::Invalid(mismatch()), &request, &config);
        assert!(!err.is_success());
        assert_eq!(err.status_code, 403);
    }
}
