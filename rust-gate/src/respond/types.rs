//! Payload handed back to the host.

use serde::Serialize;
use serde_json::Value;

/// What the host should send (or do) for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponsePayload {
    pub status_code: u16,
    pub body: Value,
    /// When true the host must send this payload as-is instead of its own
    /// default response.
    pub suppress_host_default_response: bool,
}

impl ResponsePayload {
    pub fn success(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
            suppress_host_default_response: false,
        }
    }

    pub fn error(status_code: u16, body: Value) -> Self {
        Self {
            status_code,
            body,
            suppress_host_default_response: true,
        }
    }

    pub fn is_success(&self) -> bool {
        !self.suppress_host_default_response
    }
}
