//! Types shared by the verification pipeline and the response shaper.
//!
//! Everything here is created per request and dropped once the response
//! has been produced. Nothing is cached between requests.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ConfigError;

/// Header carrying the hex HMAC-SHA256 digest of the raw body.
pub const SIGNATURE_HEADER: &str = "x-wpforms-signature";

/// Header carrying the signing time in seconds since the Unix epoch.
pub const TIMESTAMP_HEADER: &str = "x-wpforms-timestamp";

/// Default allowed clock skew between sender and receiver, in seconds.
pub const DEFAULT_TIMESTAMP_SKEW: u64 = 300;

/// Default status code for every rejected request.
pub const DEFAULT_REJECTION_STATUS: u16 = 403;

// =============================================================================
// Incoming Request
// =============================================================================

/// An inbound webhook request as handed over by the host.
///
/// Header names are lower-cased on construction, so lookups are
/// case-insensitive. When a name repeats, the last value wins.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    headers: BTreeMap<String, String>,
    raw_body: Vec<u8>,
    parsed_body: Option<Value>,
}

impl IncomingRequest {
    /// Build a request from header pairs and the exact bytes received.
    ///
    /// The body is decoded as JSON here, but only for shaping the success
    /// output. Signatures are always checked against `raw_body`.
    pub fn new<I, K, V>(headers: I, raw_body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();

        let raw_body = raw_body.into();
        let parsed_body = serde_json::from_slice(&raw_body).ok();

        Self {
            headers,
            raw_body,
            parsed_body,
        }
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }
}

// =============================================================================
// Validation Config
// =============================================================================

/// Shared secret used as the HMAC key.
///
/// `Debug` is redacted so the key cannot leak through logs.
#[derive(Clone)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wrap a secret. Empty or blank secrets are refused; there is no
    /// fallback default.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        Ok(Self(secret))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// Shape of the success payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Parsed submission with a `success` marker.
    #[default]
    Default,
    /// Raw body string plus the request headers.
    Raw,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(OutputMode::Default),
            "raw" => Ok(OutputMode::Raw),
            _ => Err(ConfigError::InvalidOutputMode(s.to_string())),
        }
    }
}

/// Per-request validation settings. Immutable once built.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub secret_key: SecretKey,

    /// Maximum accepted `|now - timestamp|`, in seconds (inclusive)
    pub allowed_skew_seconds: u64,

    pub output_mode: OutputMode,

    /// Status code returned for every rejection
    pub rejection_status: u16,

    /// Echo non-secret diagnostics in the error body
    pub expose_diagnostics: bool,
}

impl ValidationConfig {
    pub fn new(secret_key: SecretKey) -> Self {
        Self {
            secret_key,
            allowed_skew_seconds: DEFAULT_TIMESTAMP_SKEW,
            output_mode: OutputMode::Default,
            rejection_status: DEFAULT_REJECTION_STATUS,
            expose_diagnostics: false,
        }
    }

    pub fn with_skew(mut self, seconds: u64) -> Self {
        self.allowed_skew_seconds = seconds;
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_rejection_status(mut self, status: u16) -> Self {
        self.rejection_status = status;
        self
    }

    pub fn with_exposed_diagnostics(mut self, expose: bool) -> Self {
        self.expose_diagnostics = expose;
        self
    }
}

// =============================================================================
// Validation Outcome
// =============================================================================

/// Result of running the verification pipeline on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Rejection),
}

impl ValidationOutcome {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Invalid(rejection) => Some(rejection),
        }
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingHeaders,
    TimestampSkewExceeded,
    SignatureMismatch,
    MalformedTimestamp,
    MalformedSignatureFormat,
}

impl RejectReason {
    /// Caller-facing message. Never contains secret material.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::MissingHeaders => "Missing signature or timestamp headers",
            RejectReason::TimestampSkewExceeded => "Timestamp is outside the allowed skew.",
            RejectReason::SignatureMismatch => "Invalid signature.",
            RejectReason::MalformedTimestamp => "Malformed timestamp header.",
            RejectReason::MalformedSignatureFormat => "Malformed signature header.",
        }
    }
}

/// A refused request, with operator-side diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub http_status: u16,
    pub detail: Diagnostic,
}

impl Rejection {
    pub fn new(reason: RejectReason, detail: Diagnostic, config: &ValidationConfig) -> Self {
        Self {
            reason,
            http_status: config.rejection_status,
            detail,
        }
    }
}

/// Diagnostic data attached to a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Empty,
    Skew {
        now: u64,
        timestamp: u64,
        delta: u64,
    },
    Digest {
        expected_prefix: String,
        received_prefix: String,
    },
    Format {
        received_length: usize,
    },
}

impl Diagnostic {
    /// The part of the diagnostic that may be shown to the caller.
    ///
    /// The expected digest is withheld: echoing it would let a caller
    /// learn the correct signature by trial.
    pub fn public_data(&self) -> Option<Value> {
        match self {
            Diagnostic::Empty => None,
            Diagnostic::Skew {
                now,
                timestamp,
                delta,
            } => Some(json!({
                "now": now,
                "timestamp": timestamp,
                "delta": delta,
            })),
            Diagnostic::Digest {
                received_prefix, ..
            } => Some(json!({ "receivedDigestPrefix": received_prefix })),
            Diagnostic::Format { received_length } => {
                Some(json!({ "receivedLength": received_length }))
            }
        }
    }
}
