//! Request authentication for inbound WPForms webhooks.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! ```text
//! headers::extract → freshness::check → signature::check → Valid
//! ```
//!
//! The pipeline is pure: no I/O, no shared state, and the clock is passed
//! in, so the same `(request, config, now)` always gives the same outcome.

pub mod freshness;
pub mod headers;
pub mod signature;
pub mod types;

use tracing::debug;

pub use freshness::unix_now;
pub use headers::SignedHeaders;
pub use signature::sign_body;
pub use types::{
    Diagnostic, IncomingRequest, OutputMode, RejectReason, Rejection, SecretKey,
    ValidationConfig, ValidationOutcome, DEFAULT_REJECTION_STATUS, DEFAULT_TIMESTAMP_SKEW,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};

/// Decide whether `request` is authentic and fresh at time `now`.
pub fn verify_request(
    request: &IncomingRequest,
    config: &ValidationConfig,
    now: u64,
) -> ValidationOutcome {
    match run_checks(request, config, now) {
        Ok(signed_at) => {
            debug!(signed_at = signed_at, "wpforms_request_verified");
            ValidationOutcome::Valid
        }
        Err(rejection) => ValidationOutcome::Invalid(rejection),
    }
}

fn run_checks(
    request: &IncomingRequest,
    config: &ValidationConfig,
    now: u64,
) -> Result<u64, Rejection> {
    let signed = headers::extract(request, config)?;
    let signed_at = freshness::check(signed.timestamp, config, now)?;
    signature::check(signed.signature, request.raw_body(), config)?;
    Ok(signed_at)
}
