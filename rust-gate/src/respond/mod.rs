//! Response shaping for verified and rejected webhooks.
//!
//! ## Flow
//!
//! ```text
//! IncomingRequest → verify_request() → ValidationOutcome → shape_response() → ResponsePayload
//! ```

pub mod shaper;
pub mod types;

use tracing::info;

use crate::verify::{verify_request, IncomingRequest, ValidationConfig, ValidationOutcome};

pub use shaper::{shape_rejection, shape_response, shape_success};
pub use types::ResponsePayload;

/// Run the full pipeline for one request.
///
/// Failure payloads carry `suppress_host_default_response = true`; the host
/// must send them as they are.
pub fn evaluate(request: &IncomingRequest, config: &ValidationConfig, now: u64) -> ResponsePayload {
    let outcome = verify_request(request, config, now);
    let payload = shape_response(&outcome, request, config);

    match &outcome {
        ValidationOutcome::Valid => info!(
            output_mode = ?config.output_mode,
            body_length = request.raw_body().len(),
            "wpforms_request_accepted"
        ),
        ValidationOutcome::Invalid(rejection) => info!(
            reason = ?rejection.reason,
            status = payload.status_code,
            "wpforms_request_rejected"
        ),
    }

    payload
}
