//! Extraction of the signature and timestamp headers.

use tracing::warn;

use super::types::{
    Diagnostic, IncomingRequest, RejectReason, Rejection, ValidationConfig, SIGNATURE_HEADER,
    TIMESTAMP_HEADER,
};

/// The two headers every signed WPForms request carries, trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedHeaders<'a> {
    pub signature: &'a str,
    pub timestamp: &'a str,
}

/// Pull both headers out of the request.
///
/// Fails fast with `MissingHeaders` when either is absent or blank.
pub fn extract<'a>(
    request: &'a IncomingRequest,
    config: &ValidationConfig,
) -> Result<SignedHeaders<'a>, Rejection> {
    let signature = non_blank(request.header(SIGNATURE_HEADER));
    let timestamp = non_blank(request.header(TIMESTAMP_HEADER));

    match (signature, timestamp) {
        (Some(signature), Some(timestamp)) => Ok(SignedHeaders {
            signature,
            timestamp,
        }),
        _ => {
            warn!(
                has_signature = signature.is_some(),
                has_timestamp = timestamp.is_some(),
                "wpforms_headers_missing"
            );
            Err(Rejection::new(
                RejectReason::MissingHeaders,
                Diagnostic::Empty,
                config,
            ))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
