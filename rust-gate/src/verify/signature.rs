//! WPForms webhook signature verification.
//!
//! WPForms signs the raw request body with HMAC-SHA256 and sends the digest
//! as bare lower-case hex in `X-WPForms-Signature`. Prefixed forms such as
//! `sha256=<hex>` are refused as malformed.

use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use super::types::{Diagnostic, RejectReason, Rejection, SecretKey, ValidationConfig};

type HmacSha256 = Hmac<Sha256>;

/// Length of a hex-encoded SHA-256 digest.
pub const SIGNATURE_HEX_LEN: usize = 64;

/// Hex characters kept from each digest for diagnostics.
const DIGEST_PREFIX_LEN: usize = 8;

/// Compute the hex signature WPForms would send for `body`.
pub fn sign_body(secret: &SecretKey, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify `signature` against the raw body bytes.
///
/// The comparison goes through `Mac::verify_slice`, which runs in constant
/// time regardless of where the digests first differ.
pub fn check(signature: &str, body: &[u8], config: &ValidationConfig) -> Result<(), Rejection> {
    let signature = signature.trim();
    let provided = decode_signature(signature, config)?;

    let mut mac = match HmacSha256::new_from_slice(config.secret_key.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("wpforms_signature_invalid_key");
            return Err(Rejection::new(
                RejectReason::SignatureMismatch,
                Diagnostic::Empty,
                config,
            ));
        }
    };

    mac.update(body);

    if mac.clone().verify_slice(&provided).is_ok() {
        return Ok(());
    }

    let expected = hex::encode(mac.finalize().into_bytes());
    let expected_prefix = expected[..DIGEST_PREFIX_LEN].to_string();
    let received_prefix = signature[..DIGEST_PREFIX_LEN].to_string();

    warn!(
        expected_prefix = %expected_prefix,
        received_prefix = %received_prefix,
        body_length = body.len(),
        "wpforms_signature_mismatch"
    );

    Err(Rejection::new(
        RejectReason::SignatureMismatch,
        Diagnostic::Digest {
            expected_prefix,
            received_prefix,
        },
        config,
    ))
}

/// Accept exactly 64 lower-case hex characters.
fn decode_signature(signature: &str, config: &ValidationConfig) -> Result<Vec<u8>, Rejection> {
    let well_formed = signature.len() == SIGNATURE_HEX_LEN
        && signature
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

    let decoded = if well_formed {
        hex::decode(signature).ok()
    } else {
        None
    };

    decoded.ok_or_else(|| {
        warn!(
            received_length = signature.len(),
            expected_length = SIGNATURE_HEX_LEN,
            "wpforms_signature_malformed"
        );
        Rejection::new(
            RejectReason::MalformedSignatureFormat,
            Diagnostic::Format {
                received_length: signature.len(),
            },
            config,
        )
    })
}
