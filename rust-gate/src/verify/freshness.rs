//! Timestamp freshness check.
//!
//! Timestamps are seconds since the Unix epoch, the same unit as the
//! configured skew. A millisecond value lands far in the future and is
//! rejected as stale rather than guessed at.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use super::types::{Diagnostic, RejectReason, Rejection, ValidationConfig};

/// Current time in seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Check that `timestamp` is within the allowed skew of `now`.
///
/// The bound is inclusive. Returns the parsed timestamp on success.
pub fn check(timestamp: &str, config: &ValidationConfig, now: u64) -> Result<u64, Rejection> {
    let signed_at: u64 = match timestamp.trim().parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "wpforms_timestamp_malformed");
            return Err(Rejection::new(
                RejectReason::MalformedTimestamp,
                Diagnostic::Empty,
                config,
            ));
        }
    };

    let delta = now.abs_diff(signed_at);

    if delta > config.allowed_skew_seconds {
        warn!(
            signed_at = signed_at,
            current_time = now,
            age_seconds = delta,
            allowed_skew_seconds = config.allowed_skew_seconds,
            "wpforms_timestamp_stale"
        );
        return Err(Rejection::new(
            RejectReason::TimestampSkewExceeded,
            Diagnostic::Skew {
                now,
                timestamp: signed_at,
                delta,
            },
            config,
        ));
    }

    Ok(signed_at)
}
