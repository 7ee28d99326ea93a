//! Queue message types for forwarding accepted submissions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::verify::OutputMode;

/// Queue name for accepted form submissions.
pub const SUBMISSIONS_QUEUE: &str = "wpforms_submissions";

/// Hex characters of the body digest kept in the message id.
const MESSAGE_ID_DIGEST_LEN: usize = 16;

/// An accepted submission, ready for the downstream workflow.
///
/// `payload` is the shaped success body exactly as the gate produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionEvent {
    /// Value of the timestamp header the sender signed
    pub signed_at: String,
    /// Receiver clock, seconds since the Unix epoch
    pub received_at: u64,
    /// SHA-256 of the raw request body, hex
    pub body_digest: String,
    pub output_mode: OutputMode,
    pub payload: Value,
}

impl SubmissionEvent {
    pub fn new(
        signed_at: String,
        received_at: u64,
        raw_body: &[u8],
        output_mode: OutputMode,
        payload: Value,
    ) -> Self {
        Self {
            signed_at,
            received_at,
            body_digest: hex::encode(Sha256::digest(raw_body)),
            output_mode,
            payload,
        }
    }

    /// Message id used for tracking on the broker.
    ///
    /// Submissions signed in the same second differ by body digest.
    pub fn message_id(&self) -> String {
        let digest = self
            .body_digest
            .get(..MESSAGE_ID_DIGEST_LEN)
            .unwrap_or(self.body_digest.as_str());
        format!("wpforms-{}-{}", self.signed_at, digest)
    }
}
