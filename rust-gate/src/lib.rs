//! Formgate - authenticating gate for WPForms webhooks.
//!
//! Every inbound submission is checked before anything downstream sees it:
//! - Signature and timestamp headers must be present
//! - The timestamp must sit inside the allowed clock skew
//! - The HMAC-SHA256 of the raw body must match the signature
//!
//! ## Architecture
//!
//! ```text
//! WPForms → Web Server → verify → respond → wpforms_submissions → Workflow
//! ```

pub mod config;
pub mod queue;
pub mod respond;
pub mod verify;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use queue::{Publisher, SubmissionEvent, SUBMISSIONS_QUEUE};
pub use respond::{evaluate, ResponsePayload};
pub use verify::{
    verify_request, IncomingRequest, OutputMode, RejectReason, SecretKey, ValidationConfig,
    ValidationOutcome,
};
pub use web::AppState;
