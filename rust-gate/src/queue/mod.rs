//! Queue module for RabbitMQ operations.
//!
//! Accepted submissions are handed to the downstream workflow through a
//! single durable queue:
//!
//! ```text
//! Web Server → wpforms_submissions queue → Workflow
//! ```

pub mod publisher;
pub mod types;

pub use publisher::Publisher;
pub use types::{SubmissionEvent, SUBMISSIONS_QUEUE};
