//! Async RabbitMQ publisher for accepted submissions.
//!
//! The web server starts without touching the broker. The first accepted
//! submission opens the connection and declares `wpforms_submissions`; a
//! dropped channel is reopened on the next publish. A broker outage only
//! fails the requests that need forwarding, never startup or rejections.

use std::sync::Arc;

use anyhow::{Context, Result};
use lapin::{
    options::{BasicPublishOptions, QueueDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::types::{SubmissionEvent, SUBMISSIONS_QUEUE};

/// Shared handle to the submissions queue. Clones share one connection.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

struct PublisherInner {
    url: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl Publisher {
    /// Create a publisher for `url`. No connection is made yet.
    pub fn new(url: String) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                url,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Return the open channel, connecting and declaring the queue if the
    /// previous channel is gone.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Another task may have reconnected while we waited
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("rabbitmq_publisher_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.queue_declare(
            SUBMISSIONS_QUEUE,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare submissions queue")?;

        info!(queue = SUBMISSIONS_QUEUE, "rabbitmq_publisher_connected");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    /// Publish an accepted submission and wait for the broker to confirm.
    ///
    /// Messages are persistent and carry the event's message id.
    pub async fn publish_submission(&self, event: &SubmissionEvent) -> Result<()> {
        let channel = self.ensure_connected().await?;

        let body = serde_json::to_vec(event).context("Failed to serialize submission")?;
        let message_id = event.message_id();

        channel
            .basic_publish(
                "",
                SUBMISSIONS_QUEUE,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.clone().into()),
            )
            .await
            .context("Failed to publish to submissions queue")?
            .await
            .context("Failed to confirm publish")?;

        info!(
            queue = SUBMISSIONS_QUEUE,
            message_id = %message_id,
            body_length = body.len(),
            "rabbitmq_submission_published"
        );

        Ok(())
    }

    /// Close the channel and connection if a publish ever opened them.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "rabbitmq_connection_close_error");
            }
        }

        info!("rabbitmq_publisher_closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::OutputMode;
    use serde_json::json;

    #[test]
    fn test_publisher_does_not_connect_on_creation() {
        let publisher = Publisher::new("amqp://localhost:5672".to_string());
        let clone = publisher.clone();

        assert_eq!(Arc::strong_count(&publisher.inner), 2);
        drop(clone);
        assert_eq!(Arc::strong_count(&publisher.inner), 1);
    }

    #[tokio::test]
    async fn test_close_without_connection() {
        let publisher = Publisher::new("amqp://localhost:5672".to_string());
        publisher.close().await;
        assert!(publisher.inner.channel.read().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_no_channel() {
        // Nothing listens on port 1
        let publisher = Publisher::new("amqp://127.0.0.1:1/%2f".to_string());
        let event = SubmissionEvent::new(
            "1700000000".to_string(),
            1_700_000_000,
            b"{}",
            OutputMode::Default,
            json!({"success": true}),
        );

        assert!(publisher.publish_submission(&event).await.is_err());
        assert!(publisher.inner.channel.read().await.is_none());
        assert!(publisher.inner.connection.read().await.is_none());
    }
}
