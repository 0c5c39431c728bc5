//! Outbound platform trade publisher.
//!
//! JetStream publishes are two-phase: the publish call itself initiates the
//! send (its error is the synchronous failure that wraps up to the caller),
//! and the returned ack future resolves on a spawned task whose only job is
//! to log the assigned stream sequence or the delivery error. Processing
//! never waits on that continuation.

use anyhow::{Context, Result};
use async_nats::jetstream;
use async_trait::async_trait;
use tracing::{debug, error, info};

use super::TradePublisher;

pub struct NatsPublisher {
    jetstream: jetstream::Context,
    subject: String,
}

impl NatsPublisher {
    pub fn new(jetstream: jetstream::Context, subject: impl Into<String>) -> Self {
        Self {
            jetstream,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl TradePublisher for NatsPublisher {
    async fn publish(&self, payload: String) -> Result<()> {
        let ack = self
            .jetstream
            .publish(self.subject.clone(), payload.into())
            .await
            .with_context(|| format!("failed to initiate publish to {}", self.subject))?;

        // Delivery outcome is observed asynchronously and only logged. The
        // continuation must never block or retry.
        let subject = self.subject.clone();
        tokio::spawn(async move {
            match ack.await {
                Ok(ack) => info!(
                    subject = %subject,
                    stream = %ack.stream,
                    sequence = ack.sequence,
                    "published platform trade"
                ),
                Err(err) => error!(
                    subject = %subject,
                    error = %err,
                    "platform trade publish failed"
                ),
            }
        });

        Ok(())
    }
}

/// Drops payloads on the floor. Used when the service runs HTTP-only
/// without a broker (`DISABLE_BUS`).
pub struct NullPublisher;

#[async_trait]
impl TradePublisher for NullPublisher {
    async fn publish(&self, payload: String) -> Result<()> {
        debug!(bytes = payload.len(), "bus disabled, dropping platform trade");
        Ok(())
    }
}
