//! Message-bus transport (NATS JetStream).
//!
//! - `publisher` - fire-and-forget outbound publishing of platform trades
//! - `consumer` - inbound instruction consumer with at-most-once acking

pub mod consumer;
pub mod publisher;

use anyhow::{Context, Result};
use async_nats::jetstream;
use async_trait::async_trait;

pub use publisher::{NatsPublisher, NullPublisher};

/// Outbound channel seam. The service core publishes through this trait so
/// it can run against a recording double in tests and a no-op publisher in
/// broker-less dev mode.
#[async_trait]
pub trait TradePublisher: Send + Sync {
    /// Initiate an asynchronous send of one serialized platform trade.
    ///
    /// An error here is a synchronous initiation failure and surfaces to
    /// the caller; once initiation succeeds, delivery outcome is only
    /// logged, never propagated.
    async fn publish(&self, payload: String) -> Result<()>;
}

/// Create the stream backing a subject if it does not exist yet.
pub async fn ensure_stream(
    jetstream: &jetstream::Context,
    name: &str,
    subject: &str,
) -> Result<jetstream::stream::Stream> {
    jetstream
        .get_or_create_stream(jetstream::stream::Config {
            name: name.to_string(),
            subjects: vec![subject.to_string()],
            ..Default::default()
        })
        .await
        .with_context(|| format!("failed to create stream {name} for subject {subject}"))
}
