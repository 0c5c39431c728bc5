//! Inbound trade instruction consumer.
//!
//! One message = one JSON trade instruction. Every message is acknowledged
//! after the processing attempt, success or failure: redelivering a record
//! that failed validation would loop forever, so unprocessable messages are
//! logged and dropped (at-most-once). A dead-letter subject is the obvious
//! extension and is deliberately not built here.

use anyhow::{Context, Result};
use async_nats::jetstream;
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::models::{Config, TradeInstruction};
use crate::service::TradeService;

/// Consume the inbound subject until the stream ends or the connection is
/// lost. Intended to be spawned from main.
pub async fn run(
    jetstream: jetstream::Context,
    config: Config,
    service: Arc<TradeService>,
) -> Result<()> {
    let stream = super::ensure_stream(&jetstream, &config.inbound_stream, &config.inbound_subject)
        .await?;

    let consumer = stream
        .get_or_create_consumer(
            &config.inbound_durable,
            jetstream::consumer::pull::Config {
                durable_name: Some(config.inbound_durable.clone()),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("failed to create consumer {}", config.inbound_durable))?;

    let mut messages = consumer
        .messages()
        .await
        .context("failed to open inbound message stream")?;

    info!(
        subject = %config.inbound_subject,
        durable = %config.inbound_durable,
        "inbound trade consumer started"
    );

    while let Some(message) = messages.next().await {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                error!(error = %err, "failed to pull inbound message");
                continue;
            }
        };

        handle_message(&service, &message).await;

        // Ack unconditionally: at-most-once by policy.
        if let Err(err) = message.ack().await {
            warn!(error = %err, "failed to ack inbound message");
        }
    }

    Ok(())
}

async fn handle_message(service: &TradeService, message: &jetstream::Message) {
    let sequence = message.info().map(|info| info.stream_sequence).ok();

    let instruction: TradeInstruction = match serde_json::from_slice(&message.payload) {
        Ok(instruction) => instruction,
        Err(err) => {
            error!(
                subject = %message.subject,
                sequence,
                error = %err,
                "undecodable trade instruction, dropping"
            );
            return;
        }
    };

    match service.process_trade(&instruction).await {
        Ok(trade_id) => info!(
            subject = %message.subject,
            sequence,
            %trade_id,
            "processed inbound trade instruction"
        ),
        Err(err) => error!(
            subject = %message.subject,
            sequence,
            error = %err,
            "failed to process inbound trade instruction, dropping"
        ),
    }
}
