//! Trade processing orchestration.
//!
//! Single entry point for every ingestion path (upload, single-record API,
//! inbound bus subject): generate id -> normalize -> store -> convert ->
//! serialize -> publish.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::bus::TradePublisher;
use crate::models::{CanonicalTrade, TradeInstruction};
use crate::store::TradeStore;
use crate::transform::{TradeTransformer, TransformError};

/// A trade instruction that could not be processed.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Invalid(#[from] TransformError),
    #[error("failed to encode platform trade")]
    Encode(#[from] serde_json::Error),
    #[error("failed to publish platform trade: {0}")]
    Publish(#[source] anyhow::Error),
}

pub struct TradeService {
    transformer: TradeTransformer,
    store: Arc<TradeStore>,
    publisher: Arc<dyn TradePublisher>,
}

impl TradeService {
    pub fn new(
        transformer: TradeTransformer,
        store: Arc<TradeStore>,
        publisher: Arc<dyn TradePublisher>,
    ) -> Self {
        Self {
            transformer,
            store,
            publisher,
        }
    }

    /// Process one raw instruction end to end and return its audit id.
    ///
    /// Normalization failures propagate before any side effect. A publish
    /// initiation failure is surfaced to the caller but does NOT unwind the
    /// store write: the record stays retrievable for auditing even when the
    /// downstream send never got off the ground.
    pub async fn process_trade(&self, instruction: &TradeInstruction) -> Result<Uuid, ProcessError> {
        let trade_id = Uuid::new_v4();

        let normalized = self.transformer.normalize(instruction)?;

        self.store.put(trade_id, normalized.clone());

        let platform_trade = self.transformer.to_platform(&normalized);
        let payload = serde_json::to_string(&platform_trade)?;

        self.publisher
            .publish(payload)
            .await
            .map_err(ProcessError::Publish)?;

        info!(%trade_id, security = %normalized.security_id, "processed trade");
        Ok(trade_id)
    }

    pub fn canonical_trade(&self, trade_id: &Uuid) -> Option<CanonicalTrade> {
        self.store.get(trade_id)
    }

    pub fn stored_trade_count(&self) -> usize {
        self.store.count()
    }

    pub fn clear_storage(&self) {
        self.store.clear();
    }
}
