//! In-memory audit store for normalized trades.
//!
//! Keyed by the generated trade id; entries are write-once and live for the
//! process lifetime only (no durability). Safe under concurrent readers and
//! writers from every ingestion path with no caller-side locking.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::CanonicalTrade;

#[derive(Debug, Default)]
pub struct TradeStore {
    trades: RwLock<HashMap<Uuid, CanonicalTrade>>,
}

impl TradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a normalized trade. Ids are random, so an overwrite is not
    /// expected to occur, but it is not forbidden.
    pub fn put(&self, trade_id: Uuid, trade: CanonicalTrade) {
        self.trades.write().insert(trade_id, trade);
    }

    /// Look up a trade by id. A miss is not an error.
    pub fn get(&self, trade_id: &Uuid) -> Option<CanonicalTrade> {
        self.trades.read().get(trade_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.trades.read().len()
    }

    /// Remove all entries. Immediate; used for administrative reset and
    /// test isolation.
    pub fn clear(&self) {
        self.trades.write().clear();
    }
}
