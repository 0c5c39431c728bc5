use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A raw trade instruction as received from any ingestion path.
///
/// Every field is optional: a missing or null field is a normalization
/// failure reported by the transformer, not a deserialization failure, so
/// upload, single-record, and bus ingestion all reject bad records the
/// same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeInstruction {
    pub account_number: Option<String>,
    pub security_id: Option<String>,
    pub trade_type: Option<String>,
    pub amount: Option<Decimal>,
    pub timestamp: Option<NaiveDateTime>,
}

/// The normalized internal representation of a trade.
///
/// Only constructed by `TradeTransformer::normalize`; a value of this type
/// always has a masked account number, a validated six-character security
/// id, a canonical trade type, and a strictly positive amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTrade {
    pub account_number: String,
    pub security_id: String,
    pub trade_type: String,
    pub amount: Decimal,
    pub timestamp: NaiveDateTime,
}

/// The downstream platform record. Never stored; serialized to JSON and
/// published on the outbound subject only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformTrade {
    pub platform_id: String,
    pub trade: TradeDetails,
}

/// Flattened trade payload inside a `PlatformTrade`. The timestamp is
/// pre-formatted with a literal `Z` suffix (the platform expects it even
/// though the source value carries no timezone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    pub account: String,
    pub security: String,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub amount: Decimal,
    pub timestamp: String,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub platform_id: String,
    pub nats_url: String,
    pub inbound_subject: String,
    pub inbound_stream: String,
    pub inbound_durable: String,
    pub outbound_subject: String,
    pub outbound_stream: String,
    /// Run HTTP-only without a broker (dev/test).
    pub disable_bus: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let platform_id =
            std::env::var("PLATFORM_ID").unwrap_or_else(|_| "PLATFORM-01".to_string());

        let nats_url =
            std::env::var("NATS_URL").unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string());

        let inbound_subject = std::env::var("INBOUND_SUBJECT")
            .unwrap_or_else(|_| "trades.instructions.inbound".to_string());

        let inbound_stream = std::env::var("INBOUND_STREAM")
            .unwrap_or_else(|_| "TRADE_INSTRUCTIONS".to_string());

        let inbound_durable =
            std::env::var("INBOUND_DURABLE").unwrap_or_else(|_| "trade-capture".to_string());

        let outbound_subject = std::env::var("OUTBOUND_SUBJECT")
            .unwrap_or_else(|_| "trades.platform.outbound".to_string());

        let outbound_stream = std::env::var("OUTBOUND_STREAM")
            .unwrap_or_else(|_| "PLATFORM_TRADES".to_string());

        let disable_bus = std::env::var("DISABLE_BUS")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        Ok(Self {
            port,
            platform_id,
            nats_url,
            inbound_subject,
            inbound_stream,
            inbound_durable,
            outbound_subject,
            outbound_stream,
            disable_bus,
        })
    }
}
