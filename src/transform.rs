//! Trade normalization and platform conversion.
//!
//! Pure functions over flat records:
//! 1. `normalize` - mask the account number, validate and canonicalize the
//!    security id and trade type, require a positive amount
//! 2. `to_platform` - map a canonical trade onto the downstream wire record
//!
//! Both are side-effect-free and safe to call concurrently.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{CanonicalTrade, PlatformTrade, TradeDetails, TradeInstruction};

/// Security ids are exactly six uppercase alphanumerics after normalization.
const SECURITY_ID_LEN: usize = 6;

/// Outbound timestamp format. The `Z` is literal: the platform expects the
/// suffix even though the source value carries no timezone, so no timezone
/// arithmetic is applied.
const PLATFORM_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A trade instruction that failed field-level validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("security id is required")]
    MissingSecurityId,
    #[error("invalid security id format: {0}")]
    InvalidSecurityId(String),
    #[error("trade type is required")]
    MissingTradeType,
    #[error("amount is required")]
    MissingAmount,
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(String),
    #[error("timestamp is required")]
    MissingTimestamp,
}

/// Stateless normalizer/converter. Carries the deployment-wide platform id
/// attached to every outbound record.
#[derive(Debug, Clone)]
pub struct TradeTransformer {
    platform_id: String,
}

impl TradeTransformer {
    pub fn new(platform_id: impl Into<String>) -> Self {
        Self {
            platform_id: platform_id.into(),
        }
    }

    /// Validate a raw instruction and produce the canonical record.
    ///
    /// The input is not mutated; the returned trade satisfies every
    /// `CanonicalTrade` invariant. Amount and timestamp pass through
    /// unchanged beyond the presence/positivity checks.
    pub fn normalize(
        &self,
        instruction: &TradeInstruction,
    ) -> Result<CanonicalTrade, TransformError> {
        let account_number = mask_account_number(instruction.account_number.as_deref());
        let security_id = normalize_security_id(instruction.security_id.as_deref())?;
        let trade_type = normalize_trade_type(instruction.trade_type.as_deref())?;
        let amount = require_positive_amount(instruction.amount)?;
        let timestamp = instruction
            .timestamp
            .ok_or(TransformError::MissingTimestamp)?;

        Ok(CanonicalTrade {
            account_number,
            security_id,
            trade_type,
            amount,
            timestamp,
        })
    }

    /// Map a canonical trade onto the downstream platform record.
    pub fn to_platform(&self, canonical: &CanonicalTrade) -> PlatformTrade {
        PlatformTrade {
            platform_id: self.platform_id.clone(),
            trade: TradeDetails {
                account: canonical.account_number.clone(),
                security: canonical.security_id.clone(),
                trade_type: canonical.trade_type.clone(),
                amount: canonical.amount,
                timestamp: format_platform_timestamp(canonical.timestamp),
            },
        }
    }
}

/// Mask an account number down to its last four characters. Short or
/// absent accounts collapse to the bare mask; an already-masked value of
/// the form `****1234` re-masks to itself.
fn mask_account_number(account: Option<&str>) -> String {
    let chars: Vec<char> = account.unwrap_or_default().chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let last_four: String = chars[chars.len() - 4..].iter().collect();
    format!("****{last_four}")
}

fn normalize_security_id(security_id: Option<&str>) -> Result<String, TransformError> {
    let raw = security_id.ok_or(TransformError::MissingSecurityId)?;
    let normalized = raw.to_uppercase().trim().to_string();

    let well_formed = normalized.len() == SECURITY_ID_LEN
        && normalized
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());

    if !well_formed {
        return Err(TransformError::InvalidSecurityId(raw.to_string()));
    }

    Ok(normalized)
}

/// Canonicalize a trade type through the fixed lookup table. Values outside
/// the table are upper-cased as-is.
fn normalize_trade_type(trade_type: Option<&str>) -> Result<String, TransformError> {
    let raw = trade_type.ok_or(TransformError::MissingTradeType)?;

    let mapped = match raw.trim() {
        "BUY" | "Buy" => "B",
        "SELL" | "Sell" => "S",
        _ => return Ok(raw.to_uppercase()),
    };

    Ok(mapped.to_string())
}

fn require_positive_amount(amount: Option<Decimal>) -> Result<Decimal, TransformError> {
    let amount = amount.ok_or(TransformError::MissingAmount)?;
    if amount <= Decimal::ZERO {
        return Err(TransformError::NonPositiveAmount(amount.to_string()));
    }
    Ok(amount)
}

fn format_platform_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(PLATFORM_TIMESTAMP_FORMAT).to_string()
}
