//! End-to-end pipeline tests: raw instruction in, normalized audit record
//! and published platform payload out.
//!
//! The bus is replaced by a recording publisher; everything else is the
//! real processing stack.

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

use tradegate_backend::{
    api::upload::{parse_instructions, FileKind},
    bus::TradePublisher,
    models::TradeInstruction,
    service::{ProcessError, TradeService},
    store::TradeStore,
    transform::TradeTransformer,
};

/// Captures outbound payloads; can be switched to fail every initiation.
#[derive(Default)]
struct RecordingPublisher {
    payloads: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingPublisher {
    fn published(&self) -> Vec<String> {
        self.payloads.lock().clone()
    }
}

#[async_trait]
impl TradePublisher for RecordingPublisher {
    async fn publish(&self, payload: String) -> anyhow::Result<()> {
        if self.fail {
            return Err(anyhow!("broker unavailable"));
        }
        self.payloads.lock().push(payload);
        Ok(())
    }
}

fn pipeline() -> (Arc<RecordingPublisher>, TradeService) {
    let publisher = Arc::new(RecordingPublisher::default());
    let service = TradeService::new(
        TradeTransformer::new("ACCT123"),
        Arc::new(TradeStore::new()),
        publisher.clone(),
    );
    (publisher, service)
}

fn sample_instruction() -> TradeInstruction {
    serde_json::from_str(
        r#"{
            "account_number": "1234567890",
            "security_id": "abc123",
            "trade_type": "Buy",
            "amount": 100000,
            "timestamp": "2025-08-04T21:15:33"
        }"#,
    )
    .unwrap()
}

#[tokio::test]
async fn single_instruction_flows_through_to_store_and_bus() {
    let (publisher, service) = pipeline();

    let trade_id = service.process_trade(&sample_instruction()).await.unwrap();

    // The audit copy is the normalized record, not the raw input.
    let stored = service.canonical_trade(&trade_id).unwrap();
    assert_eq!(stored.account_number, "****7890");
    assert_eq!(stored.security_id, "ABC123");
    assert_eq!(stored.trade_type, "B");
    assert_eq!(stored.amount, Decimal::new(100_000, 0));

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let platform: serde_json::Value = serde_json::from_str(&published[0]).unwrap();
    assert_eq!(platform["platform_id"], "ACCT123");
    assert_eq!(platform["trade"]["account"], "****7890");
    assert_eq!(platform["trade"]["security"], "ABC123");
    assert_eq!(platform["trade"]["type"], "B");
    assert_eq!(platform["trade"]["timestamp"], "2025-08-04T21:15:33Z");
}

#[tokio::test]
async fn stored_count_tracks_successes_and_clear_resets_it() {
    let (_publisher, service) = pipeline();

    assert_eq!(service.stored_trade_count(), 0);
    service.process_trade(&sample_instruction()).await.unwrap();
    service.process_trade(&sample_instruction()).await.unwrap();
    assert_eq!(service.stored_trade_count(), 2);

    service.clear_storage();
    assert_eq!(service.stored_trade_count(), 0);
}

#[tokio::test]
async fn invalid_security_id_fails_before_any_side_effect() {
    let (publisher, service) = pipeline();

    let mut instruction = sample_instruction();
    instruction.security_id = Some("INVALID".to_string());

    let err = service.process_trade(&instruction).await.unwrap_err();

    assert!(matches!(err, ProcessError::Invalid(_)));
    assert_eq!(service.stored_trade_count(), 0);
    assert!(publisher.published().is_empty());
}

#[tokio::test]
async fn publish_initiation_failure_surfaces_but_keeps_the_audit_copy() {
    let publisher = Arc::new(RecordingPublisher {
        fail: true,
        ..Default::default()
    });
    let service = TradeService::new(
        TradeTransformer::new("ACCT123"),
        Arc::new(TradeStore::new()),
        publisher,
    );

    let err = service.process_trade(&sample_instruction()).await.unwrap_err();

    assert!(matches!(err, ProcessError::Publish(_)));
    assert_eq!(service.stored_trade_count(), 1);
}

#[tokio::test]
async fn csv_batch_processes_every_row() {
    let (publisher, service) = pipeline();

    let csv = "account_number,security_id,trade_type,amount,timestamp\n\
               1234567890,abc123,Buy,100000,2025-08-04T21:15:33\n\
               9876543210,xyz999,Sell,250.50,2025-08-05T09:30:00\n";

    let instructions = parse_instructions(FileKind::Csv, csv.as_bytes()).unwrap();
    let mut trade_ids = Vec::new();
    for instruction in &instructions {
        trade_ids.push(service.process_trade(instruction).await.unwrap());
    }

    assert_eq!(trade_ids.len(), 2);
    assert_eq!(service.stored_trade_count(), 2);
    assert_eq!(publisher.published().len(), 2);

    let second = service.canonical_trade(&trade_ids[1]).unwrap();
    assert_eq!(second.account_number, "****3210");
    assert_eq!(second.security_id, "XYZ999");
    assert_eq!(second.trade_type, "S");
    assert_eq!(second.amount, Decimal::new(25_050, 2));
}

#[tokio::test]
async fn batch_aborts_on_first_processing_failure_keeping_earlier_writes() {
    let (publisher, service) = pipeline();

    // Second record carries a seven-character security id: valid to parse,
    // rejected by normalization.
    let json = r#"[
        {"account_number":"1234567890","security_id":"abc123","trade_type":"Buy",
         "amount":100000,"timestamp":"2025-08-04T21:15:33"},
        {"account_number":"9876543210","security_id":"INVALID","trade_type":"Sell",
         "amount":500,"timestamp":"2025-08-05T09:30:00"},
        {"account_number":"5555555555","security_id":"def456","trade_type":"Buy",
         "amount":750,"timestamp":"2025-08-05T10:00:00"}
    ]"#;

    let instructions = parse_instructions(FileKind::Json, json.as_bytes()).unwrap();

    let mut processed = Vec::new();
    let mut failure = None;
    for instruction in &instructions {
        match service.process_trade(instruction).await {
            Ok(id) => processed.push(id),
            Err(err) => {
                failure = Some(err);
                break;
            }
        }
    }

    // The batch stops at the bad record; the first record's write and
    // publish are not rolled back, and the third record is never reached.
    assert!(matches!(failure, Some(ProcessError::Invalid(_))));
    assert_eq!(processed.len(), 1);
    assert_eq!(service.stored_trade_count(), 1);
    assert_eq!(publisher.published().len(), 1);
}

#[tokio::test]
async fn consumer_style_errors_do_not_poison_later_messages() {
    // The inbound bus path swallows per-message failures; processing must
    // stay usable after a rejected instruction.
    let (publisher, service) = pipeline();

    let mut bad = sample_instruction();
    bad.trade_type = None;
    assert!(service.process_trade(&bad).await.is_err());

    let trade_id = service.process_trade(&sample_instruction()).await.unwrap();

    assert!(service.canonical_trade(&trade_id).is_some());
    assert_eq!(service.stored_trade_count(), 1);
    assert_eq!(publisher.published().len(), 1);
}
