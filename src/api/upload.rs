//! Batch upload file parsing.
//!
//! Uploads are routed by extension: `.csv` expects a header row with the
//! canonical field names and one record per data row, `.json` expects an
//! array of records. The whole file is parsed up front, so a malformed
//! record rejects the batch before any processing starts.

use anyhow::{Context, Result};

use crate::models::TradeInstruction;

/// Supported upload formats, derived from the filename extension
/// (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Json,
}

impl FileKind {
    pub fn from_name(filename: &str) -> Option<Self> {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// Parse an entire upload into raw instructions.
pub fn parse_instructions(kind: FileKind, data: &[u8]) -> Result<Vec<TradeInstruction>> {
    match kind {
        FileKind::Csv => parse_csv(data),
        FileKind::Json => parse_json(data),
    }
}

fn parse_csv(data: &[u8]) -> Result<Vec<TradeInstruction>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut instructions = Vec::new();
    for (row, record) in reader.deserialize::<TradeInstruction>().enumerate() {
        let instruction = record.with_context(|| format!("invalid CSV record at row {}", row + 1))?;
        instructions.push(instruction);
    }
    Ok(instructions)
}

fn parse_json(data: &[u8]) -> Result<Vec<TradeInstruction>> {
    serde_json::from_slice(data).context("invalid JSON trade instruction array")
}
