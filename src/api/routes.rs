use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::upload::{parse_instructions, FileKind};
use crate::models::{CanonicalTrade, TradeInstruction};
use crate::service::{ProcessError, TradeService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TradeService>,
}

/// Create the API router
pub fn create_router(service: Arc<TradeService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/trades/upload", post(upload_trades))
        .route("/api/trades/single", post(process_single_trade))
        .route("/api/trades/canonical/:trade_id", get(get_canonical_trade))
        .route("/api/trades/stats", get(get_stats))
        .route("/api/trades/storage", delete(clear_storage))
        .with_state(state)
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Batch upload: one multipart file, CSV or JSON, routed by extension.
///
/// The whole file is parsed before any record is processed, so a parse
/// error rejects the batch up front. Processing then runs record by record
/// and aborts on the first failure; records processed before the failure
/// keep their store writes and publishes (the inbound bus path, by
/// contrast, swallows per-message errors individually).
async fn upload_trades(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(format!("invalid multipart request: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .ok_or_else(|| ApiError::BadRequest("invalid filename".to_string()))?
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(format!("failed to read upload: {err}")))?;
        file = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) =
        file.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("file is empty".to_string()));
    }

    let kind = FileKind::from_name(&filename).ok_or_else(|| {
        ApiError::BadRequest("unsupported file format, only CSV and JSON are supported".to_string())
    })?;

    let instructions = parse_instructions(kind, &data)
        .map_err(|err| ApiError::BadRequest(format!("failed to parse file: {err:#}")))?;

    let mut trade_ids = Vec::with_capacity(instructions.len());
    for instruction in &instructions {
        let trade_id = state.service.process_trade(instruction).await?;
        trade_ids.push(trade_id);
    }

    Ok(Json(UploadResponse {
        message: "File processed successfully".to_string(),
        processed_count: trade_ids.len(),
        trade_ids,
    }))
}

/// Process a single trade instruction from a JSON body.
async fn process_single_trade(
    State(state): State<AppState>,
    Json(instruction): Json<TradeInstruction>,
) -> Result<Json<SingleTradeResponse>, ApiError> {
    let trade_id = state.service.process_trade(&instruction).await?;

    Ok(Json(SingleTradeResponse {
        message: "Trade processed successfully".to_string(),
        trade_id,
    }))
}

/// Retrieve a stored canonical trade by id. A malformed id is a plain
/// lookup miss, not an error.
async fn get_canonical_trade(
    State(state): State<AppState>,
    Path(trade_id): Path<String>,
) -> Result<Json<CanonicalTrade>, ApiError> {
    Uuid::parse_str(&trade_id)
        .ok()
        .and_then(|id| state.service.canonical_trade(&id))
        .map(Json)
        .ok_or(ApiError::NotFound(format!("Trade {} not found", trade_id)))
}

/// Get processing statistics
async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stored_trade_count: state.service.stored_trade_count(),
    })
}

/// Administrative reset of the audit store.
async fn clear_storage(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.service.clear_storage();
    Json(json!({ "message": "Storage cleared" }))
}

// ===== Request/Response Types =====

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    #[serde(rename = "processedCount")]
    processed_count: usize,
    #[serde(rename = "tradeIds")]
    trade_ids: Vec<Uuid>,
}

#[derive(Serialize)]
struct SingleTradeResponse {
    message: String,
    #[serde(rename = "tradeId")]
    trade_id: Uuid,
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(rename = "storedTradeCount")]
    stored_trade_count: usize,
}

// ===== Error Handling =====

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        ApiError::BadRequest(format!("failed to process trade: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
