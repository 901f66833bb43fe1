// HTTP request handlers for bets, settlement and service health

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::app_state::SharedState;
use crate::error::{ErrorKind, LedgerError};
use crate::models::*;

// ===== ERROR MAPPING =====

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("❌ Internal error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        let mut body = json!({ "error": message });
        if self.is_partial() {
            body["partial"] = json!(true);
        }
        (status, Json(body)).into_response()
    }
}

/// Malformed JSON bodies become a 400 instead of axum's default rejection
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, LedgerError> {
    payload.map(|Json(body)| body).map_err(|e| {
        warn!("Cannot parse request body: {}", e);
        LedgerError::BadRequest(format!("cannot parse JSON request body: {}", e.body_text()))
    })
}

// ===== BET ENDPOINTS =====

/// POST /api/v1/bets
/// Creates the user on first bet, then places the wager
pub async fn place_bet(
    State(state): State<SharedState>,
    payload: Result<Json<PlaceBetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Bet>), LedgerError> {
    let req = parse_body(payload)?;
    req.validate()?;

    state.store.find_or_create_user(&req.user_id)?;
    let bet = state.store.place_bet(&req.user_id, &req.event_id, req.odds, req.stake)?;

    Ok((StatusCode::CREATED, Json(bet)))
}

/// GET /api/v1/bets/:bet_id
pub async fn get_bet(
    State(state): State<SharedState>,
    Path(bet_id): Path<String>,
) -> Result<Json<Bet>, LedgerError> {
    Ok(Json(state.store.get_bet(&bet_id)?))
}

/// POST /api/v1/bets/settle/:event_id
/// Body: { "result": "win" | "lose" }
pub async fn settle_event(
    State(state): State<SharedState>,
    Path(event_id): Path<String>,
    payload: Result<Json<SettleEventRequest>, JsonRejection>,
) -> Result<Json<SettlementResponse>, LedgerError> {
    let req = parse_body(payload)?;
    let outcome = SettlementOutcome::parse(req.result.trim())?;

    info!("⚖️  Settling event {} as {}", event_id, outcome.as_str());
    let report = state.settlement.settle_event(&event_id, outcome)?;

    Ok(Json(SettlementResponse {
        event_id: report.event_id.clone(),
        outcome: report.outcome,
        settled: report.settled.len(),
        total_payout: report.total_payout(),
        bet_ids: report.settled.iter().map(|b| b.id.clone()).collect(),
    }))
}

// ===== LEDGER ENDPOINTS =====

/// GET /api/v1/stats
pub async fn get_stats(State(state): State<SharedState>) -> Result<Json<Value>, LedgerError> {
    let stats = state.store.stats()?;
    Ok(Json(json!({ "stats": stats })))
}

// ===== HEALTH / FALLBACK =====

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Route not found" })))
}
