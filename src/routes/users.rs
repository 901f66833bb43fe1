// User routes: CRUD, balance lookup and bet history

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app_state::SharedState;
use crate::error::LedgerError;
use crate::handlers::parse_body;
use crate::models::{BalanceResponse, Bet, CreateUserRequest, User};

/// POST /api/v1/users
/// Body: { "user_id": "...", "initial_balance": 500.0 } (balance optional)
pub async fn create_user(
    State(state): State<SharedState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), LedgerError> {
    let req = parse_body(payload)?;
    let user = state.store.create_user(req.user_id.trim(), req.initial_balance)?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users
pub async fn list_users(State(state): State<SharedState>) -> Result<Json<Value>, LedgerError> {
    let users = state.store.list_users()?;
    Ok(Json(json!({ "count": users.len(), "users": users })))
}

/// GET /api/v1/users/:user_id
pub async fn get_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, LedgerError> {
    Ok(Json(state.store.get_user(&user_id)?))
}

/// PUT /api/v1/users/:user_id
/// Only refreshes `updated_at`
pub async fn update_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, LedgerError> {
    let user = state.store.update_user(&user_id)?;
    info!("✏️  User {} updated", user_id);
    Ok(Json(user))
}

/// DELETE /api/v1/users/:user_id
pub async fn delete_user(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, LedgerError> {
    state.store.delete_user(&user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/users/:user_id/balance
pub async fn get_user_balance(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, LedgerError> {
    let balance = state.store.get_user_balance(&user_id)?;
    Ok(Json(BalanceResponse { user_id, balance }))
}

/// GET /api/v1/users/:user_id/bets
pub async fn get_user_bets(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Bet>>, LedgerError> {
    Ok(Json(state.store.list_bets_for_user(&user_id)?))
}
