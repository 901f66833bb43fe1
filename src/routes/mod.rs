// Routes module - assembles every HTTP endpoint into one router

pub mod users;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::app_state::SharedState;
use crate::handlers::*;
use users::*;

pub fn router(state: SharedState) -> Router {
    let api = Router::new()
        // ===== BETTING ENDPOINTS =====
        .route("/bets", post(place_bet))
        .route("/bets/:bet_id", get(get_bet))
        .route("/bets/settle/:event_id", post(settle_event))

        // ===== USER ENDPOINTS =====
        .route("/users", post(create_user).get(list_users))
        .route("/users/:user_id", get(get_user).put(update_user).delete(delete_user))
        .route("/users/:user_id/balance", get(get_user_balance))
        .route("/users/:user_id/bets", get(get_user_bets))

        // ===== LEDGER ENDPOINTS =====
        .route("/stats", get(get_stats));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
