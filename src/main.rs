// Bet Settlement Ledger - Main Entry Point

use bet_settlement_ledger::{router, AppState, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🎲 Bet Settlement Ledger");

    let config = ServerConfig::from_env();
    let state = AppState::new(&config).shared();
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("❌ Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };

    info!("📡 Listening on http://{}", config.bind_addr);
    info!("📋 Endpoints:");
    info!("   POST   /api/v1/bets                    - Place bet (creates user if new)");
    info!("   GET    /api/v1/bets/:bet_id            - Get bet");
    info!("   POST   /api/v1/bets/settle/:event_id   - Settle event (win | lose)");
    info!("   POST   /api/v1/users                   - Create user");
    info!("   GET    /api/v1/users                   - List users");
    info!("   GET    /api/v1/users/:user_id          - Get user");
    info!("   PUT    /api/v1/users/:user_id          - Touch user");
    info!("   DELETE /api/v1/users/:user_id          - Delete user");
    info!("   GET    /api/v1/users/:user_id/balance  - Get balance");
    info!("   GET    /api/v1/users/:user_id/bets     - Get bet history");
    info!("   GET    /api/v1/stats                   - Ledger stats");
    info!("   GET    /health                         - Health check");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
    };

    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        error!("❌ Server error: {}", e);
    }
}
