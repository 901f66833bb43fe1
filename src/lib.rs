//! Bet Settlement Ledger
//! Concurrent in-memory ledger of user balances and wagers, plus the
//! settlement orchestrator and the HTTP layer that fronts them.

pub mod app_state;
pub mod config;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod routes;
pub mod settlement;

pub use app_state::{AppState, SharedState};
pub use config::ServerConfig;
pub use error::{ErrorKind, LedgerError, LedgerResult};
pub use ledger::{LedgerStats, LedgerStore, DEFAULT_STARTING_BALANCE};
pub use models::{Bet, BetStatus, SettlementOutcome, User};
pub use routes::router;
pub use settlement::{SettlementFailure, SettlementOrchestrator, SettlementReport};
