// Application state shared by the HTTP handlers

use std::sync::Arc;
use tracing::info;

use crate::config::ServerConfig;
use crate::ledger::LedgerStore;
use crate::settlement::SettlementOrchestrator;

/// Locking lives inside the store, so the state itself is shared without a mutex.
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<LedgerStore>,
    pub settlement: SettlementOrchestrator,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        info!("🚀 Initializing bet settlement ledger...");
        let store = Arc::new(LedgerStore::with_default_balance(config.default_balance));
        Self::with_store(store)
    }

    pub fn with_store(store: Arc<LedgerStore>) -> Self {
        let settlement = SettlementOrchestrator::new(store.clone());
        Self { store, settlement }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }
}
