use axum::extract::FromRef;

use crate::ledger_store::LedgerStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedLedgerStore = Arc<dyn LedgerStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub ledger_store: GuardedLedgerStore,
}

impl FromRef<ServerState> for GuardedLedgerStore {
    fn from_ref(input: &ServerState) -> Self {
        input.ledger_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
