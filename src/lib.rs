//! Poker Ledger Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod ledger_store;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use ledger_store::{LedgerStore, LedgerStoreError, SqliteLedgerStore};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
