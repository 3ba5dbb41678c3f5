mod models;
mod schema;
mod sqlite_ledger_store;

pub use models::*;
pub use schema::LEDGER_VERSIONED_SCHEMAS;
pub use sqlite_ledger_store::SqliteLedgerStore;

use thiserror::Error;

/// Typed failures raised by the data-access layer.
///
/// The transport layer maps these onto HTTP status codes; nothing here is
/// retried or swallowed.
#[derive(Debug, Error)]
pub enum LedgerStoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("a player with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("invalid field: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = Result<T, LedgerStoreError>;

/// CRUD operations over the three ledger entities.
///
/// Each call is a single independent unit against the store; referential
/// integrity and cascade deletion are enforced by the SQLite schema.
pub trait LedgerStore: Send + Sync {
    // Players
    fn create_player(&self, new_player: NewPlayer) -> StoreResult<Player>;
    fn list_players(&self) -> StoreResult<Vec<Player>>;
    fn get_player(&self, id: i64) -> StoreResult<Option<Player>>;
    /// Deletes a player and, via cascade, its sessions and their intervals.
    fn delete_player(&self, id: i64) -> StoreResult<()>;

    // Sessions
    /// Fails with `NotFound` if the player id does not exist.
    fn create_session(&self, player_id: i64, new_session: NewSession) -> StoreResult<Session>;
    fn list_sessions(&self) -> StoreResult<Vec<Session>>;
    /// Applies only the fields present in the patch; returns the updated row.
    fn update_session(&self, id: i64, patch: SessionPatch) -> StoreResult<Session>;
    /// Deletes a session and, via cascade, its intervals.
    fn delete_session(&self, id: i64) -> StoreResult<()>;

    // Intervals
    /// Fails with `NotFound` if the session id does not exist.
    fn create_interval(&self, session_id: i64, new_interval: NewInterval)
        -> StoreResult<Interval>;
    fn list_intervals(&self) -> StoreResult<Vec<Interval>>;
    fn delete_interval(&self, id: i64) -> StoreResult<()>;
}
