//! SQLite schema for the poker ledger database.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnDelete, SqlType, Table, VersionedSchema,
};

const PLAYER_FK: ForeignKey = ForeignKey {
    foreign_table: "players",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::Cascade,
};

const SESSION_FK: ForeignKey = ForeignKey {
    foreign_table: "sessions",
    foreign_column: "id",
    on_delete: ForeignKeyOnDelete::Cascade,
};

const PLAYERS_TABLE_V1: Table = Table {
    name: "players",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("player_name", &SqlType::Text, non_null = true),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
};

const SESSIONS_TABLE_V1: Table = Table {
    name: "sessions",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "player_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&PLAYER_FK)
        ),
        sqlite_column!("date", &SqlType::Text, non_null = true), // ISO 8601 date
        sqlite_column!("location", &SqlType::Text, non_null = true),
        sqlite_column!("game_type", &SqlType::Text, non_null = true),
        sqlite_column!("memo", &SqlType::Text),
    ],
    indices: &[("idx_sessions_player_id", "player_id")],
};

const SESSION_INTERVALS_TABLE_V1: Table = Table {
    name: "session_intervals",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "session_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&SESSION_FK)
        ),
        sqlite_column!("timestamp", &SqlType::Text, non_null = true), // RFC 3339
        sqlite_column!("stack", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "add_on_amount",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
    ],
    indices: &[("idx_session_intervals_session_id", "session_id")],
};

/// All versioned schemas for the ledger database.
///
/// Version 1: players, sessions, session_intervals
pub const LEDGER_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        PLAYERS_TABLE_V1,
        SESSIONS_TABLE_V1,
        SESSION_INTERVALS_TABLE_V1,
    ],
    migration: None,
}];
