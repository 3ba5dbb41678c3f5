use super::models::*;
use super::schema::LEDGER_VERSIONED_SCHEMAS;
use super::{LedgerStore, LedgerStoreError, StoreResult};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let mut conn = Connection::open(path).context("Failed to open ledger database")?;
        conn.execute("PRAGMA foreign_keys = ON;", [])?;

        if is_new_db {
            info!("Creating new ledger database at {:?}", path);
            LEDGER_VERSIONED_SCHEMAS.last().unwrap().create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            if db_version < 1 {
                anyhow::bail!(
                    "Ledger database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let current_version = LEDGER_VERSIONED_SCHEMAS.last().unwrap().version as i64;
            let schema = LEDGER_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown ledger database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Ledger database schema validation failed for version {}",
                    db_version
                )
            })?;

            if db_version < current_version {
                info!(
                    "Migrating ledger database from version {} to {}",
                    db_version, current_version
                );
                Self::migrate(&mut conn, db_version as usize)?;
            }
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate(conn: &mut Connection, from_version: usize) -> Result<()> {
        let tx = conn.transaction()?;
        let mut reached = from_version;
        for schema in LEDGER_VERSIONED_SCHEMAS.iter() {
            if schema.version <= from_version {
                continue;
            }
            info!(
                "Running ledger database migration from version {} to {}",
                reached, schema.version
            );
            if let Some(migration_fn) = schema.migration {
                migration_fn(&tx).with_context(|| {
                    format!("Failed to run migration to version {}", schema.version)
                })?;
            }
            reached = schema.version;
        }
        tx.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + reached),
            [],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn check_len(field: &'static str, value: &str, max: usize) -> StoreResult<()> {
        if value.chars().count() > max {
            return Err(LedgerStoreError::Invalid(format!(
                "{} exceeds {} characters",
                field, max
            )));
        }
        Ok(())
    }

    fn row_to_player(row: &rusqlite::Row) -> rusqlite::Result<Player> {
        Ok(Player {
            id: row.get("id")?,
            player_name: row.get("player_name")?,
            email: row.get("email")?,
        })
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<Session> {
        let date_str: String = row.get("date")?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Session {
            id: row.get("id")?,
            player_id: row.get("player_id")?,
            date,
            location: row.get("location")?,
            game_type: row.get("game_type")?,
            memo: row.get("memo")?,
        })
    }

    fn row_to_interval(row: &rusqlite::Row) -> rusqlite::Result<Interval> {
        let timestamp_str: String = row.get("timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        Ok(Interval {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            timestamp,
            stack: row.get("stack")?,
            add_on_amount: row.get("add_on_amount")?,
        })
    }

    fn exists(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
        conn.query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1", table),
            params![id],
            |_| Ok(()),
        )
        .map(|_| true)
        .or_else(|err| match err {
            rusqlite::Error::QueryReturnedNoRows => Ok(false),
            other => Err(other),
        })
    }
}

/// Maps a UNIQUE constraint violation on players.email to `DuplicateEmail`.
fn map_insert_player_error(err: rusqlite::Error, email: &str) -> LedgerStoreError {
    if let rusqlite::Error::SqliteFailure(sqlite_err, ref msg) = err {
        if sqlite_err.code == ErrorCode::ConstraintViolation
            && msg.as_deref().is_some_and(|m| m.contains("players.email"))
        {
            return LedgerStoreError::DuplicateEmail(email.to_string());
        }
    }
    LedgerStoreError::Sqlite(err)
}

impl LedgerStore for SqliteLedgerStore {
    fn create_player(&self, new_player: NewPlayer) -> StoreResult<Player> {
        Self::check_len("player_name", &new_player.player_name, PLAYER_NAME_MAX_LEN)?;
        Self::check_len("email", &new_player.email, EMAIL_MAX_LEN)?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO players (player_name, email) VALUES (?1, ?2)",
            params![new_player.player_name, new_player.email],
        )
        .map_err(|err| map_insert_player_error(err, &new_player.email))?;

        Ok(Player {
            id: conn.last_insert_rowid(),
            player_name: new_player.player_name,
            email: new_player.email,
        })
    }

    fn list_players(&self) -> StoreResult<Vec<Player>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, player_name, email FROM players ORDER BY id")?;
        let players = stmt
            .query_map([], Self::row_to_player)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(players)
    }

    fn get_player(&self, id: i64) -> StoreResult<Option<Player>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, player_name, email FROM players WHERE id = ?1")?;
        match stmt.query_row(params![id], Self::row_to_player) {
            Ok(player) => Ok(Some(player)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete_player(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM players WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(LedgerStoreError::NotFound {
                entity: "player",
                id,
            });
        }
        Ok(())
    }

    fn create_session(&self, player_id: i64, new_session: NewSession) -> StoreResult<Session> {
        Self::check_len("location", &new_session.location, LOCATION_MAX_LEN)?;
        Self::check_len("game_type", &new_session.game_type, GAME_TYPE_MAX_LEN)?;

        let conn = self.conn.lock().unwrap();
        if !Self::exists(&conn, "players", player_id)? {
            return Err(LedgerStoreError::NotFound {
                entity: "player",
                id: player_id,
            });
        }

        conn.execute(
            "INSERT INTO sessions (player_id, date, location, game_type, memo)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                player_id,
                new_session.date.format("%Y-%m-%d").to_string(),
                new_session.location,
                new_session.game_type,
                new_session.memo,
            ],
        )?;

        Ok(Session {
            id: conn.last_insert_rowid(),
            player_id,
            date: new_session.date,
            location: new_session.location,
            game_type: new_session.game_type,
            memo: new_session.memo,
        })
    }

    fn list_sessions(&self) -> StoreResult<Vec<Session>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, player_id, date, location, game_type, memo FROM sessions ORDER BY id",
        )?;
        let sessions = stmt
            .query_map([], Self::row_to_session)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    fn update_session(&self, id: i64, patch: SessionPatch) -> StoreResult<Session> {
        if let Some(location) = &patch.location {
            Self::check_len("location", location, LOCATION_MAX_LEN)?;
        }
        if let Some(game_type) = &patch.game_type {
            Self::check_len("game_type", game_type, GAME_TYPE_MAX_LEN)?;
        }

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, player_id, date, location, game_type, memo FROM sessions WHERE id = ?1",
        )?;
        let mut session = match stmt.query_row(params![id], Self::row_to_session) {
            Ok(session) => session,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(LedgerStoreError::NotFound {
                    entity: "session",
                    id,
                })
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(date) = patch.date {
            session.date = date;
        }
        if let Some(location) = patch.location {
            session.location = location;
        }
        if let Some(game_type) = patch.game_type {
            session.game_type = game_type;
        }
        if let Some(memo) = patch.memo {
            session.memo = Some(memo);
        }

        conn.execute(
            "UPDATE sessions SET date = ?1, location = ?2, game_type = ?3, memo = ?4
             WHERE id = ?5",
            params![
                session.date.format("%Y-%m-%d").to_string(),
                session.location,
                session.game_type,
                session.memo,
                id,
            ],
        )?;

        Ok(session)
    }

    fn delete_session(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(LedgerStoreError::NotFound {
                entity: "session",
                id,
            });
        }
        Ok(())
    }

    fn create_interval(
        &self,
        session_id: i64,
        new_interval: NewInterval,
    ) -> StoreResult<Interval> {
        let conn = self.conn.lock().unwrap();
        if !Self::exists(&conn, "sessions", session_id)? {
            return Err(LedgerStoreError::NotFound {
                entity: "session",
                id: session_id,
            });
        }

        conn.execute(
            "INSERT INTO session_intervals (session_id, timestamp, stack, add_on_amount)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id,
                new_interval.timestamp.to_rfc3339(),
                new_interval.stack,
                new_interval.add_on_amount,
            ],
        )?;

        Ok(Interval {
            id: conn.last_insert_rowid(),
            session_id,
            timestamp: new_interval.timestamp,
            stack: new_interval.stack,
            add_on_amount: new_interval.add_on_amount,
        })
    }

    fn list_intervals(&self) -> StoreResult<Vec<Interval>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, session_id, timestamp, stack, add_on_amount
             FROM session_intervals ORDER BY id",
        )?;
        let intervals = stmt
            .query_map([], Self::row_to_interval)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(intervals)
    }

    fn delete_interval(&self, id: i64) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM session_intervals WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(LedgerStoreError::NotFound {
                entity: "interval",
                id,
            });
        }
        Ok(())
    }
}
