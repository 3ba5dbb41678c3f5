use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum field lengths, matching the table constraints.
pub const PLAYER_NAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 255;
pub const LOCATION_MAX_LEN: usize = 255;
pub const GAME_TYPE_MAX_LEN: usize = 50;

/// A person whose poker results are tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: i64,
    pub player_name: String,
    /// Globally unique across all players.
    pub email: String,
}

/// Payload for creating a player.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    pub player_name: String,
    pub email: String,
}

/// One poker-playing occasion by a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub player_id: i64,
    pub date: NaiveDate,
    pub location: String,
    pub game_type: String,
    pub memo: Option<String>,
}

/// Payload for creating a session under a player.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSession {
    pub date: NaiveDate,
    pub location: String,
    pub game_type: String,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Partial update for a session. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatch {
    pub date: Option<NaiveDate>,
    pub location: Option<String>,
    pub game_type: Option<String>,
    /// `Some(None)` is not expressible here; supplying `memo` replaces it,
    /// omitting it keeps the stored value.
    pub memo: Option<String>,
}

/// A timestamped stack-size checkpoint within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    pub id: i64,
    pub session_id: i64,
    pub timestamp: DateTime<Utc>,
    /// Chip count at this checkpoint.
    pub stack: i64,
    pub add_on_amount: i64,
}

/// Payload for creating an interval under a session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewInterval {
    pub timestamp: DateTime<Utc>,
    pub stack: i64,
    #[serde(default)]
    pub add_on_amount: i64,
}
