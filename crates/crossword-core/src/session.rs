//! Live session data model.
//!
//! A `Session` is one timed puzzle instance. The registry owns every
//! session; anything handed out from it is a snapshot copy.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque game session identifier (a UUID v4 string on creation).
///
/// Clients echo it back as `game_id`, so any string is accepted when
/// decoding; only the registry decides whether it names a live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh random id.
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        SessionId(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to puzzle content held by external storage. Never dereferenced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleId(pub i64);

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session lifecycle. Only `Active -> Completed` is ever taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Active,
    Completed,
}

impl SessionStatus {
    /// Storage representation, as the games table records it.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One live puzzle-solving instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub puzzle_id: PuzzleId,

    /// Append-only roster in join order. Duplicates are kept: a player
    /// who joins twice appears twice.
    pub players: Vec<String>,

    /// Seconds left; only ever decremented while `Active`.
    pub time_remaining: i64,

    pub status: SessionStatus,
}

impl Session {
    /// New `Active` session with an empty roster.
    pub fn new(id: SessionId, puzzle_id: PuzzleId, duration_secs: i64) -> Self {
        Session {
            id,
            puzzle_id,
            players: Vec::new(),
            time_remaining: duration_secs,
            status: SessionStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn has_player(&self, username: &str) -> bool {
        self.players.iter().any(|p| p == username)
    }
}
