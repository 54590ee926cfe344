//! External storage collaborator.
//!
//! Puzzle content, accounts and game history live elsewhere. The
//! registry only tells storage about three things: a session was
//! created, a player joined, a session changed status.
//!
//! Calls are synchronous and made outside the registry lock. An
//! implementation backed by blocking I/O should hand work off to its
//! own thread rather than block the caller.

use std::sync::Mutex;

use crate::error::StoreError;
use crate::session::{PuzzleId, SessionId, SessionStatus};

pub trait SessionStore: Send + Sync {
    /// Called once when a session is created.
    fn persist_session_stub(&self, id: &SessionId, puzzle_id: PuzzleId) -> Result<(), StoreError>;

    /// Called once per successful join.
    fn persist_player_join(&self, id: &SessionId, username: &str) -> Result<(), StoreError>;

    /// Called once when the session moves to `Completed`.
    fn persist_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<(), StoreError>;
}

/// A recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    SessionStub {
        id: SessionId,
        puzzle_id: PuzzleId,
    },
    PlayerJoin {
        id: SessionId,
        username: String,
    },
    SessionStatus {
        id: SessionId,
        status: SessionStatus,
    },
}

/// In-process store. Keeps the call log and nothing else.
///
/// This is what the server runs with when no real database is wired
/// in, and what tests assert against.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    calls: Mutex<Vec<StoreCall>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        InMemorySessionStore::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        match self.calls.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, call: StoreCall) {
        let mut guard = match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(call);
    }
}

impl SessionStore for InMemorySessionStore {
    fn persist_session_stub(&self, id: &SessionId, puzzle_id: PuzzleId) -> Result<(), StoreError> {
        self.record(StoreCall::SessionStub {
            id: id.clone(),
            puzzle_id,
        });
        Ok(())
    }

    fn persist_player_join(&self, id: &SessionId, username: &str) -> Result<(), StoreError> {
        self.record(StoreCall::PlayerJoin {
            id: id.clone(),
            username: username.to_string(),
        });
        Ok(())
    }

    fn persist_session_status(&self, id: &SessionId, status: SessionStatus) -> Result<(), StoreError> {
        self.record(StoreCall::SessionStatus {
            id: id.clone(),
            status,
        });
        Ok(())
    }
}
