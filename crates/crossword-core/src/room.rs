//! Room keys: logical delivery groups.
//!
//! A room is never stored as an entity; the key only names who should
//! receive an event. Personal rooms are keyed by username, game rooms by
//! session id. The two namespaces are kept apart so a username that
//! happens to equal a session id can't receive game traffic.

use std::fmt;

use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomKey {
    /// Per-user room, joined on authenticate.
    Personal(String),

    /// Per-session room, joined on `join_game`, left on `leave_game`.
    Game(SessionId),
}

impl RoomKey {
    pub fn personal(username: impl Into<String>) -> Self {
        RoomKey::Personal(username.into())
    }

    pub fn game(id: &SessionId) -> Self {
        RoomKey::Game(id.clone())
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKey::Personal(name) => write!(f, "user:{}", name),
            RoomKey::Game(id) => write!(f, "game:{}", id),
        }
    }
}
