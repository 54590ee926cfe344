//! Event types exchanged with connected clients.
//!
//! These are **transport-agnostic** logical messages:
//! - [`ClientEvent`]: what the server consumes (one per inbound frame,
//!   plus the synthetic `Connect` / `Disconnect` lifecycle events).
//! - [`ServerEvent`]: what the server publishes to rooms or replies to
//!   a single connection.
//!
//! Payload structs carry the exact field names clients use on the wire.
//! The envelope (`{"event": ..., "data": ...}`) lives in the
//! `crossword-protocol` crate; this module only knows event names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::session::{PuzzleId, SessionId};

/// Inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Connection opened. Synthesized by the transport, never sent by clients.
    Connect,

    /// Connection closed. Synthesized by the transport, never sent by clients.
    Disconnect,

    Authenticate(Authenticate),
    CreateGame(CreateGame),
    JoinGame(JoinGame),
    MakeMove(MakeMove),
    LeaveGame(LeaveGame),
    SendMessage(SendMessage),
    FriendRequest(FriendRequest),
}

/// Name of an inbound event; the dispatcher routes on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEventKind {
    Connect,
    Disconnect,
    Authenticate,
    CreateGame,
    JoinGame,
    MakeMove,
    LeaveGame,
    SendMessage,
    FriendRequest,
}

impl ClientEventKind {
    pub const ALL: [ClientEventKind; 9] = [
        ClientEventKind::Connect,
        ClientEventKind::Disconnect,
        ClientEventKind::Authenticate,
        ClientEventKind::CreateGame,
        ClientEventKind::JoinGame,
        ClientEventKind::MakeMove,
        ClientEventKind::LeaveGame,
        ClientEventKind::SendMessage,
        ClientEventKind::FriendRequest,
    ];

    /// Wire name of the event.
    pub fn name(self) -> &'static str {
        match self {
            ClientEventKind::Connect => "connect",
            ClientEventKind::Disconnect => "disconnect",
            ClientEventKind::Authenticate => "authenticate",
            ClientEventKind::CreateGame => "create_game",
            ClientEventKind::JoinGame => "join_game",
            ClientEventKind::MakeMove => "make_move",
            ClientEventKind::LeaveGame => "leave_game",
            ClientEventKind::SendMessage => "send_message",
            ClientEventKind::FriendRequest => "friend_request",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// `Connect` / `Disconnect` come from the transport, not from frames.
    pub fn is_lifecycle(self) -> bool {
        matches!(self, ClientEventKind::Connect | ClientEventKind::Disconnect)
    }
}

impl ClientEvent {
    pub fn kind(&self) -> ClientEventKind {
        match self {
            ClientEvent::Connect => ClientEventKind::Connect,
            ClientEvent::Disconnect => ClientEventKind::Disconnect,
            ClientEvent::Authenticate(_) => ClientEventKind::Authenticate,
            ClientEvent::CreateGame(_) => ClientEventKind::CreateGame,
            ClientEvent::JoinGame(_) => ClientEventKind::JoinGame,
            ClientEvent::MakeMove(_) => ClientEventKind::MakeMove,
            ClientEvent::LeaveGame(_) => ClientEventKind::LeaveGame,
            ClientEvent::SendMessage(_) => ClientEventKind::SendMessage,
            ClientEvent::FriendRequest(_) => ClientEventKind::FriendRequest,
        }
    }
}

// -----------------------------------------------------------------------------
// Inbound payloads
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authenticate {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGame {
    pub puzzle_id: PuzzleId,

    /// Sent by clients alongside the puzzle; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGame {
    pub game_id: SessionId,
    pub username: String,
}

/// A move, relayed verbatim to the game room.
///
/// Only `game_id` is interpreted; every other field is opaque and is
/// carried through untouched. No legality check happens here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeMove {
    pub game_id: SessionId,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveGame {
    pub game_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    pub sender: String,
    pub receiver: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub from_user: String,
    pub to_user: String,
}

// -----------------------------------------------------------------------------
// Outbound
// -----------------------------------------------------------------------------

/// Outbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Reply to the creator only.
    SessionCreated(SessionCreated),

    PlayerJoined(PlayerJoined),

    /// The `make_move` payload, as received.
    GameUpdate(MakeMove),

    TimeUpdate(TimeUpdate),
    SessionEnded(SessionEnded),
    NewMessage(NewMessage),
    FriendRequestNotice(FriendRequestNotice),

    /// Reply to the originating connection when its event failed.
    Error(ErrorNotice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEventKind {
    SessionCreated,
    PlayerJoined,
    GameUpdate,
    TimeUpdate,
    SessionEnded,
    NewMessage,
    FriendRequestNotice,
    Error,
}

impl ServerEventKind {
    pub const ALL: [ServerEventKind; 8] = [
        ServerEventKind::SessionCreated,
        ServerEventKind::PlayerJoined,
        ServerEventKind::GameUpdate,
        ServerEventKind::TimeUpdate,
        ServerEventKind::SessionEnded,
        ServerEventKind::NewMessage,
        ServerEventKind::FriendRequestNotice,
        ServerEventKind::Error,
    ];

    /// Wire name of the event.
    pub fn name(self) -> &'static str {
        match self {
            ServerEventKind::SessionCreated => "game_created",
            ServerEventKind::PlayerJoined => "player_joined",
            ServerEventKind::GameUpdate => "game_update",
            ServerEventKind::TimeUpdate => "game_timer",
            ServerEventKind::SessionEnded => "game_over",
            ServerEventKind::NewMessage => "new_message",
            ServerEventKind::FriendRequestNotice => "friend_request",
            ServerEventKind::Error => "error",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl ServerEvent {
    pub fn kind(&self) -> ServerEventKind {
        match self {
            ServerEvent::SessionCreated(_) => ServerEventKind::SessionCreated,
            ServerEvent::PlayerJoined(_) => ServerEventKind::PlayerJoined,
            ServerEvent::GameUpdate(_) => ServerEventKind::GameUpdate,
            ServerEvent::TimeUpdate(_) => ServerEventKind::TimeUpdate,
            ServerEvent::SessionEnded(_) => ServerEventKind::SessionEnded,
            ServerEvent::NewMessage(_) => ServerEventKind::NewMessage,
            ServerEvent::FriendRequestNotice(_) => ServerEventKind::FriendRequestNotice,
            ServerEvent::Error(_) => ServerEventKind::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCreated {
    pub game_id: SessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoined {
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeUpdate {
    /// Seconds remaining after this tick.
    pub time: i64,
}

/// Why a session finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The countdown reached zero.
    TimeUp,

    /// Ended early through `SessionRegistry::end_session`.
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnded {
    pub reason: EndReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub sender: String,
    pub content: String,

    /// Server-assigned, unix seconds.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequestNotice {
    pub from_user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
    /// Name of the event that failed, or `"frame"` for undecodable input.
    pub event: String,
    pub message: String,
}

// -----------------------------------------------------------------------------
// Convenience constructors
// -----------------------------------------------------------------------------

impl ServerEvent {
    pub fn session_created(game_id: SessionId) -> Self {
        ServerEvent::SessionCreated(SessionCreated { game_id })
    }

    pub fn player_joined(username: impl Into<String>) -> Self {
        ServerEvent::PlayerJoined(PlayerJoined {
            username: username.into(),
        })
    }

    pub fn time_update(time: i64) -> Self {
        ServerEvent::TimeUpdate(TimeUpdate { time })
    }

    pub fn session_ended(reason: EndReason) -> Self {
        ServerEvent::SessionEnded(SessionEnded { reason })
    }

    pub fn new_message(sender: impl Into<String>, content: impl Into<String>, timestamp: i64) -> Self {
        ServerEvent::NewMessage(NewMessage {
            sender: sender.into(),
            content: content.into(),
            timestamp,
        })
    }

    pub fn friend_request(from_user: impl Into<String>) -> Self {
        ServerEvent::FriendRequestNotice(FriendRequestNotice {
            from_user: from_user.into(),
        })
    }

    pub fn error(event: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorNotice {
            event: event.into(),
            message: message.into(),
        })
    }
}
