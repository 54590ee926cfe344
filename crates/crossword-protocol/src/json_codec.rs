//! JSON encoding/decoding for crossword-core events.
//!
//! This module converts between:
//! - one text frame (`&str`, delimiter already stripped)
//! - high-level `ClientEvent` / `ServerEvent`
//!
//! Input (client → server)
//! -----------------------
//! ```text
//! authenticate    {"username"}
//! create_game     {"puzzle_id", "username"?}
//! join_game       {"game_id", "username"}
//! make_move       {"game_id", ...anything else...}
//! leave_game      {"game_id"}
//! send_message    {"sender", "receiver", "content"}
//! friend_request  {"from_user", "to_user"}
//! ```
//!
//! `connect` / `disconnect` are reserved: the server raises them itself
//! and refuses them in frames.
//!
//! Output (server → client)
//! ------------------------
//! ```text
//! game_created    {"game_id"}
//! player_joined   {"username"}
//! game_update     the make_move data, verbatim
//! game_timer      {"time"}
//! game_over       {"reason"}            "time_up" | "ended"
//! new_message     {"sender", "content", "timestamp"}
//! friend_request  {"from_user"}
//! error           {"event", "message"}
//! ```
//!
//! NOTE: one event per buffer. The TCP layer does the line splitting.

use crossword_core::{ClientEvent, ClientEventKind, ServerEvent, ServerEventKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::wire_types::Envelope;

/// Errors that can arise when encoding/decoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds the configured maximum.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLong { len: usize, max: usize },

    /// Frame is not UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// Not a JSON envelope.
    #[error("malformed frame: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Event name not in the taxonomy.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// `connect` / `disconnect` sent as a frame.
    #[error("event {0} is reserved for the transport")]
    ReservedEvent(&'static str),

    /// Envelope fine, `data` wrong for this event.
    #[error("invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization failed while encoding.
    #[error("failed to encode {event}: {source}")]
    Encode {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

// ============================================================================
// INPUT: client → server
// ============================================================================

/// Decode a single client frame.
pub fn decode_client_event(frame: &str) -> Result<ClientEvent, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(frame).map_err(ProtocolError::InvalidJson)?;

    let kind = ClientEventKind::from_name(&envelope.event)
        .ok_or_else(|| ProtocolError::UnknownEvent(envelope.event.clone()))?;

    let data = envelope.data;
    let event = match kind {
        ClientEventKind::Connect | ClientEventKind::Disconnect => {
            return Err(ProtocolError::ReservedEvent(kind.name()))
        }
        ClientEventKind::Authenticate => ClientEvent::Authenticate(payload(kind.name(), data)?),
        ClientEventKind::CreateGame => ClientEvent::CreateGame(payload(kind.name(), data)?),
        ClientEventKind::JoinGame => ClientEvent::JoinGame(payload(kind.name(), data)?),
        ClientEventKind::MakeMove => ClientEvent::MakeMove(payload(kind.name(), data)?),
        ClientEventKind::LeaveGame => ClientEvent::LeaveGame(payload(kind.name(), data)?),
        ClientEventKind::SendMessage => ClientEvent::SendMessage(payload(kind.name(), data)?),
        ClientEventKind::FriendRequest => ClientEvent::FriendRequest(payload(kind.name(), data)?),
    };

    Ok(event)
}

/// Encode a client event as a frame (no trailing delimiter).
pub fn encode_client_event(event: &ClientEvent) -> Result<String, ProtocolError> {
    let name = event.kind().name();

    let data = match event {
        ClientEvent::Connect | ClientEvent::Disconnect => {
            return Err(ProtocolError::ReservedEvent(name))
        }
        ClientEvent::Authenticate(p) => to_data(name, p)?,
        ClientEvent::CreateGame(p) => to_data(name, p)?,
        ClientEvent::JoinGame(p) => to_data(name, p)?,
        ClientEvent::MakeMove(p) => to_data(name, p)?,
        ClientEvent::LeaveGame(p) => to_data(name, p)?,
        ClientEvent::SendMessage(p) => to_data(name, p)?,
        ClientEvent::FriendRequest(p) => to_data(name, p)?,
    };

    write_envelope(name, data)
}

// ============================================================================
// OUTPUT: server → client
// ============================================================================

/// Encode a server event as a frame (no trailing delimiter).
pub fn encode_server_event(event: &ServerEvent) -> Result<String, ProtocolError> {
    let name = event.kind().name();

    let data = match event {
        ServerEvent::SessionCreated(p) => to_data(name, p)?,
        ServerEvent::PlayerJoined(p) => to_data(name, p)?,
        ServerEvent::GameUpdate(p) => to_data(name, p)?,
        ServerEvent::TimeUpdate(p) => to_data(name, p)?,
        ServerEvent::SessionEnded(p) => to_data(name, p)?,
        ServerEvent::NewMessage(p) => to_data(name, p)?,
        ServerEvent::FriendRequestNotice(p) => to_data(name, p)?,
        ServerEvent::Error(p) => to_data(name, p)?,
    };

    write_envelope(name, data)
}

/// Decode a single server frame. Used by clients and tests.
pub fn decode_server_event(frame: &str) -> Result<ServerEvent, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(frame).map_err(ProtocolError::InvalidJson)?;

    let kind = ServerEventKind::from_name(&envelope.event)
        .ok_or_else(|| ProtocolError::UnknownEvent(envelope.event.clone()))?;

    let data = envelope.data;
    let event = match kind {
        ServerEventKind::SessionCreated => ServerEvent::SessionCreated(payload(kind.name(), data)?),
        ServerEventKind::PlayerJoined => ServerEvent::PlayerJoined(payload(kind.name(), data)?),
        ServerEventKind::GameUpdate => ServerEvent::GameUpdate(payload(kind.name(), data)?),
        ServerEventKind::TimeUpdate => ServerEvent::TimeUpdate(payload(kind.name(), data)?),
        ServerEventKind::SessionEnded => ServerEvent::SessionEnded(payload(kind.name(), data)?),
        ServerEventKind::NewMessage => ServerEvent::NewMessage(payload(kind.name(), data)?),
        ServerEventKind::FriendRequestNotice => {
            ServerEvent::FriendRequestNotice(payload(kind.name(), data)?)
        }
        ServerEventKind::Error => ServerEvent::Error(payload(kind.name(), data)?),
    };

    Ok(event)
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn payload<T: DeserializeOwned>(event: &'static str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|source| ProtocolError::InvalidPayload { event, source })
}

fn to_data<T: Serialize>(event: &'static str, value: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(value).map_err(|source| ProtocolError::Encode { event, source })
}

fn write_envelope(event: &'static str, data: Value) -> Result<String, ProtocolError> {
    serde_json::to_string(&Envelope::new(event, data))
        .map_err(|source| ProtocolError::Encode { event, source })
}
