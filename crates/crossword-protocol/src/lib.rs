//! crossword-protocol
//!
//! Wire-level encoding/decoding for the session server.
//!
//! This crate turns logical events (`crossword_core::ClientEvent` /
//! `ServerEvent`) into text frames and back again.
//!
//! - [`wire_types`] : envelope shape and framing constants
//! - [`json_codec`] : one JSON object per frame, `{"event", "data"}`

pub mod json_codec;
pub mod wire_types;

pub use json_codec::{
    decode_client_event,
    decode_server_event,
    encode_client_event,
    encode_server_event,
    ProtocolError,
};
