//! Low-level wire types and constants.
//!
//! Every frame is a single line of UTF-8 JSON terminated by `\n`:
//!
//! ```text
//! {"event": "join_game", "data": {"game_id": "…", "username": "alice"}}
//! ```
//!
//! `data` may be absent for events without a payload. Event names come
//! from `ClientEventKind::name` / `ServerEventKind::name`.
//!
//! There is no version field; adding one would break existing clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame terminator.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Default upper bound for one frame, delimiter excluded.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Value used in `error` replies when the frame itself could not be read.
pub const FRAME_EVENT: &str = "frame";

/// The outer object of every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: &str, data: Value) -> Self {
        Envelope {
            event: event.to_string(),
            data,
        }
    }
}

/// True if a non-empty frame of `len` bytes fits under `max`.
pub fn validate_frame_len(len: usize, max: usize) -> bool {
    len > 0 && len <= max
}
