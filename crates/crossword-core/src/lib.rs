//! crossword-core
//!
//! Transport-agnostic session coordination:
//! - messages (inbound client events / outbound server events)
//! - session data model
//! - room keys used for delivery targeting
//! - session registry with one countdown timer per live session
//! - seams for storage (`SessionStore`) and publishing (`EventSink`)

pub mod error;
pub mod messages;
pub mod registry;
pub mod room;
pub mod session;
pub mod sink;
pub mod store;

mod timer;

pub use error::{RegistryConfigError, SessionError, StoreError};

pub use messages::{
    Authenticate,
    ClientEvent,
    ClientEventKind,
    CreateGame,
    EndReason,
    ErrorNotice,
    FriendRequest,
    FriendRequestNotice,
    JoinGame,
    LeaveGame,
    MakeMove,
    NewMessage,
    PlayerJoined,
    SendMessage,
    ServerEvent,
    ServerEventKind,
    SessionCreated,
    SessionEnded,
    TimeUpdate,
};

pub use registry::{RegistryConfig, SessionRegistry};
pub use room::RoomKey;
pub use session::{PuzzleId, Session, SessionId, SessionStatus};
pub use sink::{EventSink, RecordingSink};
pub use store::{InMemorySessionStore, SessionStore, StoreCall};
