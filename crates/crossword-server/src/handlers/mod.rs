//! Handler groups, one per protocol slice.
//!
//! - [`auth`]   : connect / authenticate / disconnect, username mapping
//! - [`game`]   : create, join, move relay, leave
//! - [`social`] : chat and friend-request notifications

pub mod auth;
pub mod game;
pub mod social;

pub use auth::AuthHandlers;
pub use game::GameHandlers;
pub use social::SocialHandlers;
