//! crossword-server
//!
//! Multi-client async TCP server for live crossword sessions.

pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod rooms;
pub mod server;
pub mod types;

// these are internal modules, not re-exported
mod client;
mod delivery;
