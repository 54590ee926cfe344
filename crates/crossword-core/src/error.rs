//! Error types for session coordination.
//!
//! Stale authentication and dropped transports are not errors at this
//! layer; they are handled by the server's disconnect cleanup.

use thiserror::Error;

use crate::session::SessionId;

/// Failures from `SessionRegistry` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The session id is not in the live registry.
    #[error("game session {0} not found")]
    NotFound(SessionId),
}

/// Failures reported by a `SessionStore` collaborator.
///
/// The registry logs these and carries on; persistence is best effort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage rejected write: {0}")]
    Rejected(String),
}

/// A `RegistryConfig` the countdown cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryConfigError {
    #[error("session duration must be positive, got {0}s")]
    NonPositiveDuration(i64),

    #[error("tick interval must be non-zero")]
    ZeroTickInterval,
}
