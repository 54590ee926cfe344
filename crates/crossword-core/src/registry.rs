//! Session registry.
//!
//! Owns every live `Session` and the countdown timer attached to it.
//!
//! Locking policy:
//! - One mutex guards the whole session map. Create, join and every
//!   timer tick across all sessions serialize on it.
//! - The lock is held only for the map read/write. Event publishing and
//!   storage calls always happen after it is released.
//!
//! Lifecycle:
//! - `create_session` inserts an `Active` session and spawns exactly one
//!   timer task for it.
//! - The timer decrements `time_remaining` once per tick and finishes
//!   the session when it reaches zero.
//! - `end_session` finishes a session early and cancels its timer.
//! - Sessions are never removed; archival is a storage concern.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{RegistryConfigError, SessionError};
use crate::messages::{EndReason, ServerEvent};
use crate::room::RoomKey;
use crate::session::{PuzzleId, Session, SessionId, SessionStatus};
use crate::sink::EventSink;
use crate::store::SessionStore;
use crate::timer;

/// Default countdown for a new session, in seconds.
pub const DEFAULT_SESSION_SECS: i64 = 300;

/// Default tick period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// `time_remaining` of every new session.
    pub session_duration_secs: i64,

    /// Wall-clock time between two ticks of one session.
    pub tick_interval: Duration,
}

impl RegistryConfig {
    /// A countdown must start above zero and advance at a real pace.
    pub fn validate(&self) -> Result<(), RegistryConfigError> {
        if self.session_duration_secs <= 0 {
            return Err(RegistryConfigError::NonPositiveDuration(self.session_duration_secs));
        }
        if self.tick_interval.is_zero() {
            return Err(RegistryConfigError::ZeroTickInterval);
        }
        Ok(())
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            session_duration_secs: DEFAULT_SESSION_SECS,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Orders the last events of one session.
///
/// The timer publishes `game_timer` only while the gate is open; the
/// ending closes it and publishes `game_over` in the same critical
/// section, so nothing for the session follows `game_over`. The
/// registry lock is never held while emitting.
#[derive(Debug, Default)]
pub(crate) struct EmitGate {
    closed: StdMutex<bool>,
}

impl EmitGate {
    /// Run `emit` unless the gate is closed. Returns whether it ran.
    pub(crate) fn emit_open(&self, emit: impl FnOnce()) -> bool {
        let closed = match self.closed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *closed {
            return false;
        }
        emit();
        true
    }

    /// Close the gate with `emit` as its last emission.
    pub(crate) fn close_with(&self, emit: impl FnOnce()) {
        let mut closed = match self.closed.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *closed = true;
        emit();
    }
}

/// A session plus what its timer needs to stop.
#[derive(Debug)]
struct SessionEntry {
    session: Session,
    cancel: CancellationToken,
    gate: Arc<EmitGate>,
}

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Decremented; carries the new `time_remaining`.
    Remaining(i64),

    /// Session missing or no longer active; the timer must exit quietly.
    Stopped,
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    store: Arc<dyn SessionStore>,
    sink: Arc<dyn EventSink>,
    config: RegistryConfig,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn SessionStore>,
        sink: Arc<dyn EventSink>,
        config: RegistryConfig,
    ) -> Result<Arc<Self>, RegistryConfigError> {
        config.validate()?;

        Ok(Arc::new(SessionRegistry {
            sessions: Mutex::new(HashMap::new()),
            store,
            sink,
            config,
        }))
    }

    /// Create an `Active` session for `puzzle_id` and start its timer.
    ///
    /// Returns as soon as the timer task is spawned. Must be called from
    /// within a tokio runtime.
    pub async fn create_session(self: &Arc<Self>, puzzle_id: PuzzleId) -> SessionId {
        let cancel = CancellationToken::new();
        let gate = Arc::new(EmitGate::default());

        let id = {
            let mut sessions = self.sessions.lock().await;

            let mut id = SessionId::generate();
            while sessions.contains_key(&id) {
                id = SessionId::generate();
            }

            let session = Session::new(id.clone(), puzzle_id, self.config.session_duration_secs);
            sessions.insert(
                id.clone(),
                SessionEntry {
                    session,
                    cancel: cancel.clone(),
                    gate: Arc::clone(&gate),
                },
            );
            id
        };

        if let Err(e) = self.store.persist_session_stub(&id, puzzle_id) {
            warn!(game_id = %id, error = %e, "failed to persist session stub");
        }

        info!(
            game_id = %id,
            puzzle_id = %puzzle_id,
            duration_secs = self.config.session_duration_secs,
            "game session created"
        );

        tokio::spawn(timer::run_session_timer(Arc::clone(self), id.clone(), cancel, gate));

        id
    }

    /// Append `username` to the session roster.
    ///
    /// Rejoining appends again; the roster is a history, not a set.
    pub async fn join_session(&self, id: &SessionId, username: &str) -> Result<(), SessionError> {
        {
            let mut sessions = self.sessions.lock().await;
            let entry = sessions
                .get_mut(id)
                .ok_or_else(|| SessionError::NotFound(id.clone()))?;
            entry.session.players.push(username.to_string());
        }

        if let Err(e) = self.store.persist_player_join(id, username) {
            warn!(game_id = %id, username, error = %e, "failed to persist player join");
        }

        debug!(game_id = %id, username, "player added to roster");
        Ok(())
    }

    /// End an active session before its countdown runs out.
    ///
    /// The timer is cancelled and never emits again. Ending a session
    /// that is already `Completed` is a no-op.
    pub async fn end_session(&self, id: &SessionId) -> Result<(), SessionError> {
        {
            let sessions = self.sessions.lock().await;
            if !sessions.contains_key(id) {
                return Err(SessionError::NotFound(id.clone()));
            }
        }

        self.finish(id, EndReason::Ended).await;
        Ok(())
    }

    /// Snapshot of one session.
    pub async fn get(&self, id: &SessionId) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.get(id).map(|entry| entry.session.clone())
    }

    /// Snapshots of all `Active` sessions, ordered by id.
    pub async fn active_sessions(&self) -> Vec<Session> {
        let sessions = self.sessions.lock().await;
        let mut active: Vec<Session> = sessions
            .values()
            .filter(|entry| entry.session.is_active())
            .map(|entry| entry.session.clone())
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        active
    }

    /// Number of sessions created so far, active or not.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Stop every running timer. Session state is left as is.
    pub async fn shutdown(&self) {
        let sessions = self.sessions.lock().await;
        for entry in sessions.values() {
            entry.cancel.cancel();
        }
        info!(sessions = sessions.len(), "session timers stopped");
    }

    // -------------------------------------------------------------------------
    // Timer support
    // -------------------------------------------------------------------------

    pub(crate) fn tick_interval(&self) -> Duration {
        self.config.tick_interval
    }

    pub(crate) fn publish(&self, room: RoomKey, event: ServerEvent) {
        self.sink.publish(room, event);
    }

    /// Decrement one session's countdown under the registry lock.
    pub(crate) async fn tick(&self, id: &SessionId) -> Tick {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(entry) if entry.session.is_active() => {
                entry.session.time_remaining -= 1;
                Tick::Remaining(entry.session.time_remaining)
            }
            _ => Tick::Stopped,
        }
    }

    /// Flip `Active -> Completed`, then announce and persist it.
    ///
    /// Only the caller that performs the flip emits `game_over`, so a
    /// timer racing an early end still produces exactly one, and the
    /// session's gate keeps any `game_timer` from landing after it.
    pub(crate) async fn finish(&self, id: &SessionId, reason: EndReason) -> bool {
        let gate = {
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(id) {
                Some(entry) if entry.session.is_active() => {
                    entry.session.status = SessionStatus::Completed;
                    entry.cancel.cancel();
                    Arc::clone(&entry.gate)
                }
                _ => return false,
            }
        };

        gate.close_with(|| self.publish(RoomKey::game(id), ServerEvent::session_ended(reason)));

        if let Err(e) = self.store.persist_session_status(id, SessionStatus::Completed) {
            warn!(game_id = %id, error = %e, "failed to persist session status");
        }

        info!(game_id = %id, ?reason, "game session completed");
        true
    }
}
