// crates/crossword-core/tests/session_lifecycle.rs
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crossword_core::{
    EndReason, InMemorySessionStore, PuzzleId, RecordingSink, RegistryConfig, RegistryConfigError,
    RoomKey, ServerEvent, SessionError, SessionId, SessionRegistry, SessionStatus, SessionStore,
    StoreCall, StoreError,
};

struct Harness {
    registry: Arc<SessionRegistry>,
    sink: Arc<RecordingSink>,
    store: Arc<InMemorySessionStore>,
}

fn harness(duration_secs: i64) -> Harness {
    let sink = Arc::new(RecordingSink::new());
    let store = Arc::new(InMemorySessionStore::new());
    let registry = SessionRegistry::new(
        store.clone(),
        sink.clone(),
        RegistryConfig {
            session_duration_secs: duration_secs,
            tick_interval: Duration::from_secs(1),
        },
    )
    .expect("valid registry config");
    Harness {
        registry,
        sink,
        store,
    }
}

fn time_updates(events: &[ServerEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::TimeUpdate(t) => Some(t.time),
            _ => None,
        })
        .collect()
}

fn endings(events: &[ServerEvent]) -> Vec<EndReason> {
    events
        .iter()
        .filter_map(|e| match e {
            ServerEvent::SessionEnded(s) => Some(s.reason),
            _ => None,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_return_distinct_ids() {
    let h = harness(300);

    let mut handles = Vec::new();
    for n in 0..64 {
        let registry = h.registry.clone();
        handles.push(tokio::spawn(async move {
            registry.create_session(PuzzleId(n)).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.expect("create task panicked"));
    }

    assert_eq!(ids.len(), 64);
    assert_eq!(h.registry.len().await, 64);

    h.registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn new_session_starts_active_with_empty_roster() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(7)).await;

    let session = h.registry.get(&id).await.expect("session exists");
    assert_eq!(session.puzzle_id, PuzzleId(7));
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.time_remaining, 300);
    assert!(session.players.is_empty());

    assert_eq!(
        h.store.calls(),
        vec![StoreCall::SessionStub {
            id: id.clone(),
            puzzle_id: PuzzleId(7)
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn countdown_emits_one_update_per_tick_then_one_ending() {
    let h = harness(5);
    let id = h.registry.create_session(PuzzleId(1)).await;
    let room = RoomKey::game(&id);

    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let events = h.sink.events_for(&room);
    assert_eq!(time_updates(&events), vec![4, 3, 2, 1, 0]);
    assert_eq!(endings(&events), vec![EndReason::TimeUp]);
    assert!(matches!(events.last(), Some(ServerEvent::SessionEnded(_))));

    let session = h.registry.get(&id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.time_remaining, 0);

    // Nothing after the end.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.sink.events_for(&room).len(), events.len());

    let status_writes: Vec<_> = h
        .store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::SessionStatus { .. }))
        .collect();
    assert_eq!(
        status_writes,
        vec![StoreCall::SessionStatus {
            id,
            status: SessionStatus::Completed
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn no_tick_before_the_first_period() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(1)).await;

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(h.sink.events_for(&RoomKey::game(&id)).is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        h.sink.events_for(&RoomKey::game(&id)),
        vec![ServerEvent::time_update(299)]
    );
}

#[tokio::test(start_paused = true)]
async fn joined_player_shows_in_roster() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(3)).await;

    h.registry.join_session(&id, "alice").await.expect("join");
    let session = h.registry.get(&id).await.expect("session exists");
    assert!(session.has_player("alice"));

    assert!(h.store.calls().contains(&StoreCall::PlayerJoin {
        id: id.clone(),
        username: "alice".to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn rejoining_appends_again() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(3)).await;

    h.registry.join_session(&id, "alice").await.expect("join");
    h.registry.join_session(&id, "bob").await.expect("join");
    h.registry.join_session(&id, "alice").await.expect("join");

    let session = h.registry.get(&id).await.expect("session exists");
    assert_eq!(session.players, vec!["alice", "bob", "alice"]);
}

#[tokio::test(start_paused = true)]
async fn joining_unknown_session_is_not_found() {
    let h = harness(300);
    let missing = SessionId::from("no-such-game");

    let err = h
        .registry
        .join_session(&missing, "alice")
        .await
        .expect_err("join should fail");
    assert_eq!(err, SessionError::NotFound(missing));
    assert!(h.store.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn early_end_stops_the_timer_with_a_single_ending() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(9)).await;
    let room = RoomKey::game(&id);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    h.registry.end_session(&id).await.expect("end");

    tokio::time::sleep(Duration::from_secs(10)).await;

    let events = h.sink.events_for(&room);
    assert_eq!(time_updates(&events), vec![299, 298, 297]);
    assert_eq!(endings(&events), vec![EndReason::Ended]);

    let session = h.registry.get(&id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.time_remaining, 297);

    // Second end is a no-op.
    h.registry.end_session(&id).await.expect("end again");
    assert_eq!(h.sink.events_for(&room).len(), events.len());
}

#[tokio::test(start_paused = true)]
async fn ending_unknown_session_is_not_found() {
    let h = harness(300);
    let missing = SessionId::from("gone");

    assert_eq!(
        h.registry.end_session(&missing).await,
        Err(SessionError::NotFound(missing))
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_ticking_without_completing() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(2)).await;

    h.registry.shutdown().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(h.sink.events().is_empty());
    let session = h.registry.get(&id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.time_remaining, 300);
}

#[tokio::test(start_paused = true)]
async fn active_listing_skips_completed_sessions() {
    let h = harness(300);
    let a = h.registry.create_session(PuzzleId(1)).await;
    let b = h.registry.create_session(PuzzleId(2)).await;

    h.registry.end_session(&a).await.expect("end");

    let active: Vec<SessionId> = h
        .registry
        .active_sessions()
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(active, vec![b]);
    assert_eq!(h.registry.len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn full_game_runs_out_after_default_duration() {
    let h = harness(300);
    let id = h.registry.create_session(PuzzleId(7)).await;
    h.registry.join_session(&id, "alice").await.expect("join");

    tokio::time::sleep(Duration::from_secs(301)).await;

    let events = h.sink.events_for(&RoomKey::game(&id));
    let updates = time_updates(&events);
    assert_eq!(updates.len(), 300);
    assert!(updates.windows(2).all(|w| w[1] == w[0] - 1));
    assert_eq!(updates.last(), Some(&0));
    assert_eq!(endings(&events), vec![EndReason::TimeUp]);

    let session = h.registry.get(&id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.has_player("alice"));
}

// -----------------------------------------------------------------------------
// Storage failures
// -----------------------------------------------------------------------------

/// Store whose every write fails.
struct BrokenStore;

impl SessionStore for BrokenStore {
    fn persist_session_stub(&self, _id: &SessionId, _puzzle_id: PuzzleId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn persist_player_join(&self, _id: &SessionId, _username: &str) -> Result<(), StoreError> {
        Err(StoreError::Rejected("foreign key violation".to_string()))
    }

    fn persist_session_status(&self, _id: &SessionId, _status: SessionStatus) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn failing_storage_never_fails_the_game() {
    let sink = Arc::new(RecordingSink::new());
    let registry = SessionRegistry::new(
        Arc::new(BrokenStore),
        sink.clone(),
        RegistryConfig {
            session_duration_secs: 3,
            tick_interval: Duration::from_secs(1),
        },
    )
    .expect("valid registry config");

    let id = registry.create_session(PuzzleId(4)).await;
    assert_eq!(registry.len().await, 1);

    registry.join_session(&id, "alice").await.expect("join despite storage");
    let session = registry.get(&id).await.expect("session exists");
    assert_eq!(session.players, vec!["alice".to_string()]);

    tokio::time::sleep(Duration::from_millis(3_500)).await;

    let events = sink.events_for(&RoomKey::game(&id));
    assert_eq!(time_updates(&events), vec![2, 1, 0]);
    assert_eq!(endings(&events), vec![EndReason::TimeUp]);

    let session = registry.get(&id).await.expect("session exists");
    assert_eq!(session.status, SessionStatus::Completed);
}

// -----------------------------------------------------------------------------
// Configuration and racing ends
// -----------------------------------------------------------------------------

#[test]
fn registry_refuses_a_countdown_that_cannot_run() {
    let store = Arc::new(InMemorySessionStore::new());
    let sink = Arc::new(RecordingSink::new());

    let zero = SessionRegistry::new(
        store.clone(),
        sink.clone(),
        RegistryConfig {
            session_duration_secs: 0,
            ..RegistryConfig::default()
        },
    );
    assert_eq!(zero.err(), Some(RegistryConfigError::NonPositiveDuration(0)));

    let stalled = SessionRegistry::new(
        store,
        sink,
        RegistryConfig {
            tick_interval: Duration::ZERO,
            ..RegistryConfig::default()
        },
    );
    assert_eq!(stalled.err(), Some(RegistryConfigError::ZeroTickInterval));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn no_tick_lands_after_an_early_end() {
    let sink = Arc::new(RecordingSink::new());
    let registry = SessionRegistry::new(
        Arc::new(InMemorySessionStore::new()),
        sink.clone(),
        RegistryConfig {
            session_duration_secs: 1_000_000,
            tick_interval: Duration::from_micros(100),
        },
    )
    .expect("valid registry config");

    let mut ids = Vec::new();
    for n in 0..200 {
        ids.push(registry.create_session(PuzzleId(n)).await);
    }

    tokio::time::sleep(Duration::from_millis(5)).await;

    let mut handles = Vec::new();
    for id in ids.clone() {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move { registry.end_session(&id).await }));
    }
    for handle in handles {
        handle.await.expect("end task panicked").expect("end");
    }

    tokio::time::sleep(Duration::from_millis(20)).await;

    for id in &ids {
        let events = sink.events_for(&RoomKey::game(id));
        assert_eq!(endings(&events), vec![EndReason::Ended], "game {}", id);
        assert!(
            matches!(events.last(), Some(ServerEvent::SessionEnded(_))),
            "game {} ticked after ending",
            id
        );
    }
}
