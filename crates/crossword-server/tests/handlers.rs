use std::sync::Arc;
use std::time::Duration;

use crossword_core::{
    Authenticate, ClientEvent, CreateGame, EndReason, FriendRequest, InMemorySessionStore, JoinGame,
    LeaveGame, MakeMove, PuzzleId, RoomKey, SendMessage, ServerEvent, SessionId, SessionStatus,
    StoreCall,
};
use crossword_server::config::Config;
use crossword_server::dispatcher::EventContext;
use crossword_server::server::ServerState;
use crossword_server::types::OutboundRx;
use serde_json::json;

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn start() -> (Arc<ServerState>, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let state = ServerState::start(&Config::default(), store.clone()).unwrap();
    (state, store)
}

/// Let the delivery task catch up.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn drain(rx: &mut OutboundRx) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn authenticate(username: &str) -> ClientEvent {
    ClientEvent::Authenticate(Authenticate {
        username: username.to_string(),
    })
}

fn join(game_id: &SessionId, username: &str) -> ClientEvent {
    ClientEvent::JoinGame(JoinGame {
        game_id: game_id.clone(),
        username: username.to_string(),
    })
}

async fn create_game(state: &ServerState, ctx: &EventContext, rx: &mut OutboundRx) -> SessionId {
    state
        .handle_event(
            ctx,
            ClientEvent::CreateGame(CreateGame {
                puzzle_id: PuzzleId(7),
                username: Some("alice".to_string()),
            }),
        )
        .await;

    match rx.try_recv() {
        Ok(ServerEvent::SessionCreated(created)) => created.game_id,
        other => panic!("expected game_created reply, got {:?}", other),
    }
}

// -----------------------------------------------------------------------------
// Game flow
// -----------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn full_game_from_create_to_time_up() {
    let (state, store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;

    let game_id = create_game(&state, &alice, &mut alice_rx).await;
    state.handle_event(&alice, join(&game_id, "alice")).await;
    settle().await;

    assert_eq!(drain(&mut alice_rx), vec![ServerEvent::player_joined("alice")]);

    tokio::time::sleep(Duration::from_secs(301)).await;

    let events = drain(&mut alice_rx);
    assert_eq!(events.len(), 301);

    let ticks: Vec<i64> = events[..300]
        .iter()
        .map(|event| match event {
            ServerEvent::TimeUpdate(update) => update.time,
            other => panic!("expected game_timer, got {:?}", other),
        })
        .collect();
    let expected: Vec<i64> = (0..300).rev().collect();
    assert_eq!(ticks, expected);
    assert_eq!(events[300], ServerEvent::session_ended(EndReason::TimeUp));

    let session = state.registry().get(&game_id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.time_remaining, 0);
    assert_eq!(session.players, vec!["alice".to_string()]);

    assert_eq!(
        store.calls(),
        vec![
            StoreCall::SessionStub {
                id: game_id.clone(),
                puzzle_id: PuzzleId(7),
            },
            StoreCall::PlayerJoin {
                id: game_id.clone(),
                username: "alice".to_string(),
            },
            StoreCall::SessionStatus {
                id: game_id,
                status: SessionStatus::Completed,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn only_the_creator_hears_about_a_new_game() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;
    let (_bob, mut bob_rx) = state.connect_client().await;

    create_game(&state, &alice, &mut alice_rx).await;
    settle().await;

    assert!(drain(&mut bob_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn joining_a_missing_game_reports_back_and_broadcasts_nothing() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;
    let (bob, mut bob_rx) = state.connect_client().await;

    let missing = SessionId::from("no-such-game");
    state.handle_event(&bob, join(&missing, "bob")).await;
    state.handle_event(&alice, join(&missing, "alice")).await;
    settle().await;

    match drain(&mut alice_rx).as_slice() {
        [ServerEvent::Error(notice)] => {
            assert_eq!(notice.event, "join_game");
            assert!(notice.message.contains("no-such-game"));
        }
        other => panic!("expected a single error, got {:?}", other),
    }
    assert!(matches!(drain(&mut bob_rx).as_slice(), [ServerEvent::Error(_)]));

    // The room subscription made before the lookup is kept.
    assert_eq!(
        state.rooms().members(&RoomKey::game(&missing)).await,
        vec![alice.client_id.min(bob.client_id), alice.client_id.max(bob.client_id)]
    );
}

#[tokio::test(start_paused = true)]
async fn moves_are_relayed_verbatim_to_the_whole_room() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;
    let (bob, mut bob_rx) = state.connect_client().await;

    let game_id = create_game(&state, &alice, &mut alice_rx).await;
    state.handle_event(&alice, join(&game_id, "alice")).await;
    state.handle_event(&bob, join(&game_id, "bob")).await;
    settle().await;
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let fields = json!({ "cell": [3, 4], "letter": "Q", "anything": { "nested": true } });
    let mv = MakeMove {
        game_id: game_id.clone(),
        fields: fields.as_object().cloned().unwrap(),
    };
    state.handle_event(&bob, ClientEvent::MakeMove(mv.clone())).await;
    settle().await;

    assert_eq!(drain(&mut alice_rx), vec![ServerEvent::GameUpdate(mv.clone())]);
    assert_eq!(drain(&mut bob_rx), vec![ServerEvent::GameUpdate(mv)]);
}

#[tokio::test(start_paused = true)]
async fn leaving_stops_delivery_but_keeps_the_roster() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;
    let (bob, mut bob_rx) = state.connect_client().await;

    let game_id = create_game(&state, &alice, &mut alice_rx).await;
    state.handle_event(&alice, join(&game_id, "alice")).await;
    state.handle_event(&bob, join(&game_id, "bob")).await;
    state
        .handle_event(
            &bob,
            ClientEvent::LeaveGame(LeaveGame {
                game_id: game_id.clone(),
            }),
        )
        .await;
    settle().await;
    drain(&mut alice_rx);
    drain(&mut bob_rx);

    let mv = MakeMove {
        game_id: game_id.clone(),
        fields: Default::default(),
    };
    state.handle_event(&alice, ClientEvent::MakeMove(mv)).await;
    settle().await;

    assert_eq!(drain(&mut alice_rx).len(), 1);
    assert!(drain(&mut bob_rx).is_empty());

    let session = state.registry().get(&game_id).await.unwrap();
    assert_eq!(session.players, vec!["alice".to_string(), "bob".to_string()]);
}

// -----------------------------------------------------------------------------
// Auth and social
// -----------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn reauthentication_overwrites_and_stale_disconnect_keeps_the_new_mapping() {
    let (state, _store) = start();
    let (first, _first_rx) = state.connect_client().await;
    let (second, mut second_rx) = state.connect_client().await;
    let (carol, _carol_rx) = state.connect_client().await;

    state.handle_event(&first, authenticate("bob")).await;
    state.handle_event(&second, authenticate("bob")).await;
    assert_eq!(state.user_sessions().await.get("bob"), Some(&second.client_id));

    state.disconnect_client(&first).await;
    assert_eq!(state.user_sessions().await.get("bob"), Some(&second.client_id));

    state
        .handle_event(
            &carol,
            ClientEvent::FriendRequest(FriendRequest {
                from_user: "carol".to_string(),
                to_user: "bob".to_string(),
            }),
        )
        .await;
    settle().await;

    assert_eq!(drain(&mut second_rx), vec![ServerEvent::friend_request("carol")]);

    state.disconnect_client(&second).await;
    assert!(state.user_sessions().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn chat_reaches_the_receivers_personal_room() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;
    let (bob, mut bob_rx) = state.connect_client().await;
    state.handle_event(&bob, authenticate("bob")).await;

    state
        .handle_event(
            &alice,
            ClientEvent::SendMessage(SendMessage {
                sender: "alice".to_string(),
                receiver: "bob".to_string(),
                content: "7 down is OBOE".to_string(),
            }),
        )
        .await;
    settle().await;

    match drain(&mut bob_rx).as_slice() {
        [ServerEvent::NewMessage(msg)] => {
            assert_eq!(msg.sender, "alice");
            assert_eq!(msg.content, "7 down is OBOE");
            assert!(msg.timestamp > 0);
        }
        other => panic!("expected one new_message, got {:?}", other),
    }
    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn chat_to_an_absent_user_is_silently_dropped() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;

    state
        .handle_event(
            &alice,
            ClientEvent::SendMessage(SendMessage {
                sender: "alice".to_string(),
                receiver: "nobody".to_string(),
                content: "hello?".to_string(),
            }),
        )
        .await;
    settle().await;

    assert!(drain(&mut alice_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn disconnect_leaves_every_room() {
    let (state, _store) = start();
    let (alice, mut alice_rx) = state.connect_client().await;

    state.handle_event(&alice, authenticate("alice")).await;
    let game_id = create_game(&state, &alice, &mut alice_rx).await;
    state.handle_event(&alice, join(&game_id, "alice")).await;
    assert_eq!(state.rooms().rooms_of(alice.client_id).await.len(), 2);
    assert_eq!(state.client_count().await, 1);

    state.disconnect_client(&alice).await;

    assert!(state.rooms().rooms_of(alice.client_id).await.is_empty());
    assert_eq!(state.client_count().await, 0);
}
