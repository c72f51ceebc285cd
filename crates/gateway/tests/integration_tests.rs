//! Integration tests for the gateway core with a real database.
//!
//! Sessions are attached directly to the registry, so every delivery
//! assertion reads the same queues a live WebSocket writer would drain.

use courier_config::{AppConfig, AuthConfig, DatabaseConfig, HttpConfig, MediaConfig};
use courier_database::{CreateUserRequest, User};
use courier_gateway::auth::authenticate;
use courier_gateway::{GatewayError, GatewayState, ServerEvent, SessionHandle};
use courier_rooms::CreateRoomRequest;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

async fn setup() -> (GatewayState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("gateway_test.db");

    let config = AppConfig {
        http: HttpConfig::default(),
        database: DatabaseConfig {
            url: format!("sqlite:{}", db_path.display()),
            max_connections: 5,
        },
        auth: AuthConfig::default(),
        media: MediaConfig {
            upload_dir: temp_dir.path().join("uploads").display().to_string(),
            public_base_path: "/uploads".to_string(),
        },
    };

    let state = GatewayState::from_config(&config)
        .await
        .expect("Failed to build gateway state");
    (state, temp_dir)
}

async fn seed_user(state: &GatewayState, name: &str, email: &str) -> User {
    state
        .directory
        .create_user(&CreateUserRequest {
            email: Some(email.to_string()),
            display_name: Some(name.to_string()),
            avatar_url: None,
        })
        .await
        .unwrap()
}

/// Create a room and return its public ID and row ID.
async fn seed_room(state: &GatewayState, creator: &User, member_ids: Vec<&str>) -> (String, i64) {
    let view = state
        .rooms
        .create_room(
            creator.id,
            &CreateRoomRequest {
                name: "R1".to_string(),
                kind: None,
                member_ids: member_ids.into_iter().map(String::from).collect(),
            },
        )
        .await
        .unwrap();
    let row = state.rooms.find_room(&view.id).await.unwrap().unwrap();
    (view.id, row.id)
}

/// Register a session for a user the way the connection handler would.
async fn attach(
    state: &GatewayState,
    user_id: &str,
    session_id: &str,
) -> mpsc::UnboundedReceiver<ServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .registry
        .register(SessionHandle::new(
            session_id.to_string(),
            user_id.to_string(),
            tx,
        ))
        .await;
    state.index.hydrate(session_id, user_id).await;
    rx
}

fn next_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    rx.try_recv().expect("expected a queued event")
}

fn assert_no_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) {
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

fn message_text(event: ServerEvent) -> String {
    match event {
        ServerEvent::NewMessage { message } => message.text,
        other => panic!("expected new-message, got {:?}", other),
    }
}

async fn message_count(state: &GatewayState) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
        .fetch_one(&state.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_broadcast_reaches_only_live_members() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let carol = seed_user(&state, "Carol", "carol@example.com").await;

    // Alice and Bob are members; only Alice and non-member Carol are live
    let (_, room_row_id) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let mut alice_rx = attach(&state, &alice.public_id, "s_alice").await;
    let mut carol_rx = attach(&state, &carol.public_id, "s_carol").await;

    let event = ServerEvent::Error {
        kind: "internal".to_string(),
        message: "probe".to_string(),
    };
    state.broadcast.broadcast(room_row_id, &event).await;

    // Alice receives it; Bob has no session and is skipped silently;
    // Carol is live but not a member and sees nothing.
    assert!(matches!(
        next_event(&mut alice_rx),
        ServerEvent::Error { .. }
    ));
    assert_no_event(&mut alice_rx);
    assert_no_event(&mut carol_rx);
}

#[tokio::test]
async fn test_broadcast_except_skips_the_excluded_user() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (room_id, room_row_id) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let mut alice_rx = attach(&state, &alice.public_id, "s_alice").await;
    let mut bob_rx = attach(&state, &bob.public_id, "s_bob").await;

    let event = ServerEvent::UserTyping {
        room_id,
        user_id: alice.public_id.clone(),
        is_typing: true,
    };
    state
        .broadcast
        .broadcast_except(room_row_id, &alice.public_id, &event)
        .await;

    assert!(matches!(
        next_event(&mut bob_rx),
        ServerEvent::UserTyping { is_typing: true, .. }
    ));
    assert_no_event(&mut alice_rx);
}

#[tokio::test]
async fn test_broadcast_evicts_closed_transports() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (_, room_row_id) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let mut alice_rx = attach(&state, &alice.public_id, "s_alice").await;
    let bob_rx = attach(&state, &bob.public_id, "s_bob").await;
    drop(bob_rx);

    let event = ServerEvent::Error {
        kind: "internal".to_string(),
        message: "probe".to_string(),
    };
    state.broadcast.broadcast(room_row_id, &event).await;

    // The dead transport is removed from the registry; delivery to the
    // healthy member is unaffected.
    assert!(state.registry.resolve(&bob.public_id).await.is_none());
    assert!(state.registry.resolve(&alice.public_id).await.is_some());
    assert!(matches!(
        next_event(&mut alice_rx),
        ServerEvent::Error { .. }
    ));
}

#[tokio::test]
async fn test_submit_fans_out_to_members_in_order() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (room_id, _) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let mut alice_rx = attach(&state, &alice.public_id, "s_alice").await;
    let mut bob_rx = attach(&state, &bob.public_id, "s_bob").await;

    let first = state
        .pipeline
        .submit(&alice.public_id, &room_id, Some("first"), None)
        .await
        .unwrap();
    let second = state
        .pipeline
        .submit(&alice.public_id, &room_id, Some("second"), None)
        .await
        .unwrap();

    assert_eq!(first.author.id, alice.public_id);
    assert_eq!(second.room_id, room_id);

    // Both members observe the messages in submission order, the author
    // included.
    assert_eq!(message_text(next_event(&mut bob_rx)), "first");
    assert_eq!(message_text(next_event(&mut bob_rx)), "second");
    assert_eq!(message_text(next_event(&mut alice_rx)), "first");
    assert_eq!(message_text(next_event(&mut alice_rx)), "second");
}

#[tokio::test]
async fn test_submit_sees_membership_added_between_messages() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (room_id, room_row_id) = seed_room(&state, &alice, vec![]).await;

    let mut bob_rx = attach(&state, &bob.public_id, "s_bob").await;

    state
        .pipeline
        .submit(&alice.public_id, &room_id, Some("before"), None)
        .await
        .unwrap();
    assert_no_event(&mut bob_rx);

    sqlx::query("INSERT INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)")
        .bind(room_row_id)
        .bind(bob.id)
        .bind("2024-01-01T00:00:00+00:00")
        .execute(&state.pool)
        .await
        .unwrap();

    state
        .pipeline
        .submit(&alice.public_id, &room_id, Some("after"), None)
        .await
        .unwrap();

    // Membership was re-read for the second fan-out
    assert_eq!(message_text(next_event(&mut bob_rx)), "after");
}

#[tokio::test]
async fn test_submit_rejects_blank_text() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let (room_id, _) = seed_room(&state, &alice, vec![]).await;

    let result = state
        .pipeline
        .submit(&alice.public_id, &room_id, Some("   "), None)
        .await;

    assert!(matches!(result, Err(GatewayError::Validation(_))));
    assert_eq!(message_count(&state).await, 0);
}

#[tokio::test]
async fn test_submit_rejects_unknown_room() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;

    let result = state
        .pipeline
        .submit(&alice.public_id, "rm_missing", Some("hello"), None)
        .await;

    assert!(matches!(result, Err(GatewayError::NotFound(_))));
}

#[tokio::test]
async fn test_submit_storage_failure_leaves_no_row_and_no_broadcast() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (room_id, _) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let mut bob_rx = attach(&state, &bob.public_id, "s_bob").await;

    let result = state
        .pipeline
        .submit(
            &alice.public_id,
            &room_id,
            None,
            Some("data:image/png;base64,not-base64!!!"),
        )
        .await;

    assert!(matches!(result, Err(GatewayError::Storage(_))));
    assert_eq!(message_count(&state).await, 0);
    assert_no_event(&mut bob_rx);
}

#[tokio::test]
async fn test_submit_stores_image_before_persisting() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (room_id, _) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let mut bob_rx = attach(&state, &bob.public_id, "s_bob").await;

    let message = state
        .pipeline
        .submit(
            &alice.public_id,
            &room_id,
            None,
            Some("data:image/png;base64,aGVsbG8="),
        )
        .await
        .unwrap();

    let image_url = message.image_url.clone().unwrap();
    assert!(image_url.starts_with("/uploads/"));
    assert_eq!(message.text, "Image");

    match next_event(&mut bob_rx) {
        ServerEvent::NewMessage { message: received } => {
            assert_eq!(received.image_url.as_deref(), Some(image_url.as_str()));
        }
        other => panic!("expected new-message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_refreshes_room_summary() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let (room_id, _) = seed_room(&state, &alice, vec![]).await;

    state
        .pipeline
        .submit(&alice.public_id, &room_id, Some("latest news"), None)
        .await
        .unwrap();

    let room = state.rooms.get_room(&room_id).await.unwrap();
    assert_eq!(room.last_message.as_deref(), Some("latest news"));
    assert!(room.last_message_at.is_some());
}

#[tokio::test]
async fn test_authenticate_enriches_identity_from_directory() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;

    let token = state.verifier.generate_token(&alice.public_id).unwrap();
    let identity = authenticate(&state.verifier, &state.directory, &token)
        .await
        .unwrap();

    assert_eq!(identity.user_id, alice.public_id);
    assert_eq!(identity.display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn test_authenticate_rejects_garbage_token() {
    let (state, _temp_dir) = setup().await;

    let result = authenticate(&state.verifier, &state.directory, "not.a.token").await;
    let err = result.unwrap_err();

    assert!(matches!(err, GatewayError::InvalidCredentials(_)));
    assert_eq!(err.kind(), "invalid");
}

#[tokio::test]
async fn test_authenticate_rejects_unknown_subject() {
    let (state, _temp_dir) = setup().await;

    // Well-formed token, but the directory has never heard of the subject
    let token = state.verifier.generate_token("usr_ghost").unwrap();
    let result = authenticate(&state.verifier, &state.directory, &token).await;
    let err = result.unwrap_err();

    assert!(matches!(err, GatewayError::UnknownSubject(_)));
    assert_eq!(err.kind(), "unknown-subject");
}

#[tokio::test]
async fn test_hydrate_seeds_room_subscriptions() {
    let (state, _temp_dir) = setup().await;
    let alice = seed_user(&state, "Alice", "alice@example.com").await;
    let bob = seed_user(&state, "Bob", "bob@example.com").await;
    let (_, room_row_id) = seed_room(&state, &alice, vec![bob.public_id.as_str()]).await;

    let _rx = attach(&state, &bob.public_id, "s_bob").await;

    let subscriptions = state.index.subscriptions_of("s_bob").await;
    assert!(subscriptions.contains(&room_row_id));
}
