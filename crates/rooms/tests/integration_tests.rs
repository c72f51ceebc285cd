//! Integration tests for the rooms crate with a real database

use courier_config::{DatabaseConfig, MediaConfig};
use courier_database::{initialize_database, RoomKind};
use courier_rooms::{
    CreateRoomRequest, MediaStore, MessagePage, MessageService, RoomService, StoreError,
};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Helper function to create a migrated test database
async fn create_test_database() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_rooms.db");

    let config = DatabaseConfig {
        url: format!("sqlite:{}", db_path.display()),
        max_connections: 5,
    };

    let pool = initialize_database(&config)
        .await
        .expect("Failed to create test database");

    (pool, temp_dir)
}

/// Insert a user row directly and return its internal ID
async fn seed_user(pool: &SqlitePool, public_id: &str, display_name: &str) -> i64 {
    sqlx::query(
        r#"
        INSERT INTO users (public_id, display_name, created_at, updated_at)
        VALUES (?, ?, '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')
        "#,
    )
    .bind(public_id)
    .bind(display_name)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

fn room_request(name: &str, member_ids: Vec<&str>) -> CreateRoomRequest {
    CreateRoomRequest {
        name: name.to_string(),
        kind: None,
        member_ids: member_ids.into_iter().map(String::from).collect(),
    }
}

#[tokio::test]
async fn test_create_room_enrolls_members() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;
    seed_user(&pool, "usr_bob", "Bob").await;

    let room = rooms
        .create_room(alice, &room_request("R1", vec!["usr_bob"]))
        .await
        .unwrap();

    assert_eq!(room.name, "R1");
    assert_eq!(room.kind, RoomKind::Direct);
    assert_eq!(room.created_by, "usr_alice");
    assert_eq!(room.member_ids, vec!["usr_alice", "usr_bob"]);
    assert!(room.last_message.is_none());
}

#[tokio::test]
async fn test_create_room_kind_defaults_by_size() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;
    seed_user(&pool, "usr_bob", "Bob").await;
    seed_user(&pool, "usr_carol", "Carol").await;

    let direct = rooms
        .create_room(alice, &room_request("Pair", vec!["usr_bob"]))
        .await
        .unwrap();
    assert_eq!(direct.kind, RoomKind::Direct);

    let group = rooms
        .create_room(alice, &room_request("Trio", vec!["usr_bob", "usr_carol"]))
        .await
        .unwrap();
    assert_eq!(group.kind, RoomKind::Group);

    // An explicit kind wins over the size heuristic
    let mut request = room_request("Pair as group", vec!["usr_bob"]);
    request.kind = Some(RoomKind::Group);
    let forced = rooms.create_room(alice, &request).await.unwrap();
    assert_eq!(forced.kind, RoomKind::Group);
}

#[tokio::test]
async fn test_create_room_rejects_unknown_member() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;

    let result = rooms
        .create_room(alice, &room_request("R1", vec!["usr_ghost"]))
        .await;
    assert!(matches!(result, Err(StoreError::UserNotFound { .. })));

    // Nothing was half-created
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rooms")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}

#[tokio::test]
async fn test_create_room_rejects_blank_name() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;

    let result = rooms.create_room(alice, &room_request("   ", vec![])).await;
    assert!(matches!(result, Err(StoreError::Validation { .. })));
}

#[tokio::test]
async fn test_message_create_resolves_author() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());
    let messages = MessageService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;
    seed_user(&pool, "usr_bob", "Bob").await;
    let room = rooms
        .create_room(alice, &room_request("R1", vec!["usr_bob"]))
        .await
        .unwrap();
    let room_row = rooms.find_room(&room.id).await.unwrap().unwrap();

    let message = messages
        .create_message(room_row.id, alice, "hi", None)
        .await
        .unwrap();

    assert!(!message.id.is_empty());
    assert_eq!(message.room_id, room.id);
    assert_eq!(message.author.id, "usr_alice");
    assert_eq!(message.author.display_name, Some("Alice".to_string()));
    assert_eq!(message.text, "hi");
    assert!(message.image_url.is_none());

    // The same view comes back by public ID
    let fetched = messages.find_message(&message.id).await.unwrap().unwrap();
    assert_eq!(fetched, message);
}

#[tokio::test]
async fn test_room_summary_update() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());
    let messages = MessageService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;
    let room = rooms
        .create_room(alice, &room_request("Notes", vec![]))
        .await
        .unwrap();
    let room_row = rooms.find_room(&room.id).await.unwrap().unwrap();

    let message = messages
        .create_message(room_row.id, alice, "latest", None)
        .await
        .unwrap();
    messages
        .update_room_summary(room_row.id, &message.text, &message.created_at)
        .await
        .unwrap();

    let refreshed = rooms.get_room(&room.id).await.unwrap();
    assert_eq!(refreshed.last_message, Some("latest".to_string()));
    assert_eq!(refreshed.last_message_at, Some(message.created_at));
}

#[tokio::test]
async fn test_list_messages_pages_newest_first() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());
    let messages = MessageService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;
    let room = rooms
        .create_room(alice, &room_request("Feed", vec![]))
        .await
        .unwrap();
    let room_row = rooms.find_room(&room.id).await.unwrap().unwrap();

    for i in 0..5 {
        messages
            .create_message(room_row.id, alice, &format!("m{}", i), None)
            .await
            .unwrap();
    }

    let first_page = messages
        .list_messages(room_row.id, MessagePage { limit: 2, skip: 0 })
        .await
        .unwrap();
    assert_eq!(first_page.len(), 2);
    assert_eq!(first_page[0].text, "m4");
    assert_eq!(first_page[1].text, "m3");

    let second_page = messages
        .list_messages(room_row.id, MessagePage { limit: 2, skip: 2 })
        .await
        .unwrap();
    assert_eq!(second_page[0].text, "m2");
    assert_eq!(second_page[1].text, "m1");

    let default_page = messages
        .list_messages(room_row.id, MessagePage::default())
        .await
        .unwrap();
    assert_eq!(default_page.len(), 5);
}

#[tokio::test]
async fn test_membership_queries() {
    let (pool, _temp_dir) = create_test_database().await;
    let rooms = RoomService::new(pool.clone());

    let alice = seed_user(&pool, "usr_alice", "Alice").await;
    seed_user(&pool, "usr_bob", "Bob").await;
    seed_user(&pool, "usr_carol", "Carol").await;

    let room = rooms
        .create_room(alice, &room_request("R1", vec!["usr_bob"]))
        .await
        .unwrap();
    let room_row = rooms.find_room(&room.id).await.unwrap().unwrap();

    let members = rooms.member_public_ids(room_row.id).await.unwrap();
    assert_eq!(members, vec!["usr_alice", "usr_bob"]);

    let alice_rooms = rooms.room_ids_for_subject("usr_alice").await.unwrap();
    assert_eq!(alice_rooms, vec![room_row.id]);

    // Carol is not a member and hydrates to nothing
    let carol_rooms = rooms.room_ids_for_subject("usr_carol").await.unwrap();
    assert!(carol_rooms.is_empty());
}

#[tokio::test]
async fn test_media_store_data_uri() {
    let temp_dir = TempDir::new().unwrap();
    let config = MediaConfig {
        upload_dir: temp_dir.path().join("uploads").display().to_string(),
        public_base_path: "/uploads".to_string(),
    };
    let media = MediaStore::new(&config);

    let url = media
        .store("data:image/png;base64,aGVsbG8gd29ybGQ=", 1)
        .await
        .unwrap();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));

    let filename = url.strip_prefix("/uploads/").unwrap();
    let stored = std::fs::read(temp_dir.path().join("uploads").join(filename)).unwrap();
    assert_eq!(stored, b"hello world");
}

#[tokio::test]
async fn test_media_store_passthrough_and_rejects() {
    let temp_dir = TempDir::new().unwrap();
    let config = MediaConfig {
        upload_dir: temp_dir.path().join("uploads").display().to_string(),
        public_base_path: "/uploads".to_string(),
    };
    let media = MediaStore::new(&config);

    let url = media
        .store("https://cdn.example.com/cat.png", 1)
        .await
        .unwrap();
    assert_eq!(url, "https://cdn.example.com/cat.png");

    let result = media.store("not an image at all", 1).await;
    assert!(matches!(result, Err(StoreError::Storage { .. })));

    let result = media.store("data:image/png;base64,@@@", 1).await;
    assert!(matches!(result, Err(StoreError::Storage { .. })));
}
