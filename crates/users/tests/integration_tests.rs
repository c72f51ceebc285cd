//! Integration tests for the users crate with a real database

use courier_config::DatabaseConfig;
use courier_database::{initialize_database, CreateUserRequest};
use courier_users::{DirectoryError, UserDirectory};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Helper function to create a migrated test database
async fn create_test_database() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_users.db");

    let config = DatabaseConfig {
        url: format!("sqlite:{}", db_path.display()),
        max_connections: 5,
    };

    let pool = initialize_database(&config)
        .await
        .expect("Failed to create test database");

    (pool, temp_dir)
}

fn create_test_user_request() -> CreateUserRequest {
    CreateUserRequest {
        email: Some("test@example.com".to_string()),
        display_name: Some("Test User".to_string()),
        avatar_url: Some("https://example.com/avatar.jpg".to_string()),
    }
}

#[tokio::test]
async fn test_user_lifecycle_integration() {
    let (pool, _temp_dir) = create_test_database().await;
    let directory = UserDirectory::new(pool);

    // Create
    let created = directory
        .create_user(&create_test_user_request())
        .await
        .unwrap();
    assert!(created.id > 0);
    assert!(!created.public_id.is_empty());
    assert_eq!(created.email, Some("test@example.com".to_string()));
    assert_eq!(created.display_name, Some("Test User".to_string()));
    assert!(!created.is_online);
    assert!(created.last_active_at.is_none());

    // Read by internal ID
    let by_id = directory.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.public_id, created.public_id);

    // Read by public ID
    let by_public_id = directory
        .find_by_public_id(&created.public_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_public_id.id, created.id);

    // Unknown subjects come back as None, not an error
    let missing = directory.find_by_public_id("usr_does_not_exist").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_presence_flag_round_trip_integration() {
    let (pool, _temp_dir) = create_test_database().await;
    let directory = UserDirectory::new(pool);

    let user = directory
        .create_user(&create_test_user_request())
        .await
        .unwrap();

    directory.set_online(&user.public_id, true).await.unwrap();
    let online = directory.find_by_id(user.id).await.unwrap().unwrap();
    assert!(online.is_online);
    assert!(online.last_active_at.is_some());

    directory.set_online(&user.public_id, false).await.unwrap();
    let offline = directory.find_by_id(user.id).await.unwrap().unwrap();
    assert!(!offline.is_online);

    // Going offline still counts as activity
    assert!(offline.last_active_at.is_some());
}

#[tokio::test]
async fn test_set_online_unknown_user_integration() {
    let (pool, _temp_dir) = create_test_database().await;
    let directory = UserDirectory::new(pool);

    let result = directory.set_online("usr_does_not_exist", true).await;
    assert!(matches!(result, Err(DirectoryError::UserNotFound)));
}

#[tokio::test]
async fn test_duplicate_email_rejected_integration() {
    let (pool, _temp_dir) = create_test_database().await;
    let directory = UserDirectory::new(pool);

    directory
        .create_user(&create_test_user_request())
        .await
        .unwrap();

    let result = directory.create_user(&create_test_user_request()).await;
    assert!(matches!(result, Err(DirectoryError::EmailAlreadyExists)));
}

#[tokio::test]
async fn test_list_users_integration() {
    let (pool, _temp_dir) = create_test_database().await;
    let directory = UserDirectory::new(pool);

    for i in 0..3 {
        let request = CreateUserRequest {
            email: Some(format!("user{}@example.com", i)),
            display_name: Some(format!("User {}", i)),
            avatar_url: None,
        };
        directory.create_user(&request).await.unwrap();
    }

    let users = directory.list_users().await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[0].display_name, Some("User 0".to_string()));
    assert_eq!(users[2].display_name, Some("User 2".to_string()));

    // Public IDs are unique across the directory
    let mut ids: Vec<&str> = users.iter().map(|u| u.public_id.as_str()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}
