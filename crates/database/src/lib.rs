//! Courier Database Crate
//!
//! This crate provides database functionality for the Courier gateway,
//! including connection management, migrations, and the entity types
//! shared by the service crates.

use courier_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

// Re-export entities
pub use entities::{
    message::Message,
    room::{Room, RoomKind, RoomMember},
    user::{CreateUserRequest, User},
};

// Re-export types
pub use types::{errors::DatabaseError, DatabaseResult};

/// Re-export commonly used types for convenience
pub use sqlx::SqlitePool;

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_database() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite:{}", db_path.display());

        let config = DatabaseConfig {
            url: db_url,
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();
        (pool, temp_dir)
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (pool, _temp_dir) = create_test_database().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"users"));
        assert!(names.contains(&"rooms"));
        assert!(names.contains(&"room_members"));
        assert!(names.contains(&"messages"));
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let (pool, _temp_dir) = create_test_database().await;

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert!(result.0);
    }

    async fn seed_room_with_member(pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO users (public_id, created_at, updated_at) VALUES ('u1', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO rooms (public_id, name, kind, created_by, created_at, updated_at) VALUES ('r1', 'General', 'group', 1, '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
        )
        .execute(pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO room_members (room_id, user_id, joined_at) VALUES (1, 1, '2024-01-01T00:00:00Z')",
        )
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_entity_rows_map_from_tables() {
        let (pool, _temp_dir) = create_test_database().await;
        seed_room_with_member(&pool).await;

        sqlx::query(
            "INSERT INTO messages (public_id, room_id, user_id, text, created_at) VALUES ('m1', 1, 1, 'hi there', '2024-01-01T00:00:01Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(user.public_id, "u1");
        assert!(!user.is_online);

        let room: Room = sqlx::query_as("SELECT * FROM rooms WHERE id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(room.name, "General");
        assert_eq!(room.kind, RoomKind::Group);
        assert!(room.last_message.is_none());

        let member: RoomMember = sqlx::query_as("SELECT * FROM room_members WHERE room_id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(member.user_id, user.id);

        let message: Message = sqlx::query_as("SELECT * FROM messages WHERE public_id = 'm1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(message.text, "hi there");
        assert_eq!(message.room_id, room.id);
        assert!(message.image_url.is_none());
    }

    #[tokio::test]
    async fn test_room_member_cascade_delete() {
        let (pool, _temp_dir) = create_test_database().await;
        seed_room_with_member(&pool).await;

        sqlx::query("DELETE FROM rooms WHERE id = 1")
            .execute(&pool)
            .await
            .unwrap();

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM room_members")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining.0, 0);
    }
}
