//! User directory backed by the users table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use courier_database::{CreateUserRequest, User};

use crate::types::{DirectoryError, DirectoryResult};

/// Directory of known users.
///
/// Lookups answer "who is this subject" for authenticated connections,
/// and the presence flags are maintained here as best-effort state.
#[derive(Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a user by internal ID
    pub async fn find_by_id(&self, id: i64) -> DirectoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, public_id, email, display_name, avatar_url, is_online,
                   last_active_at, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> DirectoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, public_id, email, display_name, avatar_url, is_online,
                   last_active_at, created_at, updated_at
            FROM users
            WHERE public_id = ?
            "#,
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Create a new user
    pub async fn create_user(&self, request: &CreateUserRequest) -> DirectoryResult<User> {
        let now = Utc::now().to_rfc3339();
        let public_id = cuid2::create_id();

        let result = sqlx::query(
            r#"
            INSERT INTO users (public_id, email, display_name, avatar_url, is_online, created_at, updated_at)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(&request.avatar_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();

        // Fetch the created user
        self.find_by_id(user_id).await?.ok_or_else(|| {
            DirectoryError::DatabaseError("Failed to retrieve created user".to_string())
        })
    }

    /// Flip a user's online flag and stamp their last activity.
    pub async fn set_online(&self, public_id: &str, online: bool) -> DirectoryResult<()> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE users SET is_online = ?, last_active_at = ?, updated_at = ? WHERE public_id = ?",
        )
        .bind(online)
        .bind(&now)
        .bind(&now)
        .bind(public_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::UserNotFound);
        }

        debug!(user = public_id, online, "updated presence");
        Ok(())
    }

    /// List every user in the directory, oldest first.
    pub async fn list_users(&self) -> DirectoryResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, public_id, email, display_name, avatar_url, is_online,
                   last_active_at, created_at, updated_at
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
