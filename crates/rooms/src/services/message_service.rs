//! Message store operations.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::types::{AuthorView, MessagePage, MessageView, StoreError, StoreResult};

/// Flat row shape for message reads joined with author fields
#[derive(Debug, FromRow)]
struct MessageRecord {
    public_id: String,
    room_public_id: String,
    author_public_id: String,
    author_display_name: Option<String>,
    author_avatar_url: Option<String>,
    text: String,
    image_url: Option<String>,
    created_at: String,
}

impl From<MessageRecord> for MessageView {
    fn from(row: MessageRecord) -> Self {
        MessageView {
            id: row.public_id,
            room_id: row.room_public_id,
            author: AuthorView {
                id: row.author_public_id,
                display_name: row.author_display_name,
                avatar_url: row.author_avatar_url,
            },
            text: row.text,
            image_url: row.image_url,
            created_at: row.created_at,
        }
    }
}

const MESSAGE_SELECT: &str = r#"
SELECT m.public_id,
       r.public_id AS room_public_id,
       u.public_id AS author_public_id,
       u.display_name AS author_display_name,
       u.avatar_url AS author_avatar_url,
       m.text,
       m.image_url,
       m.created_at
FROM messages m
JOIN rooms r ON r.id = m.room_id
JOIN users u ON u.id = m.user_id
"#;

/// Largest history page a single fetch may ask for
const MAX_PAGE_SIZE: i64 = 100;

/// Store-backed message operations
#[derive(Clone)]
pub struct MessageService {
    pool: SqlitePool,
}

impl MessageService {
    /// Create a new message service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a message and return it with author fields resolved
    pub async fn create_message(
        &self,
        room_id: i64,
        author_id: i64,
        text: &str,
        image_url: Option<&str>,
    ) -> StoreResult<MessageView> {
        let now = Utc::now().to_rfc3339();
        let public_id = cuid2::create_id();

        let message_id = sqlx::query(
            r#"
            INSERT INTO messages (public_id, room_id, user_id, text, image_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(room_id)
        .bind(author_id)
        .bind(text)
        .bind(image_url)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        // Fetch the created message
        let query = format!("{} WHERE m.id = ?", MESSAGE_SELECT);
        let row = sqlx::query_as::<_, MessageRecord>(&query)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::internal("Failed to fetch created message"))?;

        Ok(row.into())
    }

    /// Read a page of a room's history, newest first
    pub async fn list_messages(&self, room_id: i64, page: MessagePage) -> StoreResult<Vec<MessageView>> {
        let limit = page.limit.clamp(1, MAX_PAGE_SIZE);
        let skip = page.skip.max(0);

        let query = format!(
            "{} WHERE m.room_id = ? ORDER BY m.created_at DESC, m.id DESC LIMIT ? OFFSET ?",
            MESSAGE_SELECT
        );
        let rows = sqlx::query_as::<_, MessageRecord>(&query)
            .bind(room_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(MessageView::from).collect())
    }

    /// Fetch a single message by public ID
    pub async fn find_message(&self, public_id: &str) -> StoreResult<Option<MessageView>> {
        let query = format!("{} WHERE m.public_id = ?", MESSAGE_SELECT);
        let row = sqlx::query_as::<_, MessageRecord>(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MessageView::from))
    }

    /// Refresh a room's denormalized last-message fields
    pub async fn update_room_summary(
        &self,
        room_id: i64,
        summary: &str,
        at: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE rooms SET last_message = ?, last_message_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(summary)
        .bind(at)
        .bind(at)
        .bind(room_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
