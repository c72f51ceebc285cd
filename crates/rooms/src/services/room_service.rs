//! Room store operations.

use chrono::Utc;
use sqlx::SqlitePool;

use courier_database::{Room, RoomKind};

use crate::types::{CreateRoomRequest, RoomView, StoreError, StoreResult};

/// Store-backed room operations.
///
/// The membership rows written here are authoritative; the gateway's
/// in-memory index only mirrors them between refreshes.
#[derive(Clone)]
pub struct RoomService {
    pool: SqlitePool,
}

impl RoomService {
    /// Create a new room service instance
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a room and enroll its initial members.
    ///
    /// The creator is enrolled whether or not the request lists them.
    pub async fn create_room(
        &self,
        creator_id: i64,
        request: &CreateRoomRequest,
    ) -> StoreResult<RoomView> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("Room name must not be empty"));
        }

        // Resolve member public IDs before touching the rooms table
        let mut member_ids = vec![creator_id];
        for public_id in &request.member_ids {
            let id = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE public_id = ?")
                .bind(public_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| StoreError::user_not_found(public_id))?;
            if !member_ids.contains(&id) {
                member_ids.push(id);
            }
        }

        let kind = request.kind.clone().unwrap_or(if member_ids.len() == 2 {
            RoomKind::Direct
        } else {
            RoomKind::Group
        });

        let now = Utc::now().to_rfc3339();
        let public_id = cuid2::create_id();

        let room_id = sqlx::query(
            r#"
            INSERT INTO rooms (public_id, name, kind, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(name)
        .bind(kind.as_str())
        .bind(creator_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        for user_id in &member_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO room_members (room_id, user_id, joined_at) VALUES (?, ?, ?)",
            )
            .bind(room_id)
            .bind(user_id)
            .bind(&now)
            .execute(&self.pool)
            .await?;
        }

        self.get_room(&public_id).await
    }

    /// Fetch a room by public ID, with membership resolved
    pub async fn get_room(&self, public_id: &str) -> StoreResult<RoomView> {
        let room = self
            .find_room(public_id)
            .await?
            .ok_or_else(|| StoreError::room_not_found(public_id))?;
        self.view_of(&room).await
    }

    /// Fetch the raw room row by public ID
    pub async fn find_room(&self, public_id: &str) -> StoreResult<Option<Room>> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            SELECT id, public_id, name, kind, created_by, last_message, last_message_at,
                   created_at, updated_at
            FROM rooms
            WHERE public_id = ?
            "#,
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(room)
    }

    /// Rooms the user belongs to, most recently active first
    pub async fn rooms_for_user(&self, user_id: i64) -> StoreResult<Vec<RoomView>> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT r.id, r.public_id, r.name, r.kind, r.created_by, r.last_message,
                   r.last_message_at, r.created_at, r.updated_at
            FROM rooms r
            JOIN room_members rm ON rm.room_id = r.id
            WHERE rm.user_id = ?
            ORDER BY COALESCE(r.last_message_at, r.created_at) DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut views = Vec::with_capacity(rooms.len());
        for room in &rooms {
            views.push(self.view_of(room).await?);
        }
        Ok(views)
    }

    /// Room IDs a subject belongs to. Used to hydrate a fresh session.
    pub async fn room_ids_for_subject(&self, public_id: &str) -> StoreResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT rm.room_id
            FROM room_members rm
            JOIN users u ON u.id = rm.user_id
            WHERE u.public_id = ?
            ORDER BY rm.room_id
            "#,
        )
        .bind(public_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Member public IDs of a room, straight from the membership table.
    ///
    /// Broadcast reads this per fan-out so that a membership change landing
    /// between two messages takes effect on the next one.
    pub async fn member_public_ids(&self, room_id: i64) -> StoreResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT u.public_id
            FROM room_members rm
            JOIN users u ON u.id = rm.user_id
            WHERE rm.room_id = ?
            ORDER BY rm.user_id
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn view_of(&self, room: &Room) -> StoreResult<RoomView> {
        let member_ids = self.member_public_ids(room.id).await?;

        let created_by = sqlx::query_scalar::<_, String>("SELECT public_id FROM users WHERE id = ?")
            .bind(room.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(RoomView {
            id: room.public_id.clone(),
            name: room.name.clone(),
            kind: room.kind.clone(),
            member_ids,
            created_by,
            last_message: room.last_message.clone(),
            last_message_at: room.last_message_at.clone(),
            created_at: room.created_at.clone(),
        })
    }
}
