//! Session-to-room subscription index.
//!
//! Each live session carries a mirror of the rooms it participates in,
//! seeded from the store on connect and adjusted by explicit join and
//! leave events. Authoritative membership stays in the store and is
//! re-read for every fan-out, so a room or membership created between two
//! messages takes effect on the next one.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use courier_rooms::{RoomService, StoreResult};

/// Tracks which rooms each live session follows.
#[derive(Clone)]
pub struct RoomIndex {
    rooms: RoomService,
    subscriptions: Arc<RwLock<HashMap<String, HashSet<i64>>>>,
}

impl RoomIndex {
    pub fn new(rooms: RoomService) -> Self {
        Self {
            rooms,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed a session's room set from the store.
    ///
    /// Hydration is best-effort: when the store is unavailable the session
    /// starts with an empty mirror and explicit joins still work.
    pub async fn hydrate(&self, session_id: &str, user_id: &str) -> Vec<i64> {
        let rooms = match self.rooms.room_ids_for_subject(user_id).await {
            Ok(rooms) => rooms,
            Err(e) => {
                warn!(user = user_id, error = %e, "failed to hydrate room subscriptions");
                Vec::new()
            }
        };

        let mut subscriptions = self.subscriptions.write().await;
        subscriptions
            .entry(session_id.to_string())
            .or_default()
            .extend(rooms.iter().copied());
        rooms
    }

    pub async fn subscribe(&self, session_id: &str, room_id: i64) {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions
            .entry(session_id.to_string())
            .or_default()
            .insert(room_id);
    }

    /// Remove a room from a session's set. Leaving a room the session never
    /// followed is a no-op.
    pub async fn unsubscribe(&self, session_id: &str, room_id: i64) {
        let mut subscriptions = self.subscriptions.write().await;
        if let Some(rooms) = subscriptions.get_mut(session_id) {
            rooms.remove(&room_id);
        }
    }

    pub async fn subscriptions_of(&self, session_id: &str) -> HashSet<i64> {
        self.subscriptions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn remove_session(&self, session_id: &str) {
        self.subscriptions.write().await.remove(session_id);
    }

    /// Current members of a room, straight from the store.
    pub async fn members_of(&self, room_id: i64) -> StoreResult<Vec<String>> {
        self.rooms.member_public_ids(room_id).await
    }
}
