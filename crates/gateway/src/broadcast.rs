//! Room fan-out.

use tracing::warn;

use crate::index::RoomIndex;
use crate::registry::SessionRegistry;
use crate::websocket::events::ServerEvent;

/// Delivers room-scoped events to every member with a live session.
///
/// Fan-out never reports failure to the sender: members without a live
/// session are skipped, and a member whose transport turns out to be
/// closed is logged and dropped from the registry.
#[derive(Clone)]
pub struct BroadcastEngine {
    registry: SessionRegistry,
    index: RoomIndex,
}

impl BroadcastEngine {
    pub fn new(registry: SessionRegistry, index: RoomIndex) -> Self {
        Self { registry, index }
    }

    /// Fan an event out to every current member of the room.
    pub async fn broadcast(&self, room_id: i64, event: &ServerEvent) {
        self.fan_out(room_id, None, event).await;
    }

    /// Same as [`BroadcastEngine::broadcast`], minus one user. Typing
    /// signals use this so a client never sees its own indicator echoed
    /// back.
    pub async fn broadcast_except(&self, room_id: i64, excluded_user: &str, event: &ServerEvent) {
        self.fan_out(room_id, Some(excluded_user), event).await;
    }

    async fn fan_out(&self, room_id: i64, excluded_user: Option<&str>, event: &ServerEvent) {
        // Membership is read fresh per fan-out; a member enrolled between
        // two messages receives the second one.
        let members = match self.index.members_of(room_id).await {
            Ok(members) => members,
            Err(e) => {
                warn!(room_id, error = %e, "failed to read room members, dropping broadcast");
                return;
            }
        };

        for user_id in members {
            if excluded_user == Some(user_id.as_str()) {
                continue;
            }
            let Some(handle) = self.registry.resolve(&user_id).await else {
                continue;
            };
            if !handle.send(event.clone()) {
                warn!(user = %user_id, session = %handle.session_id, "transport closed, dropping session");
                self.registry.unregister(&handle.session_id).await;
            }
        }
    }
}
