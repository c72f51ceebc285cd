//! Request types for the room store.

use serde::{Deserialize, Serialize};

use courier_database::RoomKind;

/// Payload for creating a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: String,
    /// When omitted, two-member rooms come out direct, larger ones group.
    #[serde(default)]
    pub kind: Option<RoomKind>,
    /// Public IDs of the initial members. The creator is enrolled regardless.
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// Paging window for history reads, newest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub skip: i64,
}

impl Default for MessagePage {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            skip: 0,
        }
    }
}

fn default_limit() -> i64 {
    20
}
