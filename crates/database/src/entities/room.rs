//! Room entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Room row; membership lives in `room_members`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub public_id: String,
    pub name: String,
    pub kind: RoomKind,
    pub created_by: i64,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Membership record binding a user to a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoomMember {
    pub room_id: i64,
    pub user_id: i64,
    pub joined_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Direct,
    Group,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Direct => "direct",
            RoomKind::Group => "group",
        }
    }
}

impl From<&str> for RoomKind {
    fn from(s: &str) -> Self {
        match s {
            "group" => RoomKind::Group,
            _ => RoomKind::Direct,
        }
    }
}

impl ToString for RoomKind {
    fn to_string(&self) -> String {
        self.as_str().to_string()
    }
}
