//! Response types for the room store.
//!
//! These are the shapes the gateway puts on the wire, so they serialize
//! with camelCase fields and carry public IDs only.

use serde::{Deserialize, Serialize};

use courier_database::RoomKind;

/// Author fields resolved onto an outgoing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A message with its author fields resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub room_id: String,
    pub author: AuthorView,
    pub text: String,
    pub image_url: Option<String>,
    pub created_at: String,
}

/// A room with its membership resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub kind: RoomKind,
    pub member_ids: Vec<String>,
    pub created_by: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
}
