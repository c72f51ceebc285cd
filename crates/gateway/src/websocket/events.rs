//! Wire events exchanged over the WebSocket.
//!
//! Both directions use an internally tagged JSON envelope: the `type`
//! field names the event in kebab-case and the remaining fields ride
//! alongside it in camelCase.

use serde::{Deserialize, Serialize};

use courier_database::User;
use courier_rooms::{CreateRoomRequest, MessagePage, MessageView, RoomView};

/// Events a client may send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Credential fallback for clients that cannot set upgrade headers.
    /// Only honored as the first event of an unauthenticated connection.
    Authenticate { token: Option<String> },
    JoinRoom {
        room_id: String,
    },
    LeaveRoom {
        room_id: String,
    },
    CreateRoom(CreateRoomRequest),
    SendMessage {
        room_id: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        image_uri: Option<String>,
    },
    Typing {
        room_id: String,
        is_typing: bool,
    },
    FetchMessages {
        room_id: String,
        #[serde(flatten)]
        page: MessagePage,
    },
    FetchRoom {
        room_id: String,
    },
    FetchRooms,
    FetchUsers,
    FetchCurrentUser,
}

/// Events the gateway sends to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First event of an authenticated session.
    Hello { user: UserView },
    NewMessage {
        message: MessageView,
    },
    UserTyping {
        room_id: String,
        user_id: String,
        is_typing: bool,
    },
    RoomCreated {
        room: RoomView,
    },
    Messages {
        room_id: String,
        messages: Vec<MessageView>,
    },
    Room {
        room: RoomView,
    },
    Rooms {
        rooms: Vec<RoomView>,
    },
    Users {
        users: Vec<UserView>,
    },
    CurrentUser {
        user: UserView,
    },
    /// Connection-level failure. During the handshake this is the last
    /// event before the close frame.
    Error { kind: String, message: String },
    /// A message submission was rejected; the connection stays up.
    MessageError { detail: String },
}

/// User profile as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_online: bool,
    pub last_active_at: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.public_id,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            is_online: user.is_online,
            last_active_at: user.last_active_at,
        }
    }
}
