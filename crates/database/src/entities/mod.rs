//! Domain entities for the database layer

pub mod message;
pub mod room;
pub mod user;

// Re-export all entity types
pub use message::Message;
pub use room::{Room, RoomKind, RoomMember};
pub use user::{CreateUserRequest, User};
