//! # Courier Rooms Crate
//!
//! Room, message, and image storage services for the Courier gateway.
//! These services are the durable side of the system: the gateway treats
//! them as the authority for room membership and message history, and
//! re-reads membership from here on every broadcast.

pub mod services;
pub mod types;

// Re-export database types
pub use courier_database::{Message, Room, RoomKind, RoomMember};

// Re-export main types for convenience
pub use services::{MediaStore, MessageService, RoomService};
pub use types::{
    AuthorView, CreateRoomRequest, MessagePage, MessageView, RoomView, StoreError, StoreResult,
};
