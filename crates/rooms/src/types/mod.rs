//! Shared types for the room store.

pub mod errors;
pub mod requests;
pub mod responses;

// Re-export common types
pub use errors::{StoreError, StoreResult};
pub use requests::{CreateRoomRequest, MessagePage};
pub use responses::{AuthorView, MessageView, RoomView};
