//! Store services for rooms, messages, and image uploads.

pub mod media_service;
pub mod message_service;
pub mod room_service;

// Re-export all services
pub use media_service::MediaStore;
pub use message_service::MessageService;
pub use room_service::RoomService;
