//! Services for the user directory.

pub mod directory;

// Re-export all services
pub use directory::UserDirectory;
