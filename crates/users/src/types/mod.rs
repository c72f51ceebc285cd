//! Shared types for the user directory.

pub mod errors;

// Re-export common types
pub use errors::{DirectoryError, DirectoryResult, TokenError, TokenResult};
