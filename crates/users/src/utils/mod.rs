//! Internal utilities for the user directory.

pub mod jwt;

// Re-export utilities
pub use jwt::*;
