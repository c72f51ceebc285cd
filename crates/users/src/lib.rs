//! # Courier Users Crate
//!
//! This crate provides the user directory and bearer token verification
//! for the Courier gateway. The directory answers identity lookups and
//! keeps best-effort presence flags; the token utilities issue and verify
//! the JWTs clients present when connecting.

pub mod services;
pub mod types;
pub mod utils;

// Re-export database types
pub use courier_database::{CreateUserRequest, SqlitePool, User};

// Re-export main types for convenience
pub use services::UserDirectory;
pub use types::{DirectoryError, DirectoryResult, TokenError, TokenResult};
pub use utils::jwt::{Claims, TokenVerifier};
