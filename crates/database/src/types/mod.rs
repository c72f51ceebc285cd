//! Shared types and result types for the database layer

pub mod errors;

// Re-export common types
pub use errors::DatabaseError;

// Common result type
pub type DatabaseResult<T> = Result<T, DatabaseError>;
