//! Error types for the user directory.

use thiserror::Error;

/// Directory lookup and mutation errors
#[derive(Debug, Error, Clone)]
pub enum DirectoryError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Token issuing and verification errors
#[derive(Debug, Error, Clone)]
pub enum TokenError {
    #[error("Token creation failed: {0}")]
    TokenCreationFailed(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Result types for directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;
pub type TokenResult<T> = Result<T, TokenError>;

/// Convert database errors to our error types
impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DirectoryError::UserNotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.message().contains("UNIQUE constraint failed") {
                    if db_err.message().contains("email") {
                        DirectoryError::EmailAlreadyExists
                    } else {
                        DirectoryError::UserAlreadyExists
                    }
                } else {
                    DirectoryError::DatabaseError(db_err.message().to_string())
                }
            }
            _ => DirectoryError::DatabaseError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let directory_err = DirectoryError::UserNotFound;
        assert_eq!(directory_err.to_string(), "User not found");

        let token_err = TokenError::InvalidToken("bad signature".to_string());
        assert_eq!(token_err.to_string(), "Invalid token: bad signature");
    }
}
