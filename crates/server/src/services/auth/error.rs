//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::AppError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username and password are both required.
    #[error("username and password are required")]
    MissingCredentials,

    /// Invalid credentials (wrong password, unknown or inactive user).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Staff must choose an outlet when logging in.
    #[error("outlet selection required for staff")]
    OutletRequired,

    /// The chosen outlet does not exist or is inactive.
    #[error("invalid outlet")]
    InvalidOutlet,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::MissingCredentials
            | AuthError::OutletRequired
            | AuthError::InvalidOutlet
            | AuthError::WeakPassword(_) => Self::Validation(err.to_string()),
            AuthError::Repository(e) => e.into(),
            AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}
