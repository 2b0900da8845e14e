//! Error types for account operations.

use thiserror::Error;
use whir_auth::AuthError;
use whir_store::StoreError;

/// A result type using `AccountError`.
pub type Result<T> = std::result::Result<T, AccountError>;

/// Errors that can occur in account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The request failed field validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown email or wrong password. Deliberately not told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The email is already registered for this account kind.
    #[error("email already registered")]
    EmailTaken,

    /// An access token was presented where a refresh token is required.
    #[error("not a refresh token")]
    NotRefreshToken,

    /// Token or federation failure.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AccountError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::InvalidCredentials | Self::EmailTaken | Self::NotRefreshToken => 401,
            Self::Auth(e) => e.http_status_code(),
            Self::Store(StoreError::Unavailable(_)) => 502,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }
}
