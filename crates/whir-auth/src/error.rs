//! Authentication error types.

use thiserror::Error;
use whir_store::StoreError;

/// A result type using `AuthError`.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while issuing, verifying or renewing tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The string is not a well-formed signed envelope.
    #[error("malformed token")]
    MalformedToken,

    /// The signature does not verify under the configured secret.
    #[error("bad signature")]
    BadSignature,

    /// The token's expiry is in the past.
    #[error("token expired")]
    Expired,

    /// The subject claim is missing or not a valid account id.
    #[error("invalid subject")]
    InvalidSubject,

    /// The subject does not name an existing account.
    #[error("subject not found")]
    SubjectNotFound,

    /// The credential store did not answer in time.
    #[error("credential store unavailable")]
    StoreUnavailable,

    /// The signing secret is missing or unusable.
    #[error("signing secret missing or misconfigured")]
    MisconfiguredSecret,

    /// A federated id token was rejected.
    #[error("federated sign-in failed: {0}")]
    Federation(String),

    /// A store write failed for a reason other than availability.
    #[error("store error: {0}")]
    Store(StoreError),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns `true` if the process cannot safely keep serving auth.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::MisconfiguredSecret)
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MalformedToken
            | Self::BadSignature
            | Self::Expired
            | Self::InvalidSubject
            | Self::SubjectNotFound
            | Self::Federation(_) => 401,
            Self::StoreUnavailable | Self::Store(StoreError::Unavailable(_)) => 502,
            Self::MisconfiguredSecret | Self::Store(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::SubjectNotFound,
            StoreError::Unavailable(_) => Self::StoreUnavailable,
            other => Self::Store(other),
        }
    }
}
