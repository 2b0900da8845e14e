//! API error types and responses.
//!
//! Every failure leaves the gateway as `{"status": <int>, "name": <message>}`.
//! The message is fixed per variant; the detail carried by a variant is only
//! ever logged.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use whir_accounts::AccountError;
use whir_auth::AuthError;
use whir_store::StoreError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be decoded.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The request decoded but a field is invalid.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, invalid or rejected token.
    #[error("unauthorized")]
    Unauthorized,

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Sign-up refused. The email may already be taken.
    #[error("registration failed")]
    RegistrationFailed,

    /// Federated sign-in refused.
    #[error("federated login failed: {0}")]
    FederatedLoginFailed(String),

    /// The credential store did not answer in time.
    #[error("store unavailable")]
    StoreUnavailable,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    name: &'static str,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized
            | Self::InvalidCredentials
            | Self::RegistrationFailed
            | Self::FederatedLoginFailed(_) => StatusCode::UNAUTHORIZED,
            Self::StoreUnavailable => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to clients.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "There was an error with the client request",
            Self::Validation(_) => "There was an error with user validation",
            Self::Unauthorized => "Failed to authenticate user",
            Self::InvalidCredentials => "The username or password is incorrect",
            Self::RegistrationFailed => "There was an error registering this account",
            Self::FederatedLoginFailed(_) => "There was an error logging in",
            Self::StoreUnavailable => "There was an error connecting with the server",
            Self::Internal(_) => "Internal Server Error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            status: status.as_u16(),
            name: self.name(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MalformedToken
            | AuthError::BadSignature
            | AuthError::Expired
            | AuthError::InvalidSubject
            | AuthError::SubjectNotFound => Self::Unauthorized,
            AuthError::Federation(reason) => Self::FederatedLoginFailed(reason),
            AuthError::StoreUnavailable | AuthError::Store(StoreError::Unavailable(_)) => {
                Self::StoreUnavailable
            }
            AuthError::MisconfiguredSecret => {
                tracing::error!("Signing secret is misconfigured");
                Self::Internal(err.to_string())
            }
            AuthError::Store(_) | AuthError::Internal(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(reason) => Self::Validation(reason),
            AccountError::InvalidCredentials => Self::InvalidCredentials,
            AccountError::EmailTaken => Self::RegistrationFailed,
            AccountError::NotRefreshToken => Self::Unauthorized,
            AccountError::Auth(auth_err) => Self::from(auth_err),
            AccountError::Store(StoreError::Unavailable(_)) => Self::StoreUnavailable,
            AccountError::Store(store_err) => Self::Internal(store_err.to_string()),
            AccountError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedInput(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self::MalformedInput(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn error_status_codes() {
        assert_eq!(
            ApiError::MalformedInput("eof".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Validation("email".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RegistrationFailed.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::StoreUnavailable.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Internal("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn token_failures_collapse() {
        for err in [
            AuthError::MalformedToken,
            AuthError::BadSignature,
            AuthError::Expired,
            AuthError::InvalidSubject,
            AuthError::SubjectNotFound,
        ] {
            assert!(matches!(ApiError::from(err), ApiError::Unauthorized));
        }
    }

    #[test]
    fn account_errors_map() {
        assert!(matches!(
            ApiError::from(AccountError::EmailTaken),
            ApiError::RegistrationFailed
        ));
        assert!(matches!(
            ApiError::from(AccountError::Store(StoreError::Unavailable("t".into()))),
            ApiError::StoreUnavailable
        ));
        assert!(matches!(
            ApiError::from(AccountError::Auth(AuthError::StoreUnavailable)),
            ApiError::StoreUnavailable
        ));
        assert!(matches!(
            ApiError::from(AccountError::Auth(AuthError::MisconfiguredSecret)),
            ApiError::Internal(_)
        ));
    }

    #[tokio::test]
    async fn body_hides_detail() {
        let response = ApiError::Validation("password must be at least 6 characters".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 400);
        assert_eq!(body["name"], "There was an error with user validation");
    }
}
