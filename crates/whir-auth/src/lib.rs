//! Token authentication for whir.
//!
//! This crate provides the token lifecycle shared by both account kinds:
//!
//! - HS256 claims encoding under a single signing secret
//! - Access/refresh pair issuance
//! - Verification with an expiry check and a subject cross-check
//! - Renewal that re-reads the profile and persists the new pair
//! - bcrypt password hashing and Google id-token checking
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │   Gateway        │────▶│  TokenAuthority  │
//! │   (HTTP)         │     └────────┬─────────┘
//! └──────────────────┘              │
//!               ┌───────────────────┼───────────────────┐
//!      ┌────────▼───────┐  ┌────────▼───────┐  ┌────────▼───────┐
//!      │  TokenIssuer   │  │ TokenVerifier  │  │ SessionRenewer │
//!      └────────┬───────┘  └───┬────────┬───┘  └───┬────────────┘
//!               │              │        │ find     │ get + store_tokens
//!      ┌────────▼───────┐      │   ┌────▼──────────▼──┐
//!      │  ClaimsCodec   │◀─────┘   │ AccountCollection │
//!      └────────────────┘          └───────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use whir_auth::{AuthConfig, IssueRequest, TokenAuthority};
//! use whir_store::AccountCollection;
//!
//! # async fn example(users: &impl AccountCollection) -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthConfig::from_env()?;
//! let authority = TokenAuthority::new(&config);
//!
//! let identity = users.find_by_email("a@b.com").await?;
//! let issued = authority.issuer().issue_tokens(&IssueRequest::for_identity(&identity))?;
//!
//! let claims = authority.verifier().verify(users, &issued.pair.token).await?;
//! println!("Subject: {}", claims.subject());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod authority;
pub mod claims;
pub mod clock;
pub mod error;
pub mod federation;
pub mod issuer;
pub mod password;
pub mod renewer;
pub mod verifier;

use std::fmt;
use std::sync::Arc;

pub use authority::TokenAuthority;
pub use claims::{Claims, ClaimsCodec};
pub use clock::{Clock, SystemClock};
pub use error::{AuthError, Result};
pub use federation::{
    FederatedIdentity, FederationConfig, GoogleIdTokenVerifier, IdTokenVerifier, JwksProvider,
};
pub use issuer::{IssueRequest, IssuedTokens, TokenIssuer};
pub use password::{hash_password, verify_password};
pub use renewer::{Renewal, SessionRenewer};
pub use verifier::{TokenKind, TokenVerifier, VerifiedClaims};

#[cfg(any(test, feature = "test-utils"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "test-utils"))]
pub use federation::MockIdTokenVerifier;

/// Default access token lifetime, in hours.
pub const DEFAULT_ACCESS_TTL_HOURS: i64 = 24;

/// Default refresh token lifetime, in hours.
pub const DEFAULT_REFRESH_TTL_HOURS: i64 = 168;

/// The HMAC signing secret. Never empty, never printed.
#[derive(Clone)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    /// Wrap a secret.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MisconfiguredSecret` if the secret is empty.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(AuthError::MisconfiguredSecret);
        }
        Ok(Self(bytes.into()))
    }

    /// The raw secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(..)")
    }
}

/// Token signing configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing and verifying.
    pub secret: SigningSecret,
    /// Access token lifetime.
    pub access_ttl: chrono::Duration,
    /// Refresh token lifetime.
    pub refresh_ttl: chrono::Duration,
}

impl AuthConfig {
    /// Config with default lifetimes.
    #[must_use]
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            access_ttl: chrono::Duration::hours(DEFAULT_ACCESS_TTL_HOURS),
            refresh_ttl: chrono::Duration::hours(DEFAULT_REFRESH_TTL_HOURS),
        }
    }

    /// Load from `SECRET_KEY`, `ACCESS_TOKEN_TTL_HOURS` and `REFRESH_TOKEN_TTL_HOURS`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MisconfiguredSecret` if `SECRET_KEY` is unset or empty.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MisconfiguredSecret` if `SECRET_KEY` is unset or empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("SECRET_KEY").ok_or(AuthError::MisconfiguredSecret)?;
        let mut config = Self::new(SigningSecret::new(secret)?);

        config.access_ttl = ttl_hours(&lookup, "ACCESS_TOKEN_TTL_HOURS", DEFAULT_ACCESS_TTL_HOURS);
        config.refresh_ttl =
            ttl_hours(&lookup, "REFRESH_TOKEN_TTL_HOURS", DEFAULT_REFRESH_TTL_HOURS);

        Ok(config)
    }
}

fn ttl_hours<F>(lookup: &F, key: &str, default: i64) -> chrono::Duration
where
    F: Fn(&str) -> Option<String>,
{
    let hours = match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(hours) if hours > 0 => hours,
            _ => {
                tracing::warn!(key, value = %raw, default, "Invalid token lifetime, using default");
                default
            }
        },
    };
    chrono::Duration::hours(hours)
}
