//! Token issuance.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use whir_core::AccountId;
use whir_store::{Identity, TokenPair, TokenUpdate};

use crate::claims::{Claims, ClaimsCodec};
use crate::clock::Clock;
use crate::error::Result;

/// The identity fields that go into an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRequest {
    /// Subject account id.
    pub subject: AccountId,
    /// Email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name, omitted from the claims when absent.
    pub last_name: Option<String>,
}

impl IssueRequest {
    /// Build a request from a stored identity's current profile.
    #[must_use]
    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            subject: identity.id,
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
        }
    }
}

/// A freshly signed token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedTokens {
    /// The access and refresh tokens.
    pub pair: TokenPair,
    /// When the pair was signed.
    pub issued_at: DateTime<Utc>,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
}

impl IssuedTokens {
    /// The store update that persists this pair.
    #[must_use]
    pub fn token_update(&self) -> TokenUpdate {
        TokenUpdate {
            pair: self.pair.clone(),
            updated_at: self.issued_at,
        }
    }
}

/// Signs access and refresh tokens. Holds no per-account state.
pub struct TokenIssuer {
    codec: Arc<ClaimsCodec>,
    clock: Arc<dyn Clock>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer.
    #[must_use]
    pub fn new(
        codec: Arc<ClaimsCodec>,
        clock: Arc<dyn Clock>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            clock,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue an access token with full profile claims and a refresh token
    /// carrying only the subject.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MisconfiguredSecret` if signing fails.
    pub fn issue_tokens(&self, request: &IssueRequest) -> Result<IssuedTokens> {
        let now = self.clock.now();
        let access_expires_at = now + self.access_ttl;
        let refresh_expires_at = now + self.refresh_ttl;
        let subject = request.subject.to_hex();

        let access = Claims {
            sub: Some(subject.clone()),
            email: Some(request.email.clone()),
            first_name: Some(request.first_name.clone()),
            last_name: request.last_name.clone(),
            exp: access_expires_at.timestamp(),
        };
        let refresh = Claims {
            sub: Some(subject),
            email: None,
            first_name: None,
            last_name: None,
            exp: refresh_expires_at.timestamp(),
        };

        let pair = TokenPair {
            token: self.codec.encode(&access)?,
            refresh_token: self.codec.encode(&refresh)?,
        };

        tracing::debug!(
            account_id = %request.subject,
            access_exp = access.exp,
            refresh_exp = refresh.exp,
            "Issued token pair"
        );

        Ok(IssuedTokens {
            pair,
            issued_at: now,
            access_expires_at,
            refresh_expires_at,
        })
    }
}
