//! Token verification against a credential collection.
//!
//! [`TokenVerifier::verify`] runs four checks in order:
//!
//! 1. signature and structure, via the [`ClaimsCodec`]
//! 2. expiry, exact cutoff, no leeway
//! 3. subject parses as an [`AccountId`]
//! 4. subject exists in the collection it was handed
//!
//! The verifier is generic over the collection and never looks at which
//! account kind it holds. Verification is read-only.

use std::sync::Arc;

use whir_core::AccountId;
use whir_store::{AccountCollection, StoreError};

use crate::claims::{Claims, ClaimsCodec};
use crate::clock::Clock;
use crate::error::{AuthError, Result};

/// Which half of a pair a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Carries profile claims.
    Access,
    /// Carries only a subject and an expiry.
    Refresh,
}

/// Claims from a token that passed every check.
///
/// Only [`TokenVerifier`] can build one, so holding it proves verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaims {
    subject: AccountId,
    claims: Claims,
}

impl VerifiedClaims {
    /// The subject account id.
    #[must_use]
    pub const fn subject(&self) -> AccountId {
        self.subject
    }

    /// Access or refresh.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        if self.claims.is_profile_free() {
            TokenKind::Refresh
        } else {
            TokenKind::Access
        }
    }

    /// Email claim, absent on refresh tokens.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.claims.email.as_deref()
    }
}

/// Verifies tokens and cross-checks their subject.
pub struct TokenVerifier {
    codec: Arc<ClaimsCodec>,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(codec: Arc<ClaimsCodec>, clock: Arc<dyn Clock>) -> Self {
        Self { codec, clock }
    }

    /// Verify a token and confirm its subject exists in `collection`.
    ///
    /// # Errors
    ///
    /// - `MalformedToken` / `BadSignature` if decoding fails
    /// - `Expired` if `exp` is before now
    /// - `InvalidSubject` if `sub` is missing or not an account id
    /// - `SubjectNotFound` if the lookup finds nothing or fails
    /// - `StoreUnavailable` if the lookup timed out
    pub async fn verify<C>(&self, collection: &C, token: &str) -> Result<VerifiedClaims>
    where
        C: AccountCollection + ?Sized,
    {
        let claims = self.codec.decode(token)?;

        let now = self.clock.now().timestamp();
        if claims.exp < now {
            tracing::debug!(exp = claims.exp, now, "Token expired");
            return Err(AuthError::Expired);
        }

        let subject: AccountId = claims
            .sub
            .as_deref()
            .ok_or(AuthError::InvalidSubject)?
            .parse()
            .map_err(|_| AuthError::InvalidSubject)?;

        match collection.get(&subject).await {
            Ok(_) => Ok(VerifiedClaims { subject, claims }),
            Err(StoreError::Unavailable(reason)) => {
                tracing::warn!(account_id = %subject, %reason, "Subject lookup timed out");
                Err(AuthError::StoreUnavailable)
            }
            Err(StoreError::NotFound) => Err(AuthError::SubjectNotFound),
            Err(e) => {
                tracing::warn!(account_id = %subject, error = %e, "Subject lookup failed");
                Err(AuthError::SubjectNotFound)
            }
        }
    }
}
