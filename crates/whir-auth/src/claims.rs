//! Signed claim payload and its HS256 encoding.
//!
//! The codec only proves integrity. It does not look at `exp`; expiry is the
//! verifier's job so that it can be checked against an injected [`Clock`].
//!
//! [`Clock`]: crate::Clock

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};
use crate::SigningSecret;

/// Claims carried inside a signed token.
///
/// Access tokens carry the profile fields. Refresh tokens carry only `sub`
/// and `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject account id, 24 hex characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Absolute expiry, unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Returns `true` if the claims carry no profile fields.
    #[must_use]
    pub const fn is_profile_free(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

/// Encodes and decodes [`Claims`] under one signing secret.
pub struct ClaimsCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl ClaimsCodec {
    /// Create a codec for the given secret.
    #[must_use]
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign claims into a compact token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MisconfiguredSecret` if signing fails.
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(|e| {
            tracing::error!(error = %e, "Token signing failed");
            AuthError::MisconfiguredSecret
        })
    }

    /// Verify a token's signature and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::BadSignature` if the signature does not verify, or
    /// `AuthError::MalformedToken` if the token cannot be parsed.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::BadSignature
                }
                _ => AuthError::MalformedToken,
            })
    }
}
