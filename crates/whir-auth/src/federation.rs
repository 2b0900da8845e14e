//! Federated sign-in with Google id tokens.
//!
//! A thin adapter. It checks the provider's id token against the provider's
//! published RSA keys and hands back a [`FederatedIdentity`], which the
//! account layer feeds into the same issuance path as password login.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Google's JWKS endpoint.
pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// Shortest gap between two fetches triggered by an unknown `kid`.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

/// Issuers Google puts in `iss`.
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Configuration for a federated identity provider.
#[derive(Debug, Clone)]
pub struct FederationConfig {
    /// OAuth client id; must appear in the token's `aud`.
    pub client_id: String,
    /// Where to fetch the signing keys.
    pub jwks_url: String,
    /// Accepted `iss` values.
    pub issuers: Vec<String>,
    /// How often to refresh the key cache, in seconds.
    pub jwks_refresh_seconds: u64,
}

impl FederationConfig {
    /// Configuration for Google sign-in.
    #[must_use]
    pub fn google(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            issuers: GOOGLE_ISSUERS.iter().map(|s| (*s).to_string()).collect(),
            jwks_refresh_seconds: 3600,
        }
    }
}

/// The profile a provider vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedIdentity {
    /// Verified email address.
    pub email: String,
    /// Given name, falls back to the email's local part.
    pub given_name: String,
    /// Family name, if the provider shared one.
    pub family_name: Option<String>,
}

/// Trait for checking provider id tokens.
#[async_trait]
pub trait IdTokenVerifier: Send + Sync {
    /// Verify an id token and extract the identity it asserts.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Federation` if the token is rejected.
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity>;
}

/// JWKS response from the provider.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

/// A single JWK.
#[derive(Debug, Deserialize)]
struct JwkKey {
    kty: String,
    kid: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

/// Cached keys with their fetch time.
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

/// Fetches and caches a provider's signing keys.
pub struct JwksProvider {
    url: String,
    refresh_interval: Duration,
    client: reqwest::Client,
    cache: RwLock<CachedKeys>,
}

impl JwksProvider {
    /// Create a provider for a JWKS endpoint.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, refresh_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            refresh_interval,
            client,
            cache: RwLock::new(CachedKeys {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        })
    }

    /// Get a decoding key by key ID, fetching the key set if needed.
    ///
    /// An unknown `kid` refetches a fresh key set at most once per
    /// [`MIN_REFETCH_INTERVAL`], so forged tokens cannot drive outbound traffic.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the fetch fails.
    pub async fn get_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.cache.read();
            let age = cache.fetched_at.map(|at| at.elapsed());
            if age.is_some_and(|age| age < self.refresh_interval) {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok(key.clone());
                }
                if age.is_some_and(|age| age < MIN_REFETCH_INTERVAL) {
                    tracing::debug!(kid, "Unknown signing key, refetch throttled");
                    return Err(unknown_key(kid));
                }
            }
        }

        self.refresh_keys().await?;

        self.cache
            .read()
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| unknown_key(kid))
    }

    async fn refresh_keys(&self) -> Result<()> {
        tracing::debug!(url = %self.url, "Fetching JWKS");

        let response: JwksResponse = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::Federation(format!("JWKS fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Federation(format!("JWKS fetch failed: {e}")))?;

        let mut keys = HashMap::new();
        for key in response.keys {
            if let Some(kid) = &key.kid {
                if let Some(decoding_key) = Self::parse_key(&key) {
                    keys.insert(kid.clone(), decoding_key);
                }
            }
        }

        tracing::debug!(count = keys.len(), "Cached JWKS keys");

        let mut cache = self.cache.write();
        cache.keys = keys;
        cache.fetched_at = Some(Instant::now());
        Ok(())
    }

    fn parse_key(key: &JwkKey) -> Option<DecodingKey> {
        if key.kty != "RSA" {
            tracing::debug!(kty = %key.kty, "Skipping non-RSA key");
            return None;
        }
        let (Some(n), Some(e)) = (&key.n, &key.e) else {
            tracing::warn!(kid = ?key.kid, "RSA key without modulus or exponent");
            return None;
        };
        match DecodingKey::from_rsa_components(n, e) {
            Ok(decoding_key) => Some(decoding_key),
            Err(err) => {
                tracing::warn!(kid = ?key.kid, error = %err, "Unusable RSA key");
                None
            }
        }
    }
}

fn unknown_key(kid: &str) -> AuthError {
    AuthError::Federation(format!("unknown signing key: {kid}"))
}

/// Claims we read from a Google id token.
#[derive(Debug, Deserialize)]
struct GoogleClaims {
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    given_name: Option<String>,
    family_name: Option<String>,
}

/// Verifies Google id tokens against Google's published keys.
pub struct GoogleIdTokenVerifier {
    config: FederationConfig,
    jwks: JwksProvider,
}

impl GoogleIdTokenVerifier {
    /// Create a verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: FederationConfig) -> Result<Self> {
        let jwks = JwksProvider::new(
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_refresh_seconds),
        )?;
        Ok(Self { config, jwks })
    }
}

#[async_trait]
impl IdTokenVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity> {
        let header = decode_header(id_token)
            .map_err(|e| AuthError::Federation(format!("malformed id token: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::Federation("id token has no key id".to_string()))?;

        let key = self.jwks.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(self.config.issuers.as_slice());
        validation.set_audience(&[&self.config.client_id]);

        let claims = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "expired".to_string(),
                    ErrorKind::InvalidIssuer => "wrong issuer".to_string(),
                    ErrorKind::InvalidAudience => "wrong audience".to_string(),
                    ErrorKind::InvalidSignature => "bad signature".to_string(),
                    _ => e.to_string(),
                };
                AuthError::Federation(reason)
            })?
            .claims;

        if claims.email_verified == Some(false) {
            return Err(AuthError::Federation("email not verified".to_string()));
        }
        let email = claims
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AuthError::Federation("id token carries no email".to_string()))?;

        let given_name = claims
            .given_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(FederatedIdentity {
            email,
            given_name,
            family_name: claims.family_name,
        })
    }
}

/// A mock id-token verifier for testing.
///
/// Accepts tokens of the form `test-id-token:<email>:<given_name>`.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct MockIdTokenVerifier;

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl IdTokenVerifier for MockIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<FederatedIdentity> {
        let rest = id_token.strip_prefix("test-id-token:").ok_or_else(|| {
            AuthError::Federation("expected test-id-token:<email>:<given_name>".to_string())
        })?;
        let (email, given_name) = rest.split_once(':').ok_or_else(|| {
            AuthError::Federation("expected test-id-token:<email>:<given_name>".to_string())
        })?;

        Ok(FederatedIdentity {
            email: email.to_string(),
            given_name: given_name.to_string(),
            family_name: None,
        })
    }
}
