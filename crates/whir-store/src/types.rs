//! Domain types stored in the database.
//!
//! An [`Identity`] is the single persisted record per account. Its token
//! fields hold the most recently issued pair; issuing a new pair overwrites
//! the old one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use whir_core::AccountId;

/// An account record stored in one of the identity collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier, also the token subject.
    pub id: AccountId,
    /// Email address, unique within the collection.
    pub email: String,
    /// One-way password hash. Absent for federated accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Given name.
    pub first_name: String,
    /// Family name, optional.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Current access token.
    #[serde(default)]
    pub token: Option<String>,
    /// Current refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Business details, only set on business accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessProfile>,
}

impl Identity {
    /// Create a fresh identity with a generated id and no tokens.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::generate(),
            email: email.into(),
            password_hash: None,
            first_name: first_name.into(),
            last_name,
            token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
            business: None,
        }
    }

    /// The stored token pair, if both halves are present.
    #[must_use]
    pub fn token_pair(&self) -> Option<TokenPair> {
        match (&self.token, &self.refresh_token) {
            (Some(token), Some(refresh_token)) => Some(TokenPair {
                token: token.clone(),
                refresh_token: refresh_token.clone(),
            }),
            _ => None,
        }
    }

    /// Apply a token update in memory, mirroring what the store persists.
    pub fn apply_tokens(&mut self, update: &TokenUpdate) {
        self.token = Some(update.pair.token.clone());
        self.refresh_token = Some(update.pair.refresh_token.clone());
        self.updated_at = update.updated_at;
    }
}

/// Extra profile carried by business accounts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    /// Trading name.
    #[serde(default)]
    pub business_name: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub address: Option<Address>,
    /// Coordinates, if known.
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

/// A structured postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street and number.
    pub street: String,
    /// City.
    pub city: String,
    /// State or region.
    pub state: String,
    /// Postal code.
    #[serde(rename = "postalCode")]
    pub postal_code: String,
    /// Country.
    pub country: String,
}

/// A longitude/latitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

/// An access token and its companion refresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token.
    pub token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
}

/// The fields written when a new token pair is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenUpdate {
    /// The new pair.
    pub pair: TokenPair,
    /// New value for `updated_at`.
    pub updated_at: DateTime<Utc>,
}
