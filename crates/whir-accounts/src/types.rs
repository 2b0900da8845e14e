//! Request and response types for account operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use whir_auth::IssuedTokens;
use whir_core::{AccountId, AccountKind};
use whir_store::{Address, BusinessProfile, GeoPoint, Identity};

/// Request to register a new account.
///
/// Missing text fields deserialize as empty so they fail validation rather
/// than parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpRequest {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Business trading name. Business accounts only.
    #[serde(default)]
    pub business_name: Option<String>,
    /// Business description. Business accounts only.
    #[serde(default)]
    pub description: Option<String>,
    /// Business postal address. Business accounts only.
    #[serde(default)]
    pub address: Option<Address>,
    /// Business latitude. Business accounts only.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Business longitude. Business accounts only.
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl SignUpRequest {
    /// Create a request with the required fields.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            first_name: first_name.into(),
            ..Self::default()
        }
    }

    /// Set the family name.
    #[must_use]
    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// The business profile described by this request.
    #[must_use]
    pub fn business_profile(&self) -> BusinessProfile {
        let location = match (self.longitude, self.latitude) {
            (Some(longitude), Some(latitude)) => Some(GeoPoint {
                longitude,
                latitude,
            }),
            _ => None,
        };

        BusinessProfile {
            business_name: self.business_name.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            location,
        }
    }
}

/// Request to log in with email and password.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Create a login request.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// What clients get to see of an account. Never includes secrets or tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    /// Account id.
    pub id: AccountId,
    /// Account kind.
    pub kind: AccountKind,
    /// Email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Business details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessProfile>,
}

impl AccountView {
    /// Project a stored identity.
    #[must_use]
    pub fn new(kind: AccountKind, identity: &Identity) -> Self {
        Self {
            id: identity.id,
            kind,
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            created_at: identity.created_at,
            updated_at: identity.updated_at,
            business: identity.business.clone(),
        }
    }
}

/// An account together with a freshly issued token pair.
#[derive(Debug, Clone)]
pub struct SignedInAccount {
    /// The account.
    pub account: AccountView,
    /// The new tokens, to be delivered out of band.
    pub tokens: IssuedTokens,
}
