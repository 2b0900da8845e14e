//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use whir_store::AccountCollection;

use crate::state::GatewayState;

/// What the gateway currently serves.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the process answers.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Account kinds accepting password sign-up and login.
    pub account_kinds: [&'static str; 2],
    /// Whether `POST /auth/google` can sign anyone in.
    pub google_sign_in: bool,
}

/// Health check handler.
///
/// Public, and never touches the credential store, so a store outage does
/// not fail it.
///
/// ```text
/// GET /health
///
/// Response: 200 OK
/// { "status": "healthy", "version": "0.1.0",
///   "account_kinds": ["user", "business"], "google_sign_in": false }
/// ```
pub async fn health<C>(State(state): State<Arc<GatewayState<C>>>) -> Json<HealthResponse>
where
    C: AccountCollection + 'static,
{
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        account_kinds: [
            state.users.kind().as_str(),
            state.businesses.kind().as_str(),
        ],
        google_sign_in: state.federation.is_some(),
    })
}
