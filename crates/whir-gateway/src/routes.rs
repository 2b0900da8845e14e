//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use whir_store::AccountCollection;

use crate::delivery::{COOKIE_CONSENT, REFRESH_TOKEN_HEADER, X_AUTH_TOKEN, X_REFRESH_TOKEN};
use crate::gate::{authenticate, AuthGate};
use crate::handlers::accounts::{self, Businesses, Users};
use crate::handlers::{health, oauth};
use crate::state::GatewayState;

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `POST /auth/google` - Google sign-in (form post, redirects)
///
/// ## End-users
/// - `POST /users/signup` - Register
/// - `POST /users/login` - Log in
/// - `GET /token` - Refresh (`refresh_token` header)
/// - `GET /users` - Signed-in account (gated)
///
/// ## Businesses
/// - `POST /business/signup` - Register
/// - `POST /business/login` - Log in
/// - `GET /business/token` - Refresh (`refresh_token` header)
/// - `GET /business/me` - Signed-in account (gated)
pub fn create_router<C>(state: GatewayState<C>) -> Router
where
    C: AccountCollection + 'static,
{
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let cors = build_cors_layer(&cors_origins);

    // One gate per account kind, each verifying against its own collection
    let user_gate = AuthGate::for_service(&state.users);
    let business_gate = AuthGate::for_service(&state.businesses);

    let state = Arc::new(state);

    let gated_users = Router::new()
        .route("/users", get(accounts::current::<C, Users>))
        .route_layer(from_fn_with_state(user_gate, authenticate::<C>));

    let gated_businesses = Router::new()
        .route("/business/me", get(accounts::current::<C, Businesses>))
        .route_layer(from_fn_with_state(business_gate, authenticate::<C>));

    Router::new()
        // Health (public)
        .route("/health", get(health::health::<C>))
        // End-users
        .route("/users/signup", post(accounts::sign_up::<C, Users>))
        .route("/users/login", post(accounts::log_in::<C, Users>))
        .route("/token", get(accounts::refresh::<C, Users>))
        // Businesses
        .route("/business/signup", post(accounts::sign_up::<C, Businesses>))
        .route("/business/login", post(accounts::log_in::<C, Businesses>))
        .route("/business/token", get(accounts::refresh::<C, Businesses>))
        // Federated
        .route("/auth/google", post(oauth::google_sign_in::<C>))
        .merge(gated_users)
        .merge(gated_businesses)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
///
/// Credentials are only allowed for explicit origins; browsers refuse them
/// alongside a wildcard.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            COOKIE_CONSENT,
            REFRESH_TOKEN_HEADER,
        ])
        .expose_headers([X_AUTH_TOKEN, X_REFRESH_TOKEN]);

    if origins.iter().any(|o| o == "*") {
        base.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        base.allow_origin(origins).allow_credentials(true)
    }
}
