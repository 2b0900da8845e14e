//! Account endpoints, shared by both account kinds.
//!
//! Each handler is generic over an [`AccountScope`] that picks the account
//! service out of the gateway state, so `/users/*` and `/business/*` are the
//! same code mounted twice.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use whir_accounts::{AccountService, AccountView, LoginRequest, SignUpRequest, SignedInAccount};
use whir_store::AccountCollection;

use crate::delivery::{Data, DeliveryChannel, TokenDelivery, REFRESH_TOKEN_HEADER};
use crate::error::ApiError;
use crate::gate::AuthClaims;
use crate::state::GatewayState;

/// Selects which account service a route works on.
pub trait AccountScope: Send + Sync + 'static {
    /// The service for this scope.
    fn service<C: AccountCollection>(state: &GatewayState<C>) -> &AccountService<C>;
}

/// End-user routes.
#[derive(Debug, Clone, Copy)]
pub struct Users;

impl AccountScope for Users {
    fn service<C: AccountCollection>(state: &GatewayState<C>) -> &AccountService<C> {
        &state.users
    }
}

/// Business routes.
#[derive(Debug, Clone, Copy)]
pub struct Businesses;

impl AccountScope for Businesses {
    fn service<C: AccountCollection>(state: &GatewayState<C>) -> &AccountService<C> {
        &state.businesses
    }
}

fn deliver<C: AccountCollection>(
    state: &GatewayState<C>,
    headers: &HeaderMap,
    signed_in: SignedInAccount,
) -> TokenDelivery<AccountView> {
    TokenDelivery::new(
        DeliveryChannel::for_request(headers),
        state.config.secure_cookies,
        signed_in.tokens.pair,
        signed_in.account,
    )
}

/// Register an account.
///
/// ```text
/// POST /users/signup        POST /business/signup
/// Cookie-Consent: true      (optional)
///
/// { "email": "...", "password": "...", "first_name": "...", ... }
///
/// Response: 200 OK, tokens as cookies or X-Auth-Token / X-Refresh-Token
/// { "data": { "id": "...", "kind": "end_user", ... } }
/// ```
pub async fn sign_up<C, K>(
    State(state): State<Arc<GatewayState<C>>>,
    headers: HeaderMap,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<TokenDelivery<AccountView>, ApiError>
where
    C: AccountCollection + 'static,
    K: AccountScope,
{
    let Json(request) = body?;
    let signed_in = K::service(&state).sign_up(request).await?;
    Ok(deliver(&state, &headers, signed_in))
}

/// Log in with email and password.
pub async fn log_in<C, K>(
    State(state): State<Arc<GatewayState<C>>>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<TokenDelivery<AccountView>, ApiError>
where
    C: AccountCollection + 'static,
    K: AccountScope,
{
    let Json(request) = body?;
    let signed_in = K::service(&state).log_in(request).await?;
    Ok(deliver(&state, &headers, signed_in))
}

/// Exchange the refresh token in the `refresh_token` header for a new pair.
pub async fn refresh<C, K>(
    State(state): State<Arc<GatewayState<C>>>,
    headers: HeaderMap,
) -> Result<TokenDelivery<AccountView>, ApiError>
where
    C: AccountCollection + 'static,
    K: AccountScope,
{
    let token = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            tracing::debug!("Refresh requested without a refresh_token header");
            ApiError::Unauthorized
        })?;

    let signed_in = K::service(&state).refresh(token).await?;
    Ok(deliver(&state, &headers, signed_in))
}

/// The signed-in account. Mounted behind the gate.
pub async fn current<C, K>(
    State(state): State<Arc<GatewayState<C>>>,
    AuthClaims(claims): AuthClaims,
) -> Result<Data<AccountView>, ApiError>
where
    C: AccountCollection + 'static,
    K: AccountScope,
{
    let account = K::service(&state).profile(&claims).await?;
    Ok(Data { data: account })
}
