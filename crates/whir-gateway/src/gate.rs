//! Authentication gate and extractors.
//!
//! The gate is mounted with `axum::middleware::from_fn_with_state`, once per
//! account kind. It looks for an access token in the `access_token` cookie
//! first and then in the raw `Authorization` header value, verifies it
//! against its own collection and stores the [`VerifiedClaims`] in the
//! request extensions. Handlers read them back with [`AuthClaims`].
//!
//! Every rejection looks the same to the client. The concrete reason is only
//! logged.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;

use whir_accounts::AccountService;
use whir_auth::{TokenKind, TokenVerifier, VerifiedClaims};
use whir_store::AccountCollection;

use crate::delivery::ACCESS_TOKEN_COOKIE;
use crate::error::ApiError;

/// Verifies inbound access tokens against one collection.
pub struct AuthGate<C> {
    verifier: Arc<TokenVerifier>,
    collection: Arc<C>,
}

impl<C> Clone for AuthGate<C> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            collection: Arc::clone(&self.collection),
        }
    }
}

impl<C: AccountCollection + 'static> AuthGate<C> {
    /// Create a gate over a collection.
    #[must_use]
    pub const fn new(verifier: Arc<TokenVerifier>, collection: Arc<C>) -> Self {
        Self {
            verifier,
            collection,
        }
    }

    /// A gate sharing a service's verifier and collection.
    #[must_use]
    pub fn for_service(service: &AccountService<C>) -> Self {
        Self::new(
            service.authority().shared_verifier(),
            Arc::clone(service.collection()),
        )
    }

    /// Find and verify the request's access token.
    ///
    /// A failed cookie token still lets the header token through.
    pub async fn admit(&self, headers: &HeaderMap) -> Option<VerifiedClaims> {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
            if let Some(claims) = self.check(cookie.value(), "cookie").await {
                return Some(claims);
            }
        }

        let header = headers.get(AUTHORIZATION)?;
        let Ok(token) = header.to_str() else {
            tracing::debug!("Authorization header is not valid text");
            return None;
        };
        if token.is_empty() {
            return None;
        }
        self.check(token, "header").await
    }

    async fn check(&self, token: &str, source: &'static str) -> Option<VerifiedClaims> {
        match self.verifier.verify(self.collection.as_ref(), token).await {
            Ok(claims) if claims.kind() == TokenKind::Access => {
                tracing::debug!(source, account_id = %claims.subject(), "Token accepted");
                Some(claims)
            }
            Ok(claims) => {
                tracing::debug!(
                    source,
                    account_id = %claims.subject(),
                    "Refresh token used as access token"
                );
                None
            }
            Err(e) => {
                tracing::debug!(
                    source,
                    kind = %self.collection.kind(),
                    error = %e,
                    "Token rejected"
                );
                None
            }
        }
    }
}

/// Middleware that admits requests carrying a valid access token.
pub async fn authenticate<C>(
    State(gate): State<AuthGate<C>>,
    mut request: Request,
    next: Next,
) -> Response
where
    C: AccountCollection + 'static,
{
    let admitted = gate.admit(request.headers()).await;
    match admitted {
        Some(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        None => {
            tracing::info!(path = %request.uri().path(), "Failed to authenticate user");
            ApiError::Unauthorized.into_response()
        }
    }
}

/// Claims placed on the request by [`authenticate`].
///
/// Rejects with 401 on routes the gate is not mounted on.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub VerifiedClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedClaims>()
            .cloned()
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}
