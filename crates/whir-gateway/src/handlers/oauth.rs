//! Google sign-in.
//!
//! The browser posts the Google credential as a form field. A verified
//! credential signs the end-user in (creating the account on first use),
//! sets the token cookies and redirects to the configured URL.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::Redirect;
use axum::Form;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use whir_store::AccountCollection;

use crate::delivery::token_cookies;
use crate::error::ApiError;
use crate::state::GatewayState;

/// Form posted by the Google Identity Services button.
#[derive(Debug, Deserialize)]
pub struct GoogleCredential {
    /// The Google id token.
    #[serde(default)]
    pub credential: String,
}

/// `POST /auth/google`
pub async fn google_sign_in<C>(
    State(state): State<Arc<GatewayState<C>>>,
    jar: CookieJar,
    form: Result<Form<GoogleCredential>, FormRejection>,
) -> Result<(CookieJar, Redirect), ApiError>
where
    C: AccountCollection + 'static,
{
    let Form(form) = form?;
    let verifier = state.federation.as_ref().ok_or_else(|| {
        ApiError::Internal("federated sign-in is not configured".to_string())
    })?;

    let federated = verifier.verify(&form.credential).await?;
    let signed_in = state.users.federated_sign_in(federated).await?;
    tracing::info!(
        account_id = %signed_in.account.id,
        redirect = %state.config.redirect_url,
        "Google sign-in complete"
    );

    let jar = token_cookies(jar, &signed_in.tokens.pair, state.config.secure_cookies);
    Ok((jar, Redirect::to(&state.config.redirect_url)))
}
