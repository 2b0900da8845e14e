//! Wiring for the issuer, verifier and renewer.

use std::sync::Arc;

use crate::claims::ClaimsCodec;
use crate::clock::{Clock, SystemClock};
use crate::issuer::TokenIssuer;
use crate::renewer::SessionRenewer;
use crate::verifier::TokenVerifier;
use crate::AuthConfig;

/// The issuer, verifier and renewer built from one [`AuthConfig`].
///
/// All three share one codec and one clock. Cloning is cheap.
#[derive(Clone)]
pub struct TokenAuthority {
    issuer: Arc<TokenIssuer>,
    verifier: Arc<TokenVerifier>,
    renewer: Arc<SessionRenewer>,
}

impl TokenAuthority {
    /// Build from config using the system clock.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build from config with an explicit clock.
    #[must_use]
    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let codec = Arc::new(ClaimsCodec::new(&config.secret));
        let issuer = Arc::new(TokenIssuer::new(
            Arc::clone(&codec),
            Arc::clone(&clock),
            config.access_ttl,
            config.refresh_ttl,
        ));
        let verifier = Arc::new(TokenVerifier::new(codec, clock));
        let renewer = Arc::new(SessionRenewer::new(Arc::clone(&issuer)));

        Self {
            issuer,
            verifier,
            renewer,
        }
    }

    /// The token issuer.
    #[must_use]
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// The token verifier.
    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// A shared handle to the verifier.
    #[must_use]
    pub fn shared_verifier(&self) -> Arc<TokenVerifier> {
        Arc::clone(&self.verifier)
    }

    /// The session renewer.
    #[must_use]
    pub fn renewer(&self) -> &SessionRenewer {
        &self.renewer
    }
}
