//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use whir_accounts::AccountService;
use whir_auth::IdTokenVerifier;
use whir_store::AccountCollection;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// One account service per kind, each wrapping its own collection.
pub struct GatewayState<C: AccountCollection> {
    /// End-user accounts.
    pub users: AccountService<C>,
    /// Business accounts.
    pub businesses: AccountService<C>,
    /// Federated id-token verifier, if federated sign-in is enabled.
    pub federation: Option<Arc<dyn IdTokenVerifier>>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<C: AccountCollection> GatewayState<C> {
    /// Create a new gateway state without federated sign-in.
    #[must_use]
    pub const fn new(
        users: AccountService<C>,
        businesses: AccountService<C>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            users,
            businesses,
            federation: None,
            config,
        }
    }

    /// Enable federated sign-in with the given verifier.
    #[must_use]
    pub fn with_federation(mut self, verifier: Arc<dyn IdTokenVerifier>) -> Self {
        self.federation = Some(verifier);
        self
    }
}

impl<C: AccountCollection> Clone for GatewayState<C> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            businesses: self.businesses.clone(),
            federation: self.federation.clone(),
            config: self.config.clone(),
        }
    }
}
