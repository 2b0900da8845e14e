//! Session renewal: re-issue a pair from the stored profile and persist it.

use std::sync::Arc;

use whir_core::AccountId;
use whir_store::{AccountCollection, Identity};

use crate::error::Result;
use crate::issuer::{IssueRequest, IssuedTokens, TokenIssuer};

/// Outcome of a successful renewal.
#[derive(Debug, Clone)]
pub struct Renewal {
    /// The identity as it now stands in the store, new tokens included.
    pub identity: Identity,
    /// The newly issued pair.
    pub tokens: IssuedTokens,
}

/// Re-issues and persists token pairs.
pub struct SessionRenewer {
    issuer: Arc<TokenIssuer>,
}

impl SessionRenewer {
    /// Create a renewer.
    #[must_use]
    pub const fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }

    /// Re-issue both tokens for `id` from its current stored profile and
    /// persist them with a single write.
    ///
    /// If the write fails nothing is changed and the caller's old tokens
    /// remain valid until they expire.
    ///
    /// # Errors
    ///
    /// - `SubjectNotFound` if the identity is gone
    /// - `StoreUnavailable` if the store timed out
    /// - `Store` for any other store failure
    /// - `MisconfiguredSecret` if signing fails
    pub async fn renew<C>(&self, collection: &C, id: &AccountId) -> Result<Renewal>
    where
        C: AccountCollection + ?Sized,
    {
        let mut identity = collection.get(id).await?;

        let tokens = self.issuer.issue_tokens(&IssueRequest::for_identity(&identity))?;
        let update = tokens.token_update();

        if let Err(e) = collection.store_tokens(id, &update).await {
            tracing::warn!(
                kind = %collection.kind(),
                account_id = %id,
                error = %e,
                "Failed to persist renewed tokens"
            );
            return Err(e.into());
        }

        identity.apply_tokens(&update);

        tracing::info!(kind = %collection.kind(), account_id = %id, "Session renewed");

        Ok(Renewal { identity, tokens })
    }
}
