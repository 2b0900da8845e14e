//! Account service implementation.
//!
//! One [`AccountService`] is built per account kind, around that kind's
//! collection. Every path that hands out tokens goes through the same
//! issuer, and every path that replaces tokens on an existing account goes
//! through the renewer, so there is exactly one persisted write per sign-in.

use std::sync::Arc;

use chrono::Utc;
use whir_auth::{
    hash_password, verify_password, AuthError, FederatedIdentity, IssueRequest, Renewal,
    TokenAuthority, TokenKind, VerifiedClaims,
};
use whir_core::AccountKind;
use whir_store::{keys::normalize_email, AccountCollection, BusinessProfile, Identity, StoreError};

use crate::error::{AccountError, Result};
use crate::types::{AccountView, LoginRequest, SignUpRequest, SignedInAccount};
use crate::validation;

/// Sign-up, login, refresh and profile operations for one account kind.
pub struct AccountService<C: AccountCollection> {
    collection: Arc<C>,
    authority: TokenAuthority,
}

impl<C: AccountCollection> Clone for AccountService<C> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            authority: self.authority.clone(),
        }
    }
}

impl<C: AccountCollection + 'static> AccountService<C> {
    /// Create a service over a collection.
    #[must_use]
    pub const fn new(collection: Arc<C>, authority: TokenAuthority) -> Self {
        Self {
            collection,
            authority,
        }
    }

    /// The account kind served.
    #[must_use]
    pub fn kind(&self) -> AccountKind {
        self.collection.kind()
    }

    /// The underlying collection.
    #[must_use]
    pub const fn collection(&self) -> &Arc<C> {
        &self.collection
    }

    /// The token authority.
    #[must_use]
    pub const fn authority(&self) -> &TokenAuthority {
        &self.authority
    }

    /// Register a new account and issue its first token pair.
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is malformed
    /// - `EmailTaken` if the email is already registered
    /// - `Store` if the store fails or times out
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<SignedInAccount> {
        validation::sign_up(&request)?;

        let email = normalize_email(&request.email);
        if self.collection.count_by_email(&email).await? > 0 {
            tracing::debug!(kind = %self.kind(), "Sign-up with registered email");
            return Err(AccountError::EmailTaken);
        }

        let password = request.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AccountError::Internal(format!("hashing task failed: {e}")))??;

        let mut identity = Identity::new(
            email,
            request.first_name.trim(),
            request.last_name.as_deref().map(|s| s.trim().to_string()),
            Utc::now(),
        );
        identity.password_hash = Some(password_hash);
        if self.kind() == AccountKind::Business {
            identity.business = Some(request.business_profile());
        }

        let account = self.create(identity).await?;
        tracing::info!(kind = %self.kind(), account_id = %account.account.id, "Account created");
        Ok(account)
    }

    /// Log in with email and password and rotate the stored token pair.
    ///
    /// # Errors
    ///
    /// - `Validation` if the email is malformed
    /// - `InvalidCredentials` if the email is unknown or the password is wrong
    /// - `Auth` if renewal fails
    pub async fn log_in(&self, request: LoginRequest) -> Result<SignedInAccount> {
        validation::log_in(&request)?;

        let identity = match self.collection.find_by_email(&request.email).await {
            Ok(identity) => identity,
            Err(StoreError::NotFound) => return Err(AccountError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        let Some(hash) = identity.password_hash.clone() else {
            tracing::debug!(account_id = %identity.id, "Password login on federated account");
            return Err(AccountError::InvalidCredentials);
        };
        let password = request.password;
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AccountError::Internal(format!("password check failed: {e}")))?;
        if !matches {
            tracing::debug!(account_id = %identity.id, "Wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        let renewal = self.renew(&identity).await?;
        tracing::info!(kind = %self.kind(), account_id = %identity.id, "Logged in");
        Ok(self.signed_in(renewal))
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// - `Auth` if the token fails verification or renewal fails
    /// - `NotRefreshToken` if an access token is presented
    pub async fn refresh(&self, refresh_token: &str) -> Result<SignedInAccount> {
        let verified = self
            .authority
            .verifier()
            .verify(self.collection.as_ref(), refresh_token)
            .await?;
        if verified.kind() != TokenKind::Refresh {
            return Err(AccountError::NotRefreshToken);
        }

        let renewal = self
            .authority
            .renewer()
            .renew(self.collection.as_ref(), &verified.subject())
            .await?;
        Ok(self.signed_in(renewal))
    }

    /// Re-read the account named by verified claims.
    ///
    /// # Errors
    ///
    /// Returns `Auth(SubjectNotFound)` if the account is gone.
    pub async fn profile(&self, claims: &VerifiedClaims) -> Result<AccountView> {
        let identity = self
            .collection
            .get(&claims.subject())
            .await
            .map_err(AuthError::from)?;
        Ok(AccountView::new(self.kind(), &identity))
    }

    /// Sign in with an identity vouched for by an external provider,
    /// creating the account on first use.
    ///
    /// # Errors
    ///
    /// Returns `Store` or `Auth` errors from lookup, insert or renewal.
    pub async fn federated_sign_in(&self, federated: FederatedIdentity) -> Result<SignedInAccount> {
        let email = normalize_email(&federated.email);
        let lookup = self.collection.find_by_email(&email).await;

        match lookup {
            Ok(identity) => {
                let renewal = self.renew(&identity).await?;
                tracing::info!(account_id = %identity.id, "Federated sign-in");
                Ok(self.signed_in(renewal))
            }
            Err(StoreError::NotFound) => {
                let mut identity = Identity::new(
                    email,
                    federated.given_name,
                    federated.family_name,
                    Utc::now(),
                );
                if self.kind() == AccountKind::Business {
                    identity.business = Some(BusinessProfile::default());
                }
                match self.create(identity).await {
                    Err(AccountError::EmailTaken) => {
                        let existing = self.collection.find_by_email(&federated.email).await?;
                        Ok(self.signed_in(self.renew(&existing).await?))
                    }
                    other => {
                        if let Ok(account) = &other {
                            tracing::info!(
                                account_id = %account.account.id,
                                "Account created from federated identity"
                            );
                        }
                        other
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Issue the first pair for a new identity and insert it with the pair attached.
    async fn create(&self, mut identity: Identity) -> Result<SignedInAccount> {
        let tokens = self
            .authority
            .issuer()
            .issue_tokens(&IssueRequest::for_identity(&identity))?;
        identity.apply_tokens(&tokens.token_update());

        match self.collection.insert(&identity).await {
            Ok(()) => Ok(SignedInAccount {
                account: AccountView::new(self.kind(), &identity),
                tokens,
            }),
            Err(StoreError::EmailTaken) => Err(AccountError::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    async fn renew(&self, identity: &Identity) -> Result<Renewal> {
        Ok(self
            .authority
            .renewer()
            .renew(self.collection.as_ref(), &identity.id)
            .await?)
    }

    fn signed_in(&self, renewal: Renewal) -> SignedInAccount {
        SignedInAccount {
            account: AccountView::new(self.kind(), &renewal.identity),
            tokens: renewal.tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use whir_auth::{AuthConfig, Clock, ManualClock, SigningSecret};
    use whir_store::MemoryCollection;

    struct Fixture {
        service: AccountService<MemoryCollection>,
        clock: Arc<ManualClock>,
    }

    fn fixture(kind: AccountKind) -> Fixture {
        let config = AuthConfig::new(SigningSecret::new(b"accounts-secret".to_vec()).unwrap());
        let clock = Arc::new(ManualClock::starting_now());
        let authority = TokenAuthority::with_clock(&config, clock.clone());
        Fixture {
            service: AccountService::new(Arc::new(MemoryCollection::new(kind)), authority),
            clock,
        }
    }

    fn ada() -> SignUpRequest {
        SignUpRequest::new("Ada@Example.com", "analytical", "Ada").with_last_name("Lovelace")
    }

    #[tokio::test]
    async fn sign_up_stores_hashed_identity_with_tokens() {
        let fx = fixture(AccountKind::EndUser);
        let signed_in = fx.service.sign_up(ada()).await.unwrap();

        assert_eq!(signed_in.account.email, "ada@example.com");
        let stored = fx.service.collection().snapshot(&signed_in.account.id).unwrap();
        assert_ne!(stored.password_hash.as_deref(), Some("analytical"));
        assert!(verify_password("analytical", stored.password_hash.as_deref().unwrap()));
        assert_eq!(stored.token_pair(), Some(signed_in.tokens.pair.clone()));
        assert!(stored.business.is_none());

        let claims = fx
            .service
            .authority()
            .verifier()
            .verify(fx.service.collection().as_ref(), &signed_in.tokens.pair.token)
            .await
            .unwrap();
        assert_eq!(claims.subject(), signed_in.account.id);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let fx = fixture(AccountKind::EndUser);
        fx.service.sign_up(ada()).await.unwrap();

        let again = SignUpRequest::new("ada@example.com", "different", "Other");
        assert!(matches!(
            fx.service.sign_up(again).await,
            Err(AccountError::EmailTaken)
        ));
        assert_eq!(fx.service.collection().len(), 1);
    }

    #[tokio::test]
    async fn invalid_sign_up_touches_nothing() {
        let fx = fixture(AccountKind::EndUser);
        let result = fx
            .service
            .sign_up(SignUpRequest::new("ada@example.com", "123", "Ada"))
            .await;
        assert!(matches!(result, Err(AccountError::Validation(_))));
        assert!(fx.service.collection().is_empty());
    }

    #[tokio::test]
    async fn business_sign_up_keeps_profile() {
        let fx = fixture(AccountKind::Business);
        let request = SignUpRequest {
            business_name: Some("Corner Cafe".to_string()),
            ..SignUpRequest::new("cafe@example.com", "espresso", "Sam")
        };

        let signed_in = fx.service.sign_up(request).await.unwrap();
        let business = signed_in.account.business.unwrap();
        assert_eq!(business.business_name.as_deref(), Some("Corner Cafe"));
        assert_eq!(signed_in.account.kind, AccountKind::Business);
    }

    #[tokio::test]
    async fn log_in_rotates_pair() {
        let fx = fixture(AccountKind::EndUser);
        let first = fx.service.sign_up(ada()).await.unwrap();
        fx.clock.advance(Duration::minutes(1));

        let login = fx
            .service
            .log_in(LoginRequest::new("ada@example.com", "analytical"))
            .await
            .unwrap();

        assert_ne!(login.tokens.pair, first.tokens.pair);
        assert_eq!(fx.service.collection().token_writes(), 1);
        let stored = fx.service.collection().snapshot(&first.account.id).unwrap();
        assert_eq!(stored.token_pair(), Some(login.tokens.pair));
    }

    #[tokio::test]
    async fn log_in_failures_look_alike() {
        let fx = fixture(AccountKind::EndUser);
        fx.service.sign_up(ada()).await.unwrap();

        let wrong_password = fx
            .service
            .log_in(LoginRequest::new("ada@example.com", "difference"))
            .await;
        let unknown = fx
            .service
            .log_in(LoginRequest::new("nobody@example.com", "analytical"))
            .await;

        assert!(matches!(wrong_password, Err(AccountError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AccountError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn log_in_store_down() {
        let fx = fixture(AccountKind::EndUser);
        fx.service.sign_up(ada()).await.unwrap();
        fx.service.collection().fail_reads(true);

        let err = fx
            .service
            .log_in(LoginRequest::new("ada@example.com", "analytical"))
            .await
            .unwrap_err();
        assert_eq!(err.http_status_code(), 502);
    }

    #[tokio::test]
    async fn refresh_issues_new_pair() {
        let fx = fixture(AccountKind::EndUser);
        let first = fx.service.sign_up(ada()).await.unwrap();
        fx.clock.advance(Duration::hours(30));

        let refreshed = fx
            .service
            .refresh(&first.tokens.pair.refresh_token)
            .await
            .unwrap();

        assert_eq!(refreshed.account.first_name, "Ada");
        assert_eq!(refreshed.tokens.access_expires_at, fx.clock.now() + Duration::hours(24));
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let fx = fixture(AccountKind::EndUser);
        let first = fx.service.sign_up(ada()).await.unwrap();

        assert!(matches!(
            fx.service.refresh(&first.tokens.pair.token).await,
            Err(AccountError::NotRefreshToken)
        ));
    }

    #[tokio::test]
    async fn refresh_rejects_expired() {
        let fx = fixture(AccountKind::EndUser);
        let first = fx.service.sign_up(ada()).await.unwrap();
        fx.clock.advance(Duration::hours(169));

        assert!(matches!(
            fx.service.refresh(&first.tokens.pair.refresh_token).await,
            Err(AccountError::Auth(AuthError::Expired))
        ));
    }

    #[tokio::test]
    async fn profile_reads_fresh_fields() {
        let fx = fixture(AccountKind::EndUser);
        let first = fx.service.sign_up(ada()).await.unwrap();
        let claims = fx
            .service
            .authority()
            .verifier()
            .verify(fx.service.collection().as_ref(), &first.tokens.pair.token)
            .await
            .unwrap();

        let mut stored = fx.service.collection().snapshot(&first.account.id).unwrap();
        stored.first_name = "Augusta".to_string();
        fx.service.collection().put(&stored).await.unwrap();

        let view = fx.service.profile(&claims).await.unwrap();
        assert_eq!(view.first_name, "Augusta");
    }

    #[tokio::test]
    async fn federated_sign_in_creates_then_reuses() {
        let fx = fixture(AccountKind::EndUser);
        let federated = FederatedIdentity {
            email: "Grace@Example.com".to_string(),
            given_name: "Grace".to_string(),
            family_name: Some("Hopper".to_string()),
        };

        let created = fx.service.federated_sign_in(federated.clone()).await.unwrap();
        let stored = fx.service.collection().snapshot(&created.account.id).unwrap();
        assert!(stored.password_hash.is_none());
        assert_eq!(stored.email, "grace@example.com");

        let again = fx.service.federated_sign_in(federated).await.unwrap();
        assert_eq!(again.account.id, created.account.id);
        assert_eq!(fx.service.collection().len(), 1);

        let password_login = fx
            .service
            .log_in(LoginRequest::new("grace@example.com", "anything"))
            .await;
        assert!(matches!(password_login, Err(AccountError::InvalidCredentials)));
    }
}
