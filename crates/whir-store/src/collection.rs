//! Async, time-bounded access to one identity collection.
//!
//! [`AccountCollection`] is the seam the auth and account layers depend on.
//! [`Collection`] implements it over any synchronous [`Store`], bound to a
//! single [`AccountKind`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use whir_core::{AccountId, AccountKind};

use crate::commit::CommitGate;
use crate::error::{Result, StoreError};
use crate::types::{Identity, TokenUpdate};
use crate::Store;

/// Default per-call store timeout.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Operations on the identities of a single account kind.
#[async_trait]
pub trait AccountCollection: Send + Sync {
    /// The account kind this collection holds.
    fn kind(&self) -> AccountKind;

    /// Fetch an identity by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no identity has this id.
    async fn get(&self, id: &AccountId) -> Result<Identity>;

    /// Fetch an identity by email.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no identity uses this email.
    async fn find_by_email(&self, email: &str) -> Result<Identity>;

    /// Number of identities registered with this email.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or times out.
    async fn count_by_email(&self, email: &str) -> Result<u64>;

    /// Insert a new identity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailTaken` if the email is already registered.
    async fn insert(&self, identity: &Identity) -> Result<()>;

    /// Replace an identity record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailTaken` if the new email belongs to another identity.
    async fn put(&self, identity: &Identity) -> Result<()>;

    /// Persist a freshly issued token pair.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the identity doesn't exist.
    async fn store_tokens(&self, id: &AccountId, update: &TokenUpdate) -> Result<()>;
}

/// A [`Store`] bound to one account kind, with every call on the blocking pool.
pub struct Collection<S: Store> {
    store: Arc<S>,
    kind: AccountKind,
    timeout: Duration,
}

impl<S: Store + 'static> Collection<S> {
    /// Create a collection handle.
    #[must_use]
    pub fn new(store: Arc<S>, kind: AccountKind, timeout: Duration) -> Self {
        Self {
            store,
            kind,
            timeout,
        }
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&S, AccountKind) -> Result<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let kind = self.kind;
        let task = tokio::task::spawn_blocking(move || f(&store, kind));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(joined) => joined.map_err(|e| task_failed(op, &e))?,
            Err(_) => Err(self.timed_out(op)),
        }
    }

    /// Like [`Self::run`], but a write that loses to the timeout never commits.
    ///
    /// If the writer claimed its gate before the timeout fired, the commit is
    /// already under way and its real outcome is awaited instead.
    async fn run_write<F>(&self, op: &'static str, f: F) -> Result<()>
    where
        F: FnOnce(&S, AccountKind, &CommitGate) -> Result<()> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let kind = self.kind;
        let gate = CommitGate::new();
        let writer_gate = gate.clone();
        let mut task = tokio::task::spawn_blocking(move || f(&store, kind, &writer_gate));

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(joined) => joined.map_err(|e| task_failed(op, &e))?,
            Err(_) if gate.abandon() => Err(self.timed_out(op)),
            Err(_) => {
                tracing::debug!(kind = %kind, op, "Write committing past timeout, awaiting it");
                task.await.map_err(|e| task_failed(op, &e))?
            }
        }
    }

    fn timed_out(&self, op: &'static str) -> StoreError {
        tracing::warn!(
            kind = %self.kind,
            op,
            timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            "Store call timed out"
        );
        StoreError::Unavailable(format!("{op} timed out after {:?}", self.timeout))
    }
}

fn task_failed(op: &str, e: &tokio::task::JoinError) -> StoreError {
    StoreError::Database(format!("{op} task failed: {e}"))
}

impl<S: Store> Clone for Collection<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            kind: self.kind,
            timeout: self.timeout,
        }
    }
}

#[async_trait]
impl<S: Store + 'static> AccountCollection for Collection<S> {
    fn kind(&self) -> AccountKind {
        self.kind
    }

    async fn get(&self, id: &AccountId) -> Result<Identity> {
        let id = *id;
        self.run("get", move |store, kind| store.get_identity(kind, &id))
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity> {
        let email = email.to_string();
        self.run("find_by_email", move |store, kind| {
            store.find_identity_by_email(kind, &email)
        })
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn count_by_email(&self, email: &str) -> Result<u64> {
        let email = email.to_string();
        self.run("count_by_email", move |store, kind| {
            store.count_identities_by_email(kind, &email)
        })
        .await
    }

    async fn insert(&self, identity: &Identity) -> Result<()> {
        let identity = identity.clone();
        self.run_write("insert", move |store, kind, gate| {
            store.insert_identity(kind, &identity, gate)
        })
        .await
    }

    async fn put(&self, identity: &Identity) -> Result<()> {
        let identity = identity.clone();
        self.run_write("put", move |store, kind, gate| {
            store.put_identity(kind, &identity, gate)
        })
        .await
    }

    async fn store_tokens(&self, id: &AccountId, update: &TokenUpdate) -> Result<()> {
        let id = *id;
        let update = update.clone();
        self.run_write("store_tokens", move |store, kind, gate| {
            store.update_tokens(kind, &id, &update, gate)
        })
        .await
    }
}
