//! `RocksDB` credential store for whir.
//!
//! This crate owns the persisted [`Identity`] records for both account kinds.
//! Nothing else in the system keeps durable state about accounts or tokens.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `end_users` / `businesses`: identity records, keyed by `account_id`
//! - `end_users_by_email` / `businesses_by_email`: unique email index
//!
//! Callers never touch [`Store`] directly from async code. They go through a
//! per-kind [`Collection`], which runs each call on the blocking pool under a
//! timeout and reports [`StoreError::Unavailable`] when it elapses. Writes
//! carry a [`CommitGate`] so one that loses to the timeout is never committed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use whir_core::AccountKind;
//! use whir_store::{AccountCollection, Collection, RocksStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/whir-db")?);
//! let users = Collection::new(store, AccountKind::EndUser, Duration::from_secs(5));
//!
//! let taken = users.count_by_email("a@b.com").await? > 0;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collection;
pub mod commit;
pub mod error;
pub mod keys;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod rocks;
pub mod schema;
pub mod types;

pub use collection::{AccountCollection, Collection, DEFAULT_STORE_TIMEOUT};
pub use commit::CommitGate;
pub use error::{Result, StoreError};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryCollection;
pub use rocks::RocksStore;
pub use types::{Address, BusinessProfile, GeoPoint, Identity, TokenPair, TokenUpdate};

use whir_core::{AccountId, AccountKind};

/// The storage trait defining all database operations.
///
/// Every method takes the [`AccountKind`] that selects the collection. The
/// trait is synchronous; see [`Collection`] for the async, time-bounded view.
///
/// Write methods must call [`CommitGate::claim`] after their last fallible
/// check and before committing, and must not write if the claim fails.
pub trait Store: Send + Sync {
    /// Insert a new identity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailTaken` if the email is already indexed for this kind,
    /// or `StoreError::Unavailable` if the gate was abandoned.
    fn insert_identity(
        &self,
        kind: AccountKind,
        identity: &Identity,
        gate: &CommitGate,
    ) -> Result<()>;

    /// Insert or replace an identity record, keeping the email index in step.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::EmailTaken` if the email belongs to a different identity,
    /// or `StoreError::Unavailable` if the gate was abandoned.
    fn put_identity(&self, kind: AccountKind, identity: &Identity, gate: &CommitGate)
        -> Result<()>;

    /// Get an identity by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_identity(&self, kind: AccountKind, id: &AccountId) -> Result<Option<Identity>>;

    /// Find an identity by email (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_identity_by_email(&self, kind: AccountKind, email: &str) -> Result<Option<Identity>>;

    /// Count identities registered under an email. Either 0 or 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn count_identities_by_email(&self, kind: AccountKind, email: &str) -> Result<u64>;

    /// Set `token`, `refresh_token` and `updated_at` in a single write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the identity doesn't exist,
    /// or `StoreError::Unavailable` if the gate was abandoned.
    fn update_tokens(
        &self,
        kind: AccountKind,
        id: &AccountId,
        update: &TokenUpdate,
        gate: &CommitGate,
    ) -> Result<()>;
}
