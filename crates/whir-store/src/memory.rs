//! In-memory collection for tests.
//!
//! Mirrors the uniqueness and not-found behavior of [`Collection`](crate::Collection)
//! and can be switched into a failing mode to simulate an unreachable store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use whir_core::{AccountId, AccountKind};

use crate::collection::AccountCollection;
use crate::error::{Result, StoreError};
use crate::keys::normalize_email;
use crate::types::{Identity, TokenUpdate};

/// A [`AccountCollection`] backed by a `HashMap`.
pub struct MemoryCollection {
    kind: AccountKind,
    records: RwLock<HashMap<AccountId, Identity>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    token_writes: AtomicUsize,
}

impl MemoryCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new(kind: AccountKind) -> Self {
        Self {
            kind,
            records: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            token_writes: AtomicUsize::new(0),
        }
    }

    /// Make every read return `StoreError::Unavailable`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write return `StoreError::Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `store_tokens` calls so far.
    #[must_use]
    pub fn token_writes(&self) -> usize {
        self.token_writes.load(Ordering::SeqCst)
    }

    /// Read a record directly, bypassing failure injection.
    #[must_use]
    pub fn snapshot(&self, id: &AccountId) -> Option<Identity> {
        self.records.read().get(id).cloned()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }

    fn owner_of(records: &HashMap<AccountId, Identity>, email: &str) -> Option<AccountId> {
        let wanted = normalize_email(email);
        records
            .values()
            .find(|identity| normalize_email(&identity.email) == wanted)
            .map(|identity| identity.id)
    }
}

#[async_trait]
impl AccountCollection for MemoryCollection {
    fn kind(&self) -> AccountKind {
        self.kind
    }

    async fn get(&self, id: &AccountId) -> Result<Identity> {
        self.check_reads()?;
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Identity> {
        self.check_reads()?;
        let records = self.records.read();
        Self::owner_of(&records, email)
            .and_then(|id| records.get(&id).cloned())
            .ok_or(StoreError::NotFound)
    }

    async fn count_by_email(&self, email: &str) -> Result<u64> {
        self.check_reads()?;
        Ok(u64::from(Self::owner_of(&self.records.read(), email).is_some()))
    }

    async fn insert(&self, identity: &Identity) -> Result<()> {
        self.check_writes()?;
        let mut records = self.records.write();
        if Self::owner_of(&records, &identity.email).is_some() {
            return Err(StoreError::EmailTaken);
        }
        records.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn put(&self, identity: &Identity) -> Result<()> {
        self.check_writes()?;
        let mut records = self.records.write();
        if let Some(owner) = Self::owner_of(&records, &identity.email) {
            if owner != identity.id {
                return Err(StoreError::EmailTaken);
            }
        }
        records.insert(identity.id, identity.clone());
        Ok(())
    }

    async fn store_tokens(&self, id: &AccountId, update: &TokenUpdate) -> Result<()> {
        self.check_writes()?;
        let mut records = self.records.write();
        let identity = records.get_mut(id).ok_or(StoreError::NotFound)?;
        identity.apply_tokens(update);
        self.token_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
