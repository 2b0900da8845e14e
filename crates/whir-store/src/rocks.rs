//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options, WriteBatch,
};
use whir_core::{AccountId, AccountKind};

use crate::commit::CommitGate;
use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{self, all_column_families};
use crate::types::{Identity, TokenUpdate};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-modify-write sequences so the email index stays unique.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Look up the account ID indexed under an email.
    fn indexed_id(&self, kind: AccountKind, email: &str) -> Result<Option<AccountId>> {
        let cf = self.cf(schema::email_index(kind))?;
        let value = self
            .db
            .get_cf(&cf, keys::email_key(email))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            None => Ok(None),
            Some(bytes) => keys::decode_account_id(&bytes).map(Some).ok_or_else(|| {
                StoreError::Serialization(format!("corrupt email index entry for {kind}"))
            }),
        }
    }

    /// Write a record and its index entry, dropping a stale index entry if the email changed.
    ///
    /// Caller must hold `write_lock`.
    fn write_identity(
        &self,
        kind: AccountKind,
        identity: &Identity,
        previous_email: Option<&str>,
        gate: &CommitGate,
    ) -> Result<()> {
        let cf_records = self.cf(schema::records(kind))?;
        let cf_index = self.cf(schema::email_index(kind))?;

        let record_key = keys::identity_key(&identity.id);
        let value = Self::serialize(identity)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_records, &record_key, &value);

        if let Some(old) = previous_email {
            if keys::normalize_email(old) != keys::normalize_email(&identity.email) {
                batch.delete_cf(&cf_index, keys::email_key(old));
            }
        }
        batch.put_cf(&cf_index, keys::email_key(&identity.email), &record_key);

        gate.claim()?;
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    fn insert_identity(
        &self,
        kind: AccountKind,
        identity: &Identity,
        gate: &CommitGate,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();

        if self.indexed_id(kind, &identity.email)?.is_some() {
            return Err(StoreError::EmailTaken);
        }

        self.write_identity(kind, identity, None, gate)?;

        tracing::debug!(kind = %kind, account_id = %identity.id, "Inserted identity");
        Ok(())
    }

    fn put_identity(
        &self,
        kind: AccountKind,
        identity: &Identity,
        gate: &CommitGate,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();

        if let Some(owner) = self.indexed_id(kind, &identity.email)? {
            if owner != identity.id {
                return Err(StoreError::EmailTaken);
            }
        }

        let previous = self.get_identity(kind, &identity.id)?;
        let previous_email = previous.as_ref().map(|p| p.email.as_str());
        self.write_identity(kind, identity, previous_email, gate)
    }

    fn get_identity(&self, kind: AccountKind, id: &AccountId) -> Result<Option<Identity>> {
        let cf = self.cf(schema::records(kind))?;
        let key = keys::identity_key(id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn find_identity_by_email(&self, kind: AccountKind, email: &str) -> Result<Option<Identity>> {
        match self.indexed_id(kind, email)? {
            Some(id) => self.get_identity(kind, &id),
            None => Ok(None),
        }
    }

    fn count_identities_by_email(&self, kind: AccountKind, email: &str) -> Result<u64> {
        Ok(u64::from(self.indexed_id(kind, email)?.is_some()))
    }

    fn update_tokens(
        &self,
        kind: AccountKind,
        id: &AccountId,
        update: &TokenUpdate,
        gate: &CommitGate,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut identity = self.get_identity(kind, id)?.ok_or(StoreError::NotFound)?;
        identity.apply_tokens(update);

        let cf = self.cf(schema::records(kind))?;
        let value = Self::serialize(&identity)?;

        gate.claim()?;
        self.db
            .put_cf(&cf, keys::identity_key(id), value)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(kind = %kind, account_id = %id, "Stored token pair");
        Ok(())
    }
}
