//! Key encoding utilities for `RocksDB`.

use whir_core::{AccountId, ACCOUNT_ID_LEN};

/// Encode an identity key (just the account ID bytes).
#[must_use]
pub fn identity_key(id: &AccountId) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Normalize an email for uniqueness checks: trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Encode an email index key.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    normalize_email(email).into_bytes()
}

/// Decode the account ID stored as an email index value.
///
/// Returns `None` if the value has the wrong length.
#[must_use]
pub fn decode_account_id(value: &[u8]) -> Option<AccountId> {
    let bytes: [u8; ACCOUNT_ID_LEN] = value.try_into().ok()?;
    Some(AccountId::from_bytes(bytes))
}
