//! Database schema definitions and column families.
//!
//! Each account kind gets a record column family and an email index.

use whir_core::AccountKind;

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// End-user records, keyed by `account_id`.
    pub const END_USERS: &str = "end_users";

    /// Index: end users by normalized email, value is the `account_id`.
    pub const END_USERS_BY_EMAIL: &str = "end_users_by_email";

    /// Business records, keyed by `account_id`.
    pub const BUSINESSES: &str = "businesses";

    /// Index: businesses by normalized email, value is the `account_id`.
    pub const BUSINESSES_BY_EMAIL: &str = "businesses_by_email";
}

/// Record column family for an account kind.
#[must_use]
pub const fn records(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::EndUser => cf::END_USERS,
        AccountKind::Business => cf::BUSINESSES,
    }
}

/// Email index column family for an account kind.
#[must_use]
pub const fn email_index(kind: AccountKind) -> &'static str {
    match kind {
        AccountKind::EndUser => cf::END_USERS_BY_EMAIL,
        AccountKind::Business => cf::BUSINESSES_BY_EMAIL,
    }
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::END_USERS,
        cf::END_USERS_BY_EMAIL,
        cf::BUSINESSES,
        cf::BUSINESSES_BY_EMAIL,
    ]
}
