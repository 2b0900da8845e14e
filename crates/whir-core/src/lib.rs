//! Core types for whir.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - **Identifiers**: [`AccountId`], the native key of the identity collections
//! - **Account kinds**: [`AccountKind`], which selects the collection to use
//!
//! # Example
//!
//! ```
//! use whir_core::{AccountId, AccountKind};
//!
//! let id = AccountId::from_hex("507f1f77bcf86cd799439011").unwrap();
//! assert_eq!(id.to_string(), "507f1f77bcf86cd799439011");
//!
//! let fresh = AccountId::generate();
//! assert_ne!(fresh, id);
//!
//! assert_eq!(AccountKind::Business.as_str(), "business");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{AccountId, AccountKind, IdError, ACCOUNT_ID_LEN};
