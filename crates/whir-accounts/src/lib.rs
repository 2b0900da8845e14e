//! Account services for whir.
//!
//! This crate provides the operations behind the HTTP surface: sign-up,
//! password login, token refresh, profile reads and federated sign-in. All
//! of them end in the same issuance path from `whir-auth`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Gateway (HTTP)                          │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                              │
//!                 ▼                              ▼
//! ┌───────────────────────────┐  ┌───────────────────────────┐
//! │ AccountService<EndUser>   │  │ AccountService<Business>  │
//! └───────────────────────────┘  └───────────────────────────┘
//!                 │                              │
//!                 └──────────────┬───────────────┘
//!                        ┌───────▼────────┐
//!                        │ TokenAuthority │
//!                        └───────┬────────┘
//!                                ▼
//!                 ┌──────────────────────────────┐
//!                 │  Store (RocksDB collections) │
//!                 └──────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use whir_accounts::{AccountService, LoginRequest, SignUpRequest};
//! use whir_auth::{AuthConfig, TokenAuthority};
//! use whir_core::AccountKind;
//! use whir_store::{Collection, RocksStore, DEFAULT_STORE_TIMEOUT};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/whir")?);
//! let users = Collection::new(store, AccountKind::EndUser, DEFAULT_STORE_TIMEOUT);
//! let authority = TokenAuthority::new(&AuthConfig::from_env()?);
//!
//! let service = AccountService::new(Arc::new(users), authority);
//! service
//!     .sign_up(SignUpRequest::new("ada@example.com", "analytical", "Ada"))
//!     .await?;
//!
//! let session = service
//!     .log_in(LoginRequest::new("ada@example.com", "analytical"))
//!     .await?;
//! println!("Access token expires at {}", session.tokens.access_expires_at);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod service;
pub mod types;
pub mod validation;

pub use error::{AccountError, Result};
pub use service::AccountService;
pub use types::{AccountView, LoginRequest, SignUpRequest, SignedInAccount};

pub use whir_core::{AccountId, AccountKind};
