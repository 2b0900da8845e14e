//! HTTP gateway for whir.
//!
//! This crate is the public face of the account system. It handles:
//!
//! - Sign-up, login and token refresh for end-users and businesses
//! - Token delivery as `HttpOnly` cookies or response headers
//! - The authentication gate in front of account-scoped routes
//! - Google sign-in via a posted id token
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients                              │
//! │              (browser cookies / header tokens)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      whir-gateway                           │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Auth Gate  │ │   Router    │ │   Token delivery    │    │
//! │  │ (per kind)  │ │  + Handlers │ │ (cookie / header)   │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        ┌──────────────┐              ┌──────────────┐
//!        │ users        │              │ businesses   │
//!        │ AccountSvc   │              │ AccountSvc   │
//!        └──────────────┘              └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use whir_accounts::AccountService;
//! use whir_auth::{AuthConfig, TokenAuthority};
//! use whir_core::AccountKind;
//! use whir_gateway::{create_router, GatewayConfig, GatewayState};
//! use whir_store::{Collection, RocksStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::default();
//! let store = Arc::new(RocksStore::open("/tmp/whir")?);
//! let authority = TokenAuthority::new(&AuthConfig::from_env()?);
//!
//! let users = Collection::new(Arc::clone(&store), AccountKind::EndUser, config.store_timeout());
//! let businesses = Collection::new(store, AccountKind::Business, config.store_timeout());
//!
//! let state = GatewayState::new(
//!     AccountService::new(Arc::new(users), authority.clone()),
//!     AccountService::new(Arc::new(businesses), authority),
//!     config,
//! );
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod delivery;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use delivery::{DeliveryChannel, TokenDelivery};
pub use error::ApiError;
pub use gate::{authenticate, AuthClaims, AuthGate};
pub use routes::create_router;
pub use state::GatewayState;
