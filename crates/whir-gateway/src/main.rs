//! Whir Gateway - HTTP API for account sign-in and session renewal.
//!
//! # Configuration
//!
//! `SECRET_KEY` is required; the process refuses to start without it. See
//! [`GatewayConfig::from_lookup`] and `AuthConfig::from_lookup` for the
//! other variables.
//!
//! # Dev Mode
//!
//! Build with `--features dev-mode` and set `DEV_MODE=true` to use a mock
//! Google verifier that doesn't require network access.
//! Post credentials in format: `test-id-token:<email>:<given_name>`

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whir_accounts::AccountService;
use whir_auth::{AuthConfig, IdTokenVerifier, TokenAuthority};
#[cfg(not(feature = "dev-mode"))]
use whir_auth::{FederationConfig, GoogleIdTokenVerifier};
#[cfg(feature = "dev-mode")]
use whir_auth::MockIdTokenVerifier;
use whir_core::AccountKind;
use whir_gateway::{create_router, GatewayConfig, GatewayState};
use whir_store::{Collection, RocksStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,whir=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Whir Gateway");

    let config = GatewayConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir.display(),
        cors_origins = ?config.cors_origins,
        store_timeout_seconds = config.store_timeout_seconds,
        google = config.google_client_id.is_some(),
        "Gateway configuration loaded"
    );

    // Signing config is loaded once and never changes afterwards
    let auth_config = match AuthConfig::from_env() {
        Ok(auth_config) => auth_config,
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal(), "Cannot load signing configuration");
            return Err(e.into());
        }
    };
    let authority = TokenAuthority::new(&auth_config);
    tracing::info!(
        access_ttl_hours = auth_config.access_ttl.num_hours(),
        refresh_ttl_hours = auth_config.refresh_ttl.num_hours(),
        "Token authority initialized"
    );

    // Initialize RocksDB store
    tracing::info!(path = %config.data_dir.display(), "Opening RocksDB store");
    let store = Arc::new(RocksStore::open(&config.data_dir)?);

    let users = Collection::new(
        Arc::clone(&store),
        AccountKind::EndUser,
        config.store_timeout(),
    );
    let businesses = Collection::new(store, AccountKind::Business, config.store_timeout());

    let federation = federation_verifier(&config)?;

    let mut state = GatewayState::new(
        AccountService::new(Arc::new(users), authority.clone()),
        AccountService::new(Arc::new(businesses), authority),
        config.clone(),
    );
    if let Some(verifier) = federation {
        state = state.with_federation(verifier);
    }

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "dev-mode")]
#[allow(clippy::unnecessary_wraps)]
fn federation_verifier(
    _config: &GatewayConfig,
) -> Result<Option<Arc<dyn IdTokenVerifier>>, Box<dyn std::error::Error>> {
    if std::env::var("DEV_MODE").is_ok_and(|v| v == "true") {
        tracing::warn!("DEV MODE ENABLED - using mock Google verifier");
        tracing::warn!("Post credentials in format: test-id-token:<email>:<given_name>");
        return Ok(Some(Arc::new(MockIdTokenVerifier)));
    }
    Ok(None)
}

#[cfg(not(feature = "dev-mode"))]
fn federation_verifier(
    config: &GatewayConfig,
) -> Result<Option<Arc<dyn IdTokenVerifier>>, Box<dyn std::error::Error>> {
    let Some(client_id) = &config.google_client_id else {
        tracing::warn!("No GOOGLE_CLIENT_ID set - Google sign-in disabled");
        return Ok(None);
    };

    let verifier = GoogleIdTokenVerifier::new(FederationConfig::google(client_id.clone()))?;
    tracing::info!("Google id-token verifier initialized");
    Ok(Some(Arc::new(verifier)))
}
