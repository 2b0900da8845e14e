//! Gateway configuration types.
//!
//! This module defines configuration structures for the HTTP gateway.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the gateway service.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// RocksDB data directory.
    #[serde(default = "GatewayConfig::default_data_dir")]
    pub data_dir: PathBuf,

    /// Allowed CORS origins.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Per-call credential store timeout in seconds.
    #[serde(default = "GatewayConfig::default_store_timeout")]
    pub store_timeout_seconds: u64,

    /// Where the browser lands after federated sign-in.
    #[serde(default = "GatewayConfig::default_redirect_url")]
    pub redirect_url: String,

    /// Google OAuth client id. Federated sign-in is off without it.
    #[serde(default)]
    pub google_client_id: Option<String>,

    /// Mark token cookies `Secure`.
    #[serde(default)]
    pub secure_cookies: bool,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_data_dir() -> PathBuf {
        PathBuf::from("/data/whir")
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["http://localhost:3000".to_string()]
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        30
    }

    const fn default_store_timeout() -> u64 {
        5
    }

    fn default_redirect_url() -> String {
        "http://localhost:3000".to_string()
    }

    /// Load from the process environment, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// Unparseable numbers and flags are logged and left at their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(url) = lookup("REDIRECT_URL") {
            config.redirect_url = url;
        }
        config.google_client_id = lookup("GOOGLE_CLIENT_ID").filter(|id| !id.trim().is_empty());

        config.max_body_bytes = parsed(&lookup, "MAX_BODY_BYTES", config.max_body_bytes);
        config.request_timeout_seconds = parsed(
            &lookup,
            "REQUEST_TIMEOUT_SECONDS",
            config.request_timeout_seconds,
        );
        config.store_timeout_seconds =
            parsed(&lookup, "STORE_TIMEOUT_SECONDS", config.store_timeout_seconds);
        config.secure_cookies = parsed(&lookup, "SECURE_COOKIES", config.secure_cookies);

        config
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Get the store timeout as a `Duration`.
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Debug,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = ?default, "Invalid setting, using default");
            default
        }),
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            data_dir: Self::default_data_dir(),
            cors_origins: Self::default_cors_origins(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            store_timeout_seconds: Self::default_store_timeout(),
            redirect_url: Self::default_redirect_url(),
            google_client_id: None,
            secure_cookies: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.store_timeout_seconds, 5);
        assert!(config.google_client_id.is_none());
        assert!(!config.secure_cookies);
    }

    #[test]
    fn timeout_durations() {
        let config = GatewayConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn env_overrides() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("STORE_TIMEOUT_SECONDS", "3"),
            ("GOOGLE_CLIENT_ID", "client.apps.googleusercontent.com"),
            ("SECURE_COOKIES", "true"),
        ]));
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.store_timeout_seconds, 3);
        assert_eq!(
            config.google_client_id.as_deref(),
            Some("client.apps.googleusercontent.com")
        );
        assert!(config.secure_cookies);
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("MAX_BODY_BYTES", "lots"),
            ("SECURE_COOKIES", "yes please"),
        ]));
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert!(!config.secure_cookies);
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"listen_addr": "0.0.0.0:9999"}"#).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9999");
        assert_eq!(config.request_timeout_seconds, 30);
    }
}
