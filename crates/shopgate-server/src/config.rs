//! Server configuration.
//!
//! Loaded from a TOML file with serde defaults for every section, then
//! overridden by environment variables for the two secrets
//! (`SHOPGATE_CLIENT_SECRET`, `SHOPGATE_SHOPIFY_TOKEN`) so they never have
//! to live in the file.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// The one registered OAuth client.
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub oauth: OAuthSettings,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    /// Upstream Shopify Admin API.
    #[serde(default)]
    pub shopify: ShopifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Initial secret; usually supplied via `SHOPGATE_CLIENT_SECRET`. When
    /// absent a fresh one is generated at startup.
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    /// Authorization code lifetime.
    #[serde(default = "default_code_lifetime", with = "humantime_serde")]
    pub code_lifetime: Duration,
    /// Advertised access-token lifetime in seconds.
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,
    /// Scope granted to every token.
    #[serde(default = "default_scope")]
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL of the authorizer's credential cache slot.
    #[serde(default = "default_credential_ttl", with = "humantime_serde")]
    pub credential_ttl: Duration,
    /// How often expired authorization codes are reaped.
    #[serde(default = "default_reap_interval", with = "humantime_serde")]
    pub code_reap_interval: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Identifier of the rotated secret, carried on every scheduler
    /// invocation.
    #[serde(default = "default_rotation_secret_id")]
    pub secret_id: String,
    /// Time between rotation attempts.
    #[serde(default = "default_rotation_interval", with = "humantime_serde")]
    pub interval: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyConfig {
    /// Base URL the `/admin` routes proxy to.
    #[serde(default = "default_shopify_base_url")]
    pub base_url: String,
    /// Admin API token attached to proxied requests; usually supplied via
    /// `SHOPGATE_SHOPIFY_TOKEN`.
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_client_id() -> String {
    "abc".to_string()
}
fn default_redirect_uri() -> String {
    "https://app.example.com/callback".to_string()
}
fn default_code_lifetime() -> Duration {
    Duration::from_secs(600)
}
fn default_token_lifetime() -> u64 {
    3600
}
fn default_scope() -> String {
    "read write".to_string()
}
fn default_credential_ttl() -> Duration {
    Duration::from_secs(300)
}
fn default_reap_interval() -> Duration {
    Duration::from_secs(60)
}
fn default_rotation_secret_id() -> String {
    "shopgate/client-credential".to_string()
}
fn default_rotation_interval() -> Duration {
    // 90 days
    Duration::from_secs(90 * 24 * 60 * 60)
}
fn default_shopify_base_url() -> String {
    "https://example.myshopify.com".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            client_secret: None,
            redirect_uri: default_redirect_uri(),
        }
    }
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            code_lifetime: default_code_lifetime(),
            token_lifetime_secs: default_token_lifetime(),
            scope: default_scope(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            credential_ttl: default_credential_ttl(),
            code_reap_interval: default_reap_interval(),
        }
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret_id: default_rotation_secret_id(),
            interval: default_rotation_interval(),
        }
    }
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_shopify_base_url(),
            access_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Checks cross-field consistency beyond what serde enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.client.client_id.is_empty() {
            return Err("client.client_id must not be empty".into());
        }
        if self.client.redirect_uri.is_empty() {
            return Err("client.redirect_uri must not be empty".into());
        }
        if self.oauth.code_lifetime.is_zero() {
            return Err("oauth.code_lifetime must be > 0".into());
        }
        if self.oauth.token_lifetime_secs == 0 {
            return Err("oauth.token_lifetime_secs must be > 0".into());
        }
        if self.shopify.base_url.is_empty() {
            return Err("shopify.base_url must not be empty".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }

    /// Socket address the server binds to.
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

/// Loads configuration from `path`, falling back to defaults when the file
/// does not exist, then applies environment overrides.
///
/// # Errors
///
/// Fails on an unreadable or unparseable file.
pub fn load_config(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) if Path::new(path).exists() => {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        }
        _ => AppConfig::default(),
    };

    if let Ok(secret) = std::env::var("SHOPGATE_CLIENT_SECRET") {
        if !secret.is_empty() {
            config.client.client_secret = Some(secret);
        }
    }
    if let Ok(token) = std::env::var("SHOPGATE_SHOPIFY_TOKEN") {
        if !token.is_empty() {
            config.shopify.access_token = Some(token);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(AppConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_addr_parses() {
        let config = AppConfig::default();
        assert_eq!(config.addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
port = 9090

[client]
client_id = "my-shop"

[oauth]
code_lifetime = "5m"

[rotation]
enabled = true
interval = "30d"
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.client.client_id, "my-shop");
        assert_eq!(config.oauth.code_lifetime, Duration::from_secs(300));
        assert!(config.rotation.enabled);
        assert_eq!(
            config.rotation.interval,
            Duration::from_secs(30 * 24 * 60 * 60)
        );
        // Untouched sections keep their defaults.
        assert_eq!(config.oauth.scope, "read write");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config(Some("/nonexistent/shopgate.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
