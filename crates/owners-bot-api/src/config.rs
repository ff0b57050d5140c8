//! Configuration types for the HTTP service
//!
//! Configuration is layered with the `config` crate. Later sources override
//! earlier ones:
//!
//! 1. `/etc/owners-bot/service.yaml`
//! 2. `./config/service.yaml`
//! 3. the file named by `OWNERS_BOT_CONFIG_FILE` (required when set)
//! 4. `OWNERS_BOT__SECTION__KEY` environment variables
//! 5. the legacy single-name variables (`GH_SECRET`, `GH_API_URL`, `PORT`,
//!    `GH_APP_ID`, `GH_PRIVATE_KEY`, `GH_PRIVATE_KEY_PATH`)
//!
//! Every field carries a serde default, so an unconfigured environment yields
//! a config that only fails [`ServiceConfig::validate`] for the credentials.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use github_bot_sdk::auth::{GitHubAppId, PrivateKey, RS256JwtGenerator};
use github_bot_sdk::ClientConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::ConfigError;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_FILE_ENV: &str = "OWNERS_BOT_CONFIG_FILE";

/// Prefix for structured environment overrides (`OWNERS_BOT__SERVER__PORT`).
pub const ENV_PREFIX: &str = "OWNERS_BOT";

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// GitHub App credentials and API client settings
    pub github: GitHubConfig,

    /// Webhook endpoint settings
    pub webhook: WebhookConfig,

    /// Behaviour of the bot's handlers
    pub bot: BotConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 25 * 1024 * 1024, // GitHub caps payloads at 25MB
        }
    }
}

/// GitHub App configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL; point at `https://HOST/api/v3` for GitHub Enterprise
    pub api_url: String,

    /// App ID from the app's settings page
    pub app_id: Option<u64>,

    /// PEM-encoded private key, inline
    pub private_key: Option<String>,

    /// Path to the PEM-encoded private key, used when `private_key` is unset
    pub private_key_path: Option<PathBuf>,

    /// User agent sent with every API request
    pub user_agent: String,

    /// Per-request timeout for outbound API calls
    pub request_timeout_seconds: u64,

    /// Entries kept in the conditional-GET response cache (0 disables it)
    pub cache_capacity: usize,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            app_id: None,
            private_key: None,
            private_key_path: None,
            user_agent: "owners-bot".to_string(),
            request_timeout_seconds: 30,
            cache_capacity: 500,
        }
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("app_id", &self.app_id)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<REDACTED>"),
            )
            .field("private_key_path", &self.private_key_path)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("cache_capacity", &self.cache_capacity)
            .finish()
    }
}

impl GitHubConfig {
    /// Settings for the per-delivery API client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_github_api_url(self.api_url.clone())
            .with_user_agent(self.user_agent.clone())
            .with_timeout(Duration::from_secs(self.request_timeout_seconds))
            .with_cache_capacity(self.cache_capacity)
    }

    /// Load the app's private key and build the JWT signer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when no app id or key is configured,
    /// `ConfigError::KeyFile` when the key file cannot be read and
    /// `ConfigError::Invalid` when the key is not a usable RSA key.
    pub fn jwt_generator(&self) -> Result<RS256JwtGenerator, ConfigError> {
        let app_id = self.app_id.ok_or_else(|| ConfigError::Missing {
            key: "github.app_id".to_string(),
        })?;

        let pem = match (&self.private_key, &self.private_key_path) {
            (Some(pem), _) if !pem.trim().is_empty() => pem.clone(),
            (_, Some(path)) => {
                std::fs::read_to_string(path).map_err(|e| ConfigError::KeyFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
            _ => {
                return Err(ConfigError::Missing {
                    key: "github.private_key".to_string(),
                })
            }
        };

        let key = PrivateKey::from_pem(&pem).map_err(|e| ConfigError::Invalid {
            message: format!("github private key: {}", e),
        })?;

        Ok(RS256JwtGenerator::new(GitHubAppId::new(app_id), key))
    }
}

/// Webhook endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Shared secret configured on the GitHub App
    pub secret: Option<String>,

    /// Pause between accepting a delivery and dispatching it, in milliseconds
    pub dispatch_delay_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
            secret: None,
            dispatch_delay_ms: 1000,
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("endpoint_path", &self.endpoint_path)
            .field("secret", &self.secret.as_ref().map(|_| "<REDACTED>"))
            .field("dispatch_delay_ms", &self.dispatch_delay_ms)
            .finish()
    }
}

impl WebhookConfig {
    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }
}

/// Handler behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Name used in the title of the installation issue
    pub name: String,

    /// Commit status context for the CODEOWNERS verdict
    pub status_context: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "owners-bot".to_string(),
            status_context: "owners-bot/codeowners".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// A malformed file, an explicit file that does not exist, or a value that
    /// cannot be coerced to its field type is an error. Absent optional files
    /// are not.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit_path = std::env::var(CONFIG_FILE_ENV)
            .ok()
            .filter(|p| !p.is_empty());

        let mut config = Self::load_layered(explicit_path.as_deref())?;
        config.apply_legacy_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load files and `OWNERS_BOT__*` variables, without the legacy variables.
    pub fn load_layered(explicit_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/owners-bot/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(path) = explicit_path {
            info!(path = %path, "Loading configuration from explicit path");
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Overlay the single-name variables older deployments use.
    ///
    /// `lookup` resolves a variable name; empty values are ignored.
    pub fn apply_legacy_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(secret) = get("GH_SECRET") {
            self.webhook.secret = Some(secret);
        }
        if let Some(url) = get("GH_API_URL") {
            self.github.api_url = url.trim().to_string();
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::LegacyVariable {
                    name: "PORT".to_string(),
                    message: format!("'{}' is not a valid port", port),
                })?;
        }
        if let Some(app_id) = get("GH_APP_ID") {
            let id: GitHubAppId =
                app_id
                    .parse()
                    .map_err(|e: github_bot_sdk::ValidationError| {
                        ConfigError::LegacyVariable {
                            name: "GH_APP_ID".to_string(),
                            message: e.to_string(),
                        }
                    })?;
            self.github.app_id = Some(id.as_u64());
        }
        if let Some(key) = get("GH_PRIVATE_KEY") {
            self.github.private_key = Some(key);
        }
        if let Some(path) = get("GH_PRIVATE_KEY_PATH") {
            self.github.private_key_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Check the configuration for values the service cannot run with.
    ///
    /// A missing webhook secret is only warned about: the service starts, and
    /// every delivery is rejected until a secret is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        if !(self.github.api_url.starts_with("https://")
            || self.github.api_url.starts_with("http://"))
        {
            return Err(ConfigError::Invalid {
                message: format!(
                    "github.api_url must be an http(s) URL, got '{}'",
                    self.github.api_url
                ),
            });
        }

        if !self.webhook.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.endpoint_path must start with '/', got '{}'",
                    self.webhook.endpoint_path
                ),
            });
        }

        if self.github.app_id.is_none() {
            return Err(ConfigError::Missing {
                key: "github.app_id".to_string(),
            });
        }

        let has_key = self
            .github
            .private_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
            || self.github.private_key_path.is_some();
        if !has_key {
            return Err(ConfigError::Missing {
                key: "github.private_key".to_string(),
            });
        }

        if self.webhook.secret.as_deref().is_none_or(str::is_empty) {
            warn!("No webhook secret configured; every delivery will be rejected");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
