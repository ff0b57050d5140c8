//! GitHub API client for authenticated operations.
//!
//! A [`GitHubClient`] is one client session: it owns an HTTP connection pool,
//! the app's [`JwtGenerator`], and a rate-limit snapshot updated from every
//! response. The endpoint builds a fresh session per delivery and drops it when
//! the delivery completes. The [`ResponseCache`] is the only state shared
//! between sessions.
//!
//! Operations are split by resource:
//! - [`installation`] exchanges the app JWT for an installation token
//! - [`issue`] creates and updates issues
//! - [`repository`] reads file contents
//! - [`status`] posts commit statuses

pub mod cache;
pub mod installation;
pub mod issue;
pub mod rate_limit;
pub mod repository;
pub mod status;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use reqwest::header::{HeaderMap, ACCEPT, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::JwtGenerator;
use crate::error::ApiError;

pub use cache::{CachedResponse, ResponseCache};
pub use installation::InstallationTokenResponse;
pub use issue::{CreateIssueRequest, Issue, UpdateIssueRequest};
pub use rate_limit::{parse_rate_limit_from_headers, RateLimit};
pub use repository::{DirectoryEntry, FileContent, RepositoryContent};
pub use status::{CommitStatus, CreateStatusRequest, StatusState, MAX_DESCRIPTION_CHARS};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";

/// Configuration for GitHub API client behavior.
///
/// # Examples
///
/// ```
/// use github_bot_sdk::client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(10))
///     .with_github_api_url("https://github.example.com/api/v3");
///
/// assert_eq!(config.cache_capacity, 500);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string for API requests (required by GitHub)
    pub user_agent: String,
    /// Upper bound on every outbound request, including the body read
    pub timeout: Duration,
    /// GitHub API base URL
    pub github_api_url: String,
    /// Number of conditional-GET entries kept by a cache built from this config
    pub cache_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("github-bot-sdk/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            github_api_url: "https://api.github.com".to_string(),
            cache_capacity: 500,
        }
    }
}

impl ClientConfig {
    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the GitHub API base URL. A trailing slash is ignored.
    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the response cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

/// GitHub API client session.
///
/// # Examples
///
/// ```no_run
/// # use github_bot_sdk::client::{ClientConfig, GitHubClient, ResponseCache};
/// # use github_bot_sdk::auth::JwtGenerator;
/// # use std::sync::Arc;
/// # async fn example(jwt: Arc<dyn JwtGenerator>) -> Result<(), Box<dyn std::error::Error>> {
/// let cache = Arc::new(ResponseCache::new(500));
/// let client = GitHubClient::builder(jwt)
///     .config(ClientConfig::default())
///     .cache(cache)
///     .build()?;
///
/// if let Some(limit) = client.rate_limit() {
///     println!("{} requests left", limit.remaining());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GitHubClient {
    jwt: Arc<dyn JwtGenerator>,
    http_client: reqwest::Client,
    config: ClientConfig,
    cache: Arc<ResponseCache>,
    rate_limit: Arc<RwLock<Option<RateLimit>>>,
}

impl GitHubClient {
    /// Create a new builder for constructing a GitHub client.
    pub fn builder(jwt: Arc<dyn JwtGenerator>) -> GitHubClientBuilder {
        GitHubClientBuilder::new(jwt)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The most recent rate-limit figures GitHub reported to this session.
    ///
    /// Advisory only. `None` until a response carrying `X-RateLimit-*` headers
    /// has been received.
    pub fn rate_limit(&self) -> Option<RateLimit> {
        match self.rate_limit.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn jwt_generator(&self) -> &dyn JwtGenerator {
        self.jwt.as_ref()
    }

    /// Resolve a path against the API base URL. Absolute URLs are used verbatim.
    pub(crate) fn resolve_url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("https://") || path_or_url.starts_with("http://") {
            path_or_url.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.github_api_url.trim_end_matches('/'),
                path_or_url.trim_start_matches('/')
            )
        }
    }

    fn record_rate_limit(&self, headers: &HeaderMap) {
        if let Some(limit) = parse_rate_limit_from_headers(headers) {
            match self.rate_limit.write() {
                Ok(mut guard) => *guard = Some(limit),
                Err(poisoned) => *poisoned.into_inner() = Some(limit),
            }
        }
    }

    fn request(&self, method: Method, url: &str, bearer: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .bearer_auth(bearer)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
            .header(API_VERSION_HEADER, API_VERSION)
    }

    /// GET a JSON resource, revalidating against the response cache.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path_or_url: &str,
        bearer: &str,
    ) -> Result<T, ApiError> {
        let url = self.resolve_url(path_or_url);
        let cached = self.cache.get(&url);

        let mut request = self.request(Method::GET, &url, bearer);
        if let Some(entry) = &cached {
            if let Some(etag) = &entry.etag {
                request = request.header(IF_NONE_MATCH, etag);
            } else if let Some(last_modified) = &entry.last_modified {
                request = request.header(IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = request.send().await?;
        self.record_rate_limit(response.headers());

        if response.status() == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached {
                debug!(url = %url, "Serving cached response");
                return Ok(serde_json::from_slice(&entry.body)?);
            }
        }

        let response = error_for_status(response).await?;
        let etag = header_string(response.headers(), ETAG.as_str());
        let last_modified = header_string(response.headers(), LAST_MODIFIED.as_str());
        let body = response.bytes().await?;

        let parsed = serde_json::from_slice(&body)?;
        if etag.is_some() || last_modified.is_some() {
            self.cache.put(
                url,
                CachedResponse {
                    etag,
                    last_modified,
                    body,
                },
            );
        }
        Ok(parsed)
    }

    /// Send a JSON body and decode the JSON response.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path_or_url: &str,
        bearer: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.resolve_url(path_or_url);
        let response = self.request(method, &url, bearer).json(body).send().await?;
        self.record_rate_limit(response.headers());

        let response = error_for_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("config", &self.config)
            .field("app_id", &self.jwt.app_id())
            .field("rate_limit", &self.rate_limit())
            .finish_non_exhaustive()
    }
}

/// Map a non-success response onto an `ApiError`.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let quota_exhausted =
        header_string(response.headers(), "x-ratelimit-remaining").as_deref() == Some("0");
    let reset_at = header_string(response.headers(), "x-ratelimit-reset")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or(text);

    let error = match status.as_u16() {
        401 => ApiError::AuthenticationFailed,
        403 if quota_exhausted => ApiError::RateLimitExceeded {
            reset_at: reset_at.unwrap_or_else(Utc::now),
        },
        403 => ApiError::AuthorizationFailed,
        404 => ApiError::NotFound,
        422 => ApiError::InvalidRequest { message },
        code => ApiError::HttpError {
            status: code,
            message,
        },
    };

    if error.is_transient() {
        warn!(status = status.as_u16(), error = %error, "GitHub API request failed");
    }
    Err(error)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Builder for constructing `GitHubClient` instances.
pub struct GitHubClientBuilder {
    jwt: Arc<dyn JwtGenerator>,
    config: Option<ClientConfig>,
    cache: Option<Arc<ResponseCache>>,
}

impl GitHubClientBuilder {
    fn new(jwt: Arc<dyn JwtGenerator>) -> Self {
        Self {
            jwt,
            config: None,
            cache: None,
        }
    }

    /// Set the client configuration.
    ///
    /// If not set, uses `ClientConfig::default()`.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Share a response cache with other sessions.
    ///
    /// If not set, the session gets a private cache sized from the config.
    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the GitHub client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Configuration` if the HTTP client cannot be created.
    pub fn build(self) -> Result<GitHubClient, ApiError> {
        let config = self.config.unwrap_or_default();

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResponseCache::new(config.cache_capacity)));

        Ok(GitHubClient {
            jwt: self.jwt,
            http_client,
            config,
            cache,
            rate_limit: Arc::new(RwLock::new(None)),
        })
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
