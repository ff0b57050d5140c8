//! Rate limit tracking for GitHub API operations.
//!
//! GitHub reports the caller's quota on every REST response. The client keeps
//! the latest figures as an advisory snapshot; nothing is throttled on them.

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

/// Rate limit information from GitHub API response headers.
///
/// GitHub includes rate limit information in HTTP response headers:
/// - `X-RateLimit-Limit`: Maximum requests allowed per hour
/// - `X-RateLimit-Remaining`: Requests remaining in current window
/// - `X-RateLimit-Reset`: Unix timestamp when the rate limit resets
///
/// # Examples
///
/// ```
/// use github_bot_sdk::client::RateLimit;
/// use chrono::{Utc, Duration};
///
/// let reset_time = Utc::now() + Duration::hours(1);
/// let rate_limit = RateLimit::new(5000, 4500, reset_time, "core");
///
/// assert!(!rate_limit.is_exhausted());
/// assert_eq!(rate_limit.used(), 500);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    limit: u32,
    remaining: u32,
    reset_at: DateTime<Utc>,
    resource: String,
}

impl RateLimit {
    pub fn new(
        limit: u32,
        remaining: u32,
        reset_at: DateTime<Utc>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
            resource: resource.into(),
        }
    }

    /// Get the maximum number of requests allowed.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Get the number of requests remaining.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Requests consumed in the current window.
    pub fn used(&self) -> u32 {
        self.limit.saturating_sub(self.remaining)
    }

    /// Get when the rate limit resets.
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.reset_at
    }

    /// Get the resource this rate limit applies to, e.g. `core`.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Check if the rate limit is exhausted (no requests remaining).
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Parse rate limit information from HTTP response headers.
///
/// `X-RateLimit-Resource` is optional and defaults to `core`.
///
/// Returns `None` if any of limit, remaining, or reset is missing or invalid.
pub fn parse_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimit> {
    fn number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
        headers.get(name)?.to_str().ok()?.trim().parse().ok()
    }

    let limit: u32 = number(headers, "x-ratelimit-limit")?;
    let remaining: u32 = number(headers, "x-ratelimit-remaining")?;
    let reset: i64 = number(headers, "x-ratelimit-reset")?;
    let reset_at = Utc.timestamp_opt(reset, 0).single()?;

    let resource = headers
        .get("x-ratelimit-resource")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("core");

    Some(RateLimit::new(limit, remaining, reset_at, resource))
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
