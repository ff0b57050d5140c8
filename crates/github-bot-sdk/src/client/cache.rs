//! Process-wide cache of conditional-GET validators.
//!
//! GitHub answers a request carrying `If-None-Match` or `If-Modified-Since`
//! with `304 Not Modified` when nothing changed, and 304s do not count
//! against the rate limit. The cache keeps the validators and body of recent
//! GET responses keyed by URL so later sessions can revalidate instead of
//! refetching.
//!
//! The cache is advisory: a miss, an eviction, or a disabled cache only costs
//! a full request.

use bytes::Bytes;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Validators and body of a cached GET response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: Bytes,
}

/// Bounded LRU cache shared across client sessions.
///
/// # Examples
///
/// ```
/// use github_bot_sdk::client::{CachedResponse, ResponseCache};
///
/// let cache = ResponseCache::new(2);
/// cache.put(
///     "https://api.github.com/repos/o/r".to_string(),
///     CachedResponse { etag: Some("\"abc\"".to_string()), last_modified: None, body: "{}".into() },
/// );
///
/// assert_eq!(cache.len(), 1);
/// assert!(cache.get("https://api.github.com/repos/o/r").is_some());
/// ```
#[derive(Debug)]
pub struct ResponseCache {
    // None when constructed with capacity 0
    entries: Option<Mutex<LruCache<String, CachedResponse>>>,
}

impl ResponseCache {
    /// Create a cache holding at most `capacity` responses.
    ///
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, CachedResponse>>> {
        self.entries
            .as_ref()
            .map(|m| m.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    /// Look up an entry, marking it most recently used.
    pub fn get(&self, url: &str) -> Option<CachedResponse> {
        self.lock()?.get(url).cloned()
    }

    /// Insert or replace an entry, evicting the least recently used if full.
    pub fn put(&self, url: String, response: CachedResponse) {
        if let Some(mut entries) = self.lock() {
            entries.put(url, response);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries; 0 when caching is disabled.
    pub fn capacity(&self) -> usize {
        self.lock().map(|entries| entries.cap().get()).unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
