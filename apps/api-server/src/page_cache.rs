//! Time-bounded cache of rendered feed pages.
//!
//! Entries live for the configured interval and are not invalidated by
//! writes; readers see the cached body until it expires or the cache is cleared.

use std::sync::Arc;
use std::time::Duration;

use actix_web::HttpRequest;

use yatube_core::ports::{Cache, CacheError};

const KEY_PREFIX: &str = "page:";

#[derive(Clone)]
pub struct PageCache {
    cache: Arc<dyn Cache>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(cache: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cache key for a request: its full path including the query string.
    pub fn key_for(req: &HttpRequest) -> String {
        let path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        format!("{}{}", KEY_PREFIX, path)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let hit = self.cache.get(key).await;
        tracing::debug!(key = %key, hit = hit.is_some(), "Page cache lookup");
        hit
    }

    /// Store a rendered body. Failures are logged and otherwise ignored.
    pub async fn store(&self, key: &str, body: &str) {
        if let Err(e) = self.cache.set(key, body, Some(self.ttl)).await {
            tracing::warn!(key = %key, error = %e, "Failed to store page in cache");
        }
    }

    pub async fn clear(&self) -> Result<(), CacheError> {
        tracing::info!("Clearing page cache");
        self.cache.clear().await
    }
}
