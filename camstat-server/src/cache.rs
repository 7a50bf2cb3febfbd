//! Caching layer for search results.
//!
//! Searches over the same data with the same request always give the same
//! answer, so finished reports and route journey lists are cached keyed by
//! the canonical JSON of the request. Entries expire after a TTL so a
//! reloaded store is eventually picked up.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use serde::Serialize;

use crate::route::FinePass;
use crate::search::SearchReport;

/// Cache key: request kind plus the request serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Build a key for a request of the given kind.
    ///
    /// Returns `None` if the request cannot be serialized.
    pub fn new<T: Serialize>(kind: &str, request: &T) -> Option<Self> {
        let json = serde_json::to_string(request).ok()?;
        Some(Self(format!("{kind}:{json}")))
    }
}

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per kind.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_capacity: 256,
        }
    }
}

/// Cache for search results.
pub struct QueryCache {
    reports: MokaCache<QueryKey, Arc<SearchReport>>,
    journeys: MokaCache<QueryKey, Arc<FinePass>>,
}

impl QueryCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let reports = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let journeys = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { reports, journeys }
    }

    pub async fn get_report(&self, key: &QueryKey) -> Option<Arc<SearchReport>> {
        self.reports.get(key).await
    }

    pub async fn insert_report(&self, key: QueryKey, report: Arc<SearchReport>) {
        self.reports.insert(key, report).await;
    }

    pub async fn get_journeys(&self, key: &QueryKey) -> Option<Arc<FinePass>> {
        self.journeys.get(key).await
    }

    pub async fn insert_journeys(&self, key: QueryKey, pass: Arc<FinePass>) {
        self.journeys.insert(key, pass).await;
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.reports.entry_count() + self.journeys.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.reports.invalidate_all();
        self.journeys.invalidate_all();
    }
}
