//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::{CacheConfig, QueryCache};
use crate::domain::TimeChainFormat;
use crate::store::MemoryStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Loaded journey rows
    pub store: Arc<MemoryStore>,

    /// Layout of stored time text
    pub format: TimeChainFormat,

    /// Cached search results
    pub cache: Arc<QueryCache>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: MemoryStore, format: TimeChainFormat, cache: &CacheConfig) -> Self {
        Self {
            store: Arc::new(store),
            format,
            cache: Arc::new(QueryCache::new(cache)),
        }
    }
}
