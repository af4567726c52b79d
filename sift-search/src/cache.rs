//! In-memory TTL cache for cascade results.
//!
//! Keyed by the (lowercased, trimmed query, requested result count) pair.
//! Each cascade owns its own cache; there is no process-wide instance.

use std::time::Duration;

use moka::future::Cache;

use crate::types::CandidateResult;

/// Maximum number of cached result sets.
const MAX_CACHE_ENTRIES: u64 = 256;

/// Cache key: normalised query plus requested result count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    max_results: usize,
}

impl CacheKey {
    /// Build a key. Queries differing only in case or surrounding
    /// whitespace share an entry.
    pub fn new(query: &str, max_results: usize) -> Self {
        Self {
            query: query.trim().to_lowercase(),
            max_results,
        }
    }
}

/// TTL cache of cascade outputs. A zero TTL disables it entirely.
#[derive(Clone)]
pub struct ResultCache {
    inner: Option<Cache<CacheKey, Vec<CandidateResult>>>,
}

impl ResultCache {
    /// Create a cache whose entries live for `ttl_seconds`.
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    /// Whether caching is active.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Look up cached results.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<CandidateResult>> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    /// Store results. Empty result sets are not cached so a later call can
    /// retry providers that were down.
    pub async fn insert(&self, key: CacheKey, results: Vec<CandidateResult>) {
        if results.is_empty() {
            return;
        }
        if let Some(cache) = &self.inner {
            cache.insert(key, results).await;
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<CandidateResult> {
        vec![CandidateResult::new(
            "Rust",
            "https://rust-lang.org",
            "Rust language",
            "SearXNG",
            0.9,
        )]
    }

    #[test]
    fn cache_key_normalises_query() {
        assert_eq!(CacheKey::new("  Rust Lang ", 5), CacheKey::new("rust lang", 5));
        assert_ne!(CacheKey::new("rust", 5), CacheKey::new("rust", 15));
        assert_ne!(CacheKey::new("rust", 5), CacheKey::new("python", 5));
    }

    #[tokio::test]
    async fn insert_then_get_hits() {
        let cache = ResultCache::new(60);
        let key = CacheKey::new("rust", 5);
        cache.insert(key.clone(), sample()).await;
        let hit = cache.get(&key).await.expect("cache hit");
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].url, "https://rust-lang.org");
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = ResultCache::new(60);
        assert!(cache.get(&CacheKey::new("nothing", 5)).await.is_none());
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = ResultCache::new(0);
        assert!(!cache.is_enabled());
        let key = CacheKey::new("rust", 5);
        cache.insert(key.clone(), sample()).await;
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn empty_results_are_not_cached() {
        let cache = ResultCache::new(60);
        let key = CacheKey::new("rust", 5);
        cache.insert(key.clone(), vec![]).await;
        assert!(cache.get(&key).await.is_none());
    }
}
