//! # sift-search
//!
//! Evidence retrieval for sift: an ordered cascade over independent web
//! search providers, plus the URL normalisation and deduplication the
//! downstream ranking stages rely on.
//!
//! ## Design
//!
//! - Providers (SearXNG, Brave API, DuckDuckGo Instant Answer, DuckDuckGo
//!   HTML) are tried strictly in priority order
//! - The cascade stops as soon as enough results have accumulated
//! - A failing provider is logged and skipped, never fatal on its own
//! - Per-provider circuit breaking, fixed-interval rate limiting and a TTL
//!   cache are owned by each [`ProviderCascade`] instance
//!
//! ## Security
//!
//! - API keys are never logged or serialised back out
//! - No network listeners; this is a library, not a server
//! - Search queries are logged only at trace level

pub mod cache;
pub mod cascade;
pub mod circuit_breaker;
pub mod config;
pub mod dedup;
pub mod error;
pub mod http;
pub mod provider;
pub mod providers;
pub mod types;
pub mod url_normalize;

pub use cascade::ProviderCascade;
pub use config::SearchConfig;
pub use dedup::deduplicate;
pub use error::{Result, SearchError};
pub use provider::SearchProvider;
pub use types::{CandidateResult, ProviderKind};

/// Run a one-off cascade search and deduplicate the results.
///
/// Builds a fresh [`ProviderCascade`] from `config`, so nothing (cache,
/// breaker state) carries over between calls. Long-lived callers should
/// keep a cascade around instead.
///
/// # Errors
///
/// Returns [`SearchError::Config`] for invalid configuration and
/// [`SearchError::AllProvidersFailed`] if every attempted provider fails.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> sift_search::Result<()> {
/// let config = sift_search::SearchConfig::default();
/// let results = sift_search::search("rust programming", &config).await?;
/// for result in &results {
///     println!("{}: {}", result.title, result.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &SearchConfig) -> Result<Vec<CandidateResult>> {
    tracing::trace!(query, "one-off cascade search");
    let cascade = ProviderCascade::from_config(config)?;
    let results = cascade.search(query, config.max_results).await?;
    Ok(deduplicate(results))
}
