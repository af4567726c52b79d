//! Trait definition for pluggable search provider adapters.
//!
//! Each provider (SearXNG, Brave API, DuckDuckGo Instant Answer, DuckDuckGo
//! HTML) implements [`SearchProvider`] and normalises its own response shape
//! into [`CandidateResult`] values.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::providers::{BraveApiProvider, DuckDuckGoHtmlProvider, InstantAnswerProvider, SearXngProvider};
use crate::types::{CandidateResult, ProviderKind};

/// A pluggable search provider.
///
/// Implementors own:
///
/// - request construction and authentication
/// - response decoding into [`CandidateResult`]
/// - skipping malformed entries instead of failing the call
///
/// All implementations must be `Send + Sync` so the cascade can be shared
/// across concurrent sub-query branches.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns the provider name used in logs and on produced results.
    fn name(&self) -> &str;

    /// Run a search and return at most `max_results` normalised results.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the request fails, times out, or the
    /// body cannot be decoded at all.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateResult>, SearchError>;
}

/// Instantiate the adapter for `kind` using the shared search config.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the HTTP client cannot be built.
pub fn build_provider(
    kind: ProviderKind,
    config: &SearchConfig,
) -> Result<Arc<dyn SearchProvider>, SearchError> {
    let provider: Arc<dyn SearchProvider> = match kind {
        ProviderKind::SearXng => Arc::new(SearXngProvider::new(config)?),
        ProviderKind::BraveApi => Arc::new(BraveApiProvider::new(config)?),
        ProviderKind::InstantAnswer => Arc::new(InstantAnswerProvider::new(config)?),
        ProviderKind::DuckDuckGoHtml => Arc::new(DuckDuckGoHtmlProvider::new(config)?),
    };
    Ok(provider)
}

/// Instantiate every provider listed in `config.providers`, in order.
///
/// # Errors
///
/// Returns the first construction error.
pub fn build_providers(config: &SearchConfig) -> Result<Vec<Arc<dyn SearchProvider>>, SearchError> {
    config
        .providers
        .iter()
        .map(|kind| build_provider(*kind, config))
        .collect()
}
