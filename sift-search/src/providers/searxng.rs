//! SearXNG provider: primary source, aggregates several upstream engines.
//!
//! Talks to a self-hosted instance's JSON API (`/search?format=json`).

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::{positional_score, text_field, truncate_chars, CandidateResult, ProviderKind};

/// SearXNG JSON API adapter.
pub struct SearXngProvider {
    client: reqwest::Client,
    base_url: String,
    max_content_chars: usize,
}

impl SearXngProvider {
    /// Create an adapter pointing at `config.searxng_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            base_url: config.searxng_url.trim_end_matches('/').to_string(),
            max_content_chars: config.max_content_chars,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearXngResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[async_trait]
impl SearchProvider for SearXngProvider {
    fn name(&self) -> &str {
        ProviderKind::SearXng.name()
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        tracing::trace!(query, "SearXNG search");

        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("format", "json"), ("language", "en")]);
        let body = http::fetch_body(request, "SearXNG", http::RequestProfile::JsonApi).await?;

        parse_searxng_json(&body, max_results, self.max_content_chars)
    }
}

/// Parse a SearXNG JSON body into candidate results.
///
/// Entries without a string title or url are skipped without failing the
/// call, and skipped entries do not count against `max_results`. Empty
/// content falls back to the title. A positive upstream score is kept,
/// otherwise the score decays with upstream position.
pub(crate) fn parse_searxng_json(
    body: &str,
    max_results: usize,
    max_content_chars: usize,
) -> Result<Vec<CandidateResult>, SearchError> {
    let parsed: SearXngResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("SearXNG JSON: {e}")))?;

    let results: Vec<CandidateResult> = parsed
        .results
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let title = text_field(entry, "title")?;
            let url = text_field(entry, "url")?;
            let content = text_field(entry, "content").unwrap_or(title);
            let score = match entry.get("score").and_then(serde_json::Value::as_f64) {
                Some(s) if s > 0.0 => s,
                _ => positional_score(0.95, 0.03, position),
            };
            Some(CandidateResult::new(
                title,
                url,
                truncate_chars(content, max_content_chars),
                ProviderKind::SearXng.name(),
                score,
            ))
        })
        .take(max_results)
        .collect();

    tracing::debug!(count = results.len(), "SearXNG results parsed");
    Ok(results)
}
