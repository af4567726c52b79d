//! Brave Search API provider: independent index behind a subscription token.
//!
//! Unlike the scraped providers this one needs credentials. Without a
//! configured token it reports zero results and never touches the network,
//! so the cascade simply moves on.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::{positional_score, text_field, truncate_chars, CandidateResult, ProviderKind};

const BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// Brave Search web API adapter.
pub struct BraveApiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_content_chars: usize,
}

impl BraveApiProvider {
    /// Create an adapter using `config.brave_api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            endpoint: BRAVE_ENDPOINT.to_string(),
            api_key: config
                .brave_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            max_content_chars: config.max_content_chars,
        })
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Whether a subscription token is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

impl std::fmt::Debug for BraveApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveApiProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[async_trait]
impl SearchProvider for BraveApiProvider {
    fn name(&self) -> &str {
        ProviderKind::BraveApi.name()
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("Brave API key not configured, skipping");
            return Ok(Vec::new());
        };
        tracing::trace!(query, "Brave API search");

        let count = max_results.to_string();
        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("count", count.as_str())])
            .header("X-Subscription-Token", api_key);
        let body = http::fetch_body(request, "Brave API", http::RequestProfile::JsonApi).await?;

        parse_brave_json(&body, max_results, self.max_content_chars)
    }
}

/// Parse a Brave web search JSON body into candidate results.
///
/// Entries lacking a string title or url are skipped before the
/// `max_results` cut. Scores decay with the upstream position.
pub(crate) fn parse_brave_json(
    body: &str,
    max_results: usize,
    max_content_chars: usize,
) -> Result<Vec<CandidateResult>, SearchError> {
    let parsed: BraveResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("Brave API JSON: {e}")))?;

    let entries = parsed.web.map(|w| w.results).unwrap_or_default();
    let results: Vec<CandidateResult> = entries
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| {
            let title = text_field(entry, "title")?;
            let url = text_field(entry, "url")?;
            Some(CandidateResult::new(
                title,
                url,
                truncate_chars(text_field(entry, "description").unwrap_or_default(), max_content_chars),
                ProviderKind::BraveApi.name(),
                positional_score(0.9, 0.04, position),
            ))
        })
        .take(max_results)
        .collect();

    tracing::debug!(count = results.len(), "Brave API results parsed");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = r#"{
        "web": {"results": [
            {"title": "Nuclear power", "url": "https://en.wikipedia.org/wiki/Nuclear_power", "description": "Nuclear power is the use of nuclear reactions", "age": "2 days"},
            {"title": "", "url": "https://no-title.com", "description": "x"},
            {"title": "IEA report", "url": "https://www.iea.org/reports/nuclear", "description": "Data and statistics"}
        ]}
    }"#;

    #[test]
    fn parse_skips_entries_without_title() {
        let results = parse_brave_json(BODY, 10, 500).expect("should parse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].provider, "BraveAPI");
        assert!((results[0].score - 0.9).abs() < 1e-9);
        // Position counts the skipped entry.
        assert!((results[1].score - 0.82).abs() < 1e-9);
    }

    #[test]
    fn parse_skips_entries_with_wrong_field_types() {
        let body = r#"{"web": {"results": [
            {"title": {"text": "Nuclear"}, "url": "https://object-title.com"},
            {"title": "IEA report", "url": "https://www.iea.org/reports/nuclear", "description": 12}
        ]}}"#;
        let results = parse_brave_json(body, 10, 500).expect("one bad entry must not fail the call");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://www.iea.org/reports/nuclear");
        assert!(results[0].content.is_empty());
    }

    #[test]
    fn parse_limit_applies_after_skipping() {
        let results = parse_brave_json(BODY, 2, 500).expect("should parse");
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].title, "IEA report");
    }

    #[test]
    fn parse_missing_web_section_is_empty() {
        let results = parse_brave_json(r#"{"type":"search"}"#, 10, 500).expect("should parse");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn missing_key_skips_network() {
        let provider = BraveApiProvider::new(&SearchConfig::default())
            .expect("provider")
            .with_endpoint("http://127.0.0.1:9/never-called");
        assert!(!provider.is_enabled());
        let results = provider.search("anything", 5).await.expect("no error");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_sends_subscription_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("X-Subscription-Token", "test-token"))
            .and(query_param("count", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
            .mount(&server)
            .await;

        let config = SearchConfig {
            brave_api_key: Some("test-token".into()),
            ..Default::default()
        };
        let provider = BraveApiProvider::new(&config)
            .expect("provider")
            .with_endpoint(format!("{}/res/v1/web/search", server.uri()));
        let results = provider.search("nuclear", 4).await.expect("search ok");
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn rate_limited_response_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let config = SearchConfig {
            brave_api_key: Some("test-token".into()),
            ..Default::default()
        };
        let provider = BraveApiProvider::new(&config)
            .expect("provider")
            .with_endpoint(server.uri());
        let err = provider.search("q", 4).await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[test]
    fn debug_redacts_key() {
        let config = SearchConfig {
            brave_api_key: Some("super-secret".into()),
            ..Default::default()
        };
        let provider = BraveApiProvider::new(&config).expect("provider");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
