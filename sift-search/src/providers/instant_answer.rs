//! DuckDuckGo Instant Answer provider.
//!
//! The Instant Answer API returns a direct answer, an abstract and a list
//! of related topics rather than a ranked web result list. Each present
//! piece becomes one candidate.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::{positional_score, text_field, truncate_chars, CandidateResult, ProviderKind};

const INSTANT_ANSWER_ENDPOINT: &str = "https://api.duckduckgo.com/";

/// Title length cap for related-topic results, whose title is the topic text.
const TOPIC_TITLE_CHARS: usize = 100;

/// DuckDuckGo Instant Answer JSON adapter.
pub struct InstantAnswerProvider {
    client: reqwest::Client,
    endpoint: String,
    max_content_chars: usize,
}

impl InstantAnswerProvider {
    /// Create an adapter for the public Instant Answer endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            endpoint: INSTANT_ANSWER_ENDPOINT.to_string(),
            max_content_chars: config.max_content_chars,
        })
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Top-level fields are kept loosely typed. `Answer` is an object for
/// calculator and conversion answers, and `RelatedTopics` mixes plain topics
/// with nested groups.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswerResponse {
    #[serde(default)]
    answer: serde_json::Value,
    #[serde(default)]
    abstract_text: serde_json::Value,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: serde_json::Value,
    #[serde(default)]
    related_topics: serde_json::Value,
}

fn non_blank(value: &serde_json::Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}

#[async_trait]
impl SearchProvider for InstantAnswerProvider {
    fn name(&self) -> &str {
        ProviderKind::InstantAnswer.name()
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        tracing::trace!(query, "Instant Answer search");

        let request = self.client.get(&self.endpoint).query(&[
            ("q", query),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ]);
        let body = http::fetch_body(request, "Instant Answer", http::RequestProfile::JsonApi).await?;

        parse_instant_answer_json(&body, max_results, self.max_content_chars)
    }
}

/// Parse an Instant Answer JSON body.
///
/// Order: direct answer (score 1.0), abstract (0.95), then related topics
/// with decaying scores. A non-string answer is ignored. Topic entries that
/// are nested groups or lack a string `FirstURL`/`Text` pair are skipped.
pub(crate) fn parse_instant_answer_json(
    body: &str,
    max_results: usize,
    max_content_chars: usize,
) -> Result<Vec<CandidateResult>, SearchError> {
    let parsed: InstantAnswerResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::Parse(format!("Instant Answer JSON: {e}")))?;

    let provider = ProviderKind::InstantAnswer.name();
    let mut results = Vec::new();

    if let Some(answer) = non_blank(&parsed.answer) {
        results.push(CandidateResult::new(
            "Direct Answer",
            "https://duckduckgo.com",
            truncate_chars(answer, max_content_chars),
            provider,
            1.0,
        ));
    }

    if let (Some(text), Some(url)) = (non_blank(&parsed.abstract_text), non_blank(&parsed.abstract_url)) {
        results.push(CandidateResult::new(
            "Overview",
            url,
            truncate_chars(text, max_content_chars),
            provider,
            0.95,
        ));
    }

    let topics = parsed.related_topics.as_array().map(Vec::as_slice).unwrap_or_default();
    for (position, topic) in topics.iter().enumerate() {
        if results.len() >= max_results {
            break;
        }
        let (Some(url), Some(text)) = (text_field(topic, "FirstURL"), text_field(topic, "Text")) else {
            continue;
        };
        results.push(CandidateResult::new(
            truncate_chars(text, TOPIC_TITLE_CHARS),
            url,
            truncate_chars(text, max_content_chars),
            provider,
            positional_score(0.9, 0.05, position),
        ));
    }

    results.truncate(max_results);
    tracing::debug!(count = results.len(), "Instant Answer results parsed");
    Ok(results)
}
