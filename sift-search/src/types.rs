//! Core types for retrieved evidence and provider identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single piece of candidate evidence returned by a search provider.
///
/// The same value flows through every pipeline stage. Stages overwrite the
/// score field they own instead of accumulating into it:
///
/// - the reranker owns [`score`](Self::score) (replacing the provider score)
/// - the credibility scorer owns [`credibility`](Self::credibility)
/// - selection only reorders and filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Title of the page or answer.
    pub title: String,
    /// Resolvable URL of the resource. Never empty once produced by a provider.
    pub url: String,
    /// Text snippet or extracted content.
    pub content: String,
    /// Name of the provider that produced this result.
    pub provider: String,
    /// Relevance score. Provider-reported in `[0, 1]` until reranking.
    pub score: f64,
    /// Heuristic trust estimate in `[0, 1]`, `0.0` until scored.
    #[serde(default)]
    pub credibility: f64,
}

impl CandidateResult {
    /// Create a result with the given provider score and no credibility yet.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        provider: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            provider: provider.into(),
            score: score.clamp(0.0, 1.0),
            credibility: 0.0,
        }
    }
}

/// Search providers that sift can cascade through.
///
/// Declaration order is the default priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Self-hosted SearXNG metasearch instance (JSON API).
    SearXng,
    /// Brave Search commercial API. Needs a subscription token.
    BraveApi,
    /// DuckDuckGo Instant Answer API.
    InstantAnswer,
    /// DuckDuckGo HTML endpoint, scraped as a last resort.
    DuckDuckGoHtml,
}

impl ProviderKind {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SearXng => "SearXNG",
            Self::BraveApi => "BraveAPI",
            Self::InstantAnswer => "DDGInstant",
            Self::DuckDuckGoHtml => "DDGHTML",
        }
    }

    /// Returns all providers in default priority order.
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::SearXng,
            Self::BraveApi,
            Self::InstantAnswer,
            Self::DuckDuckGoHtml,
        ]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Truncate `text` to at most `max_chars` characters, appending `...` when cut.
///
/// Cuts on character boundaries so multi-byte text never splits.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Non-blank string field of a loosely typed JSON entry.
///
/// Returns `None` when the key is missing, holds a non-string value, or is
/// whitespace only.
pub(crate) fn text_field<'a>(entry: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Positional fallback score: `start - step * position`, clamped to `[0, 1]`.
pub(crate) fn positional_score(start: f64, step: f64, position: usize) -> f64 {
    (start - step * position as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_new_clamps_provider_score() {
        let high = CandidateResult::new("t", "https://a.com", "c", "SearXNG", 3.5);
        let low = CandidateResult::new("t", "https://a.com", "c", "SearXNG", -1.0);
        assert!((high.score - 1.0).abs() < f64::EPSILON);
        assert!(low.score.abs() < f64::EPSILON);
        assert!(high.credibility.abs() < f64::EPSILON);
    }

    #[test]
    fn candidate_deserializes_without_credibility() {
        let json = r#"{"title":"T","url":"https://x.org","content":"c","provider":"BraveAPI","score":0.4}"#;
        let decoded: CandidateResult = serde_json::from_str(json).expect("deserialize");
        assert_eq!(decoded.url, "https://x.org");
        assert!(decoded.credibility.abs() < f64::EPSILON);
    }

    #[test]
    fn provider_display_and_order() {
        assert_eq!(ProviderKind::SearXng.to_string(), "SearXNG");
        assert_eq!(ProviderKind::DuckDuckGoHtml.to_string(), "DDGHTML");
        let all = ProviderKind::all();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0], ProviderKind::SearXng);
        assert_eq!(all[3], ProviderKind::DuckDuckGoHtml);
    }

    #[test]
    fn provider_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&ProviderKind::InstantAnswer).expect("serialize");
        assert_eq!(json, "\"instant_answer\"");
        let decoded: ProviderKind = serde_json::from_str("\"brave_api\"").expect("deserialize");
        assert_eq!(decoded, ProviderKind::BraveApi);
    }

    #[test]
    fn truncate_chars_respects_multibyte_boundaries() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("привет мир", 6), "привет...");
    }

    #[test]
    fn text_field_ignores_non_strings_and_blanks() {
        let entry = serde_json::json!({"title": 42, "url": "https://a.com", "content": "  ", "x": null});
        assert_eq!(text_field(&entry, "url"), Some("https://a.com"));
        assert_eq!(text_field(&entry, "title"), None);
        assert_eq!(text_field(&entry, "content"), None);
        assert_eq!(text_field(&entry, "x"), None);
        assert_eq!(text_field(&entry, "missing"), None);
    }

    #[test]
    fn positional_score_decays_and_floors() {
        assert!((positional_score(0.95, 0.03, 0) - 0.95).abs() < f64::EPSILON);
        assert!((positional_score(0.95, 0.03, 5) - 0.80).abs() < 1e-9);
        assert!(positional_score(0.8, 0.05, 40).abs() < f64::EPSILON);
    }
}
