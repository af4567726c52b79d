//! Heuristic source credibility scoring.
//!
//! ```text
//! credibility = clamp(0.5
//!     + 0.30 * domain      (tiered domain lists)
//!     + 0.25 * content     (length, citations, dates, clickbait title)
//!     + 0.25 * relevance   (carried-over score)
//!     + 0.10 * url         (https, length, shorteners, tracking)
//!     + 0.10 * freshness   (most recent year token in the url), 0, 1)
//! ```
//!
//! Every component is clamped to `[0, 1]` before weighting. The domain
//! lists and keyword tables are plain configuration ([`CredibilityTables`]).

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use sift_search::CandidateResult;
use sift_search::url_normalize::{domain_of, has_tracking_params};

const BASE_SCORE: f64 = 0.5;
const DOMAIN_WEIGHT: f64 = 0.30;
const CONTENT_WEIGHT: f64 = 0.25;
const RELEVANCE_WEIGHT: f64 = 0.25;
const URL_WEIGHT: f64 = 0.10;
const FRESHNESS_WEIGHT: f64 = 0.10;

const TIER1_SCORE: f64 = 1.0;
const TIER2_SCORE: f64 = 0.75;
const BLOG_SCORE: f64 = 0.5;
const SOCIAL_SCORE: f64 = 0.4;
const UNKNOWN_SCORE: f64 = 0.5;

/// Oldest year token accepted as a publication year.
const EARLIEST_YEAR: i32 = 1990;

/// Domain tiers and keyword lists used by the scorer.
///
/// Domain entries match the host exactly or as a dot-separated suffix, so
/// `"bbc.com"` matches `news.bbc.com` but not `notbbc.com`. Entries that
/// start with a dot (`".gov"`) match any host ending with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityTables {
    /// Encyclopedic, government, academic and wire-service domains.
    pub tier1_domains: Vec<String>,
    /// Nonprofit, developer and major outlet domains.
    pub tier2_domains: Vec<String>,
    /// Host substrings that mark blogs and personal sites.
    pub blog_markers: Vec<String>,
    /// Social platforms.
    pub social_domains: Vec<String>,
    /// Content keywords that suggest cited or sourced material.
    pub citation_keywords: Vec<String>,
    /// Content fragments that suggest dated material.
    pub date_markers: Vec<String>,
    /// Title terms penalised as clickbait.
    pub clickbait_terms: Vec<String>,
    /// Link-shortener hosts.
    pub shortener_domains: Vec<String>,
    /// Path segments that mark ad or promo landing pages.
    pub promo_path_segments: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for CredibilityTables {
    fn default() -> Self {
        Self {
            tier1_domains: strings(&[
                "wikipedia.org",
                "wikimedia.org",
                ".gov",
                ".edu",
                "nature.com",
                "science.org",
                "sciencedirect.com",
                "nih.gov",
                "cdc.gov",
                "bbc.com",
                "reuters.com",
                "apnews.com",
                "arxiv.org",
                "scholar.google.com",
                "nist.gov",
                "ieee.org",
                "acm.org",
            ]),
            tier2_domains: strings(&[
                ".org",
                "github.com",
                "stackoverflow.com",
                "medium.com",
                "habr.com",
                "vc.ru",
                "forbes.com",
                "techcrunch.com",
                "theverge.com",
                "nytimes.com",
                "theguardian.com",
                "washingtonpost.com",
            ]),
            blog_markers: strings(&["blog", "wordpress", "blogspot"]),
            social_domains: strings(&[
                "facebook.com",
                "twitter.com",
                "x.com",
                "reddit.com",
                "quora.com",
                "vk.com",
                "ok.ru",
            ]),
            citation_keywords: strings(&[
                "study",
                "research",
                "data",
                "source",
                "published",
                "according to",
                "источник",
                "исследование",
                "данные",
                "статистика",
                "согласно",
                "по данным",
            ]),
            date_markers: strings(&[
                "202", "201", "january", "february", "march", "april", "may", "june", "января",
                "февраля", "марта",
            ]),
            clickbait_terms: strings(&[
                "shocking",
                "incredible",
                "secret",
                "mystery",
                "невероятно",
                "шокирующ",
                "сенсаци",
                "тайн",
                "🔥",
                "😱",
                "!!!",
            ]),
            shortener_domains: strings(&["bit.ly", "tinyurl.com", "goo.gl"]),
            promo_path_segments: strings(&["ad", "ads", "promo", "sponsored"]),
        }
    }
}

fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    if pattern.starts_with('.') {
        host.ends_with(&pattern)
    } else {
        host == pattern || host.ends_with(&format!(".{pattern}"))
    }
}

/// Find the most recent plausible year token in `text`.
///
/// A year token is a run of exactly four ASCII digits between
/// `1990` and `current_year`.
pub fn latest_year_token(text: &str, current_year: i32) -> Option<i32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() == 4)
        .filter_map(|run| run.parse::<i32>().ok())
        .filter(|year| (EARLIEST_YEAR..=current_year).contains(year))
        .max()
}

/// Scores candidates with the configured tables.
#[derive(Debug, Clone)]
pub struct CredibilityScorer {
    tables: CredibilityTables,
    current_year: i32,
}

impl Default for CredibilityScorer {
    fn default() -> Self {
        Self::new(CredibilityTables::default())
    }
}

impl CredibilityScorer {
    /// Scorer using the current calendar year for freshness.
    pub fn new(tables: CredibilityTables) -> Self {
        Self {
            tables,
            current_year: chrono::Utc::now().year(),
        }
    }

    /// Pin the year freshness is measured against.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Domain authority component.
    pub fn domain_score(&self, url: &str) -> f64 {
        let host = domain_of(url);
        if host.is_empty() {
            return UNKNOWN_SCORE;
        }
        let t = &self.tables;
        if t.tier1_domains.iter().any(|d| host_matches(&host, d)) {
            TIER1_SCORE
        } else if t.tier2_domains.iter().any(|d| host_matches(&host, d)) {
            TIER2_SCORE
        } else if t.blog_markers.iter().any(|m| host.contains(&m.to_lowercase())) {
            BLOG_SCORE
        } else if t.social_domains.iter().any(|d| host_matches(&host, d)) {
            SOCIAL_SCORE
        } else {
            UNKNOWN_SCORE
        }
    }

    /// Content quality component.
    pub fn content_score(&self, content: &str, title: &str) -> f64 {
        let mut score: f64 = 0.5;

        let len = content.chars().count();
        if len > 500 {
            score += 0.2;
        } else if len > 200 {
            score += 0.1;
        }

        let content = content.to_lowercase();
        if self.tables.citation_keywords.iter().any(|k| content.contains(&k.to_lowercase())) {
            score += 0.05;
        }
        if self.tables.date_markers.iter().any(|k| content.contains(&k.to_lowercase())) {
            score += 0.05;
        }

        let title = title.to_lowercase();
        if self.tables.clickbait_terms.iter().any(|k| title.contains(&k.to_lowercase())) {
            score -= 0.1;
        }

        score.clamp(0.0, 1.0)
    }

    /// URL hygiene component.
    pub fn url_score(&self, url: &str) -> f64 {
        let mut score: f64 = 0.5;
        let lower = url.trim().to_lowercase();

        if lower.starts_with("https://") {
            score += 0.2;
        }

        let len = lower.chars().count();
        if len < 100 {
            score += 0.2;
        } else if len > 200 {
            score -= 0.1;
        }

        let host = domain_of(&lower);
        if !host.is_empty() && self.tables.shortener_domains.iter().any(|d| host_matches(&host, d)) {
            score -= 0.1;
        }
        if has_tracking_params(&lower) {
            score -= 0.1;
        }
        if let Ok(parsed) = url::Url::parse(&lower) {
            let promo = parsed
                .path_segments()
                .into_iter()
                .flatten()
                .any(|seg| self.tables.promo_path_segments.iter().any(|p| seg == p.to_lowercase()));
            if promo {
                score -= 0.1;
            }
        }

        score.clamp(0.0, 1.0)
    }

    /// Freshness component from year tokens in the URL.
    pub fn freshness_score(&self, url: &str) -> f64 {
        match latest_year_token(url, self.current_year) {
            Some(year) => {
                let age = self.current_year - year;
                if age <= 2 {
                    1.0
                } else {
                    (1.0 - 0.1 * f64::from(age)).max(0.0)
                }
            }
            None => 0.5,
        }
    }

    /// Weighted credibility of one candidate, in `[0, 1]`.
    pub fn score(&self, candidate: &CandidateResult) -> f64 {
        let relevance = if candidate.score.is_finite() {
            candidate.score.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let total = BASE_SCORE
            + DOMAIN_WEIGHT * self.domain_score(&candidate.url).clamp(0.0, 1.0)
            + CONTENT_WEIGHT * self.content_score(&candidate.content, &candidate.title).clamp(0.0, 1.0)
            + RELEVANCE_WEIGHT * relevance
            + URL_WEIGHT * self.url_score(&candidate.url).clamp(0.0, 1.0)
            + FRESHNESS_WEIGHT * self.freshness_score(&candidate.url).clamp(0.0, 1.0);
        total.clamp(0.0, 1.0)
    }

    /// Set every candidate's credibility and stable-sort descending by it.
    pub fn rank(&self, candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
        let mut scored: Vec<CandidateResult> = candidates
            .into_iter()
            .map(|mut c| {
                c.credibility = self.score(&c);
                c
            })
            .collect();
        scored.sort_by(|a, b| b.credibility.total_cmp(&a.credibility));
        tracing::debug!(count = scored.len(), "credibility ranked");
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> CredibilityScorer {
        CredibilityScorer::default().with_current_year(2026)
    }

    fn candidate(url: &str, title: &str, content: &str, score: f64) -> CandidateResult {
        CandidateResult::new(title, url, content, "SearXNG", score)
    }

    #[test]
    fn domain_tiers() {
        let s = scorer();
        assert_eq!(s.domain_score("https://en.wikipedia.org/wiki/Rust"), 1.0);
        assert_eq!(s.domain_score("https://www.cdc.gov/flu"), 1.0);
        assert_eq!(s.domain_score("https://mit.edu/"), 1.0);
        assert_eq!(s.domain_score("https://github.com/rust-lang"), 0.75);
        assert_eq!(s.domain_score("https://www.mozilla.org"), 0.75);
        assert_eq!(s.domain_score("https://someone.blogspot.com/post"), 0.5);
        assert_eq!(s.domain_score("https://www.reddit.com/r/rust"), 0.4);
        assert_eq!(s.domain_score("https://example.net"), 0.5);
        assert_eq!(s.domain_score("not a url"), 0.5);
    }

    #[test]
    fn domain_match_respects_label_boundaries() {
        let s = scorer();
        assert_eq!(s.domain_score("https://dropbox.com"), 0.5);
        assert_eq!(s.domain_score("https://news.bbc.com/article"), 1.0);
        assert_eq!(s.domain_score("https://notbbc.com"), 0.5);
    }

    #[test]
    fn content_heuristics() {
        let s = scorer();
        assert!((s.content_score("short", "Plain") - 0.5).abs() < 1e-9);
        let long = format!("According to a 2023 study, {}", "x".repeat(600));
        assert!((s.content_score(&long, "Plain") - 0.8).abs() < 1e-9);
        assert!((s.content_score("short", "SHOCKING truth") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn url_heuristics() {
        let s = scorer();
        assert!((s.url_score("https://example.com/a") - 0.9).abs() < 1e-9);
        assert!((s.url_score("http://example.com/a") - 0.7).abs() < 1e-9);
        assert!((s.url_score("https://bit.ly/abc") - 0.8).abs() < 1e-9);
        assert!((s.url_score("https://example.com/a?utm_source=x") - 0.8).abs() < 1e-9);
        assert!((s.url_score("https://example.com/promo/deal") - 0.8).abs() < 1e-9);
        assert!((s.url_score("https://example.com/download") - 0.9).abs() < 1e-9);
        let long = format!("https://example.com/{}", "a".repeat(250));
        assert!((s.url_score(&long) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn freshness_from_year_tokens() {
        let s = scorer();
        assert_eq!(s.freshness_score("https://a.com/2025/05/post"), 1.0);
        assert_eq!(s.freshness_score("https://a.com/2024/post"), 1.0);
        assert!((s.freshness_score("https://a.com/2020/post") - 0.4).abs() < 1e-9);
        assert_eq!(s.freshness_score("https://a.com/1995/post"), 0.0);
        assert_eq!(s.freshness_score("https://a.com/post"), 0.5);
        // Future and implausible numbers are ignored.
        assert_eq!(s.freshness_score("https://a.com/2099/12345"), 0.5);
        // The most recent year wins.
        assert_eq!(s.freshness_score("https://a.com/2010/updated-2025"), 1.0);
    }

    #[test]
    fn latest_year_token_requires_exact_four_digits() {
        assert_eq!(latest_year_token("id=20251", 2026), None);
        assert_eq!(latest_year_token("2019-2021", 2026), Some(2021));
    }

    #[test]
    fn score_is_bounded_for_degenerate_inputs() {
        let s = scorer();
        let inputs = [
            candidate("", "", "", 0.0),
            candidate("https://en.wikipedia.org/2025", "t", &"study ".repeat(200), 1.0),
            candidate("garbage", "!!! 🔥 shocking", "", 0.0),
        ];
        for c in &inputs {
            let v = s.score(c);
            assert!((0.0..=1.0).contains(&v), "score {v} out of range for {c:?}");
        }
        let mut nan = candidate("https://a.com", "t", "c", 0.0);
        nan.score = f64::NAN;
        assert!((0.0..=1.0).contains(&s.score(&nan)));
    }

    #[test]
    fn reranked_scores_above_one_are_clamped() {
        let s = scorer();
        let mut c = candidate("http://unknown.example/x", "t", "c", 0.0);
        c.score = 7.5;
        let high = s.score(&c);
        c.score = 1.0;
        assert_eq!(high, s.score(&c));
    }

    #[test]
    fn rank_sorts_descending_and_sets_field() {
        let s = scorer();
        let ranked = s.rank(vec![
            candidate("http://someone.blogspot.com/x?utm_source=a", "Shocking!!!", "meh", 0.1),
            candidate("https://en.wikipedia.org/wiki/Rust", "Rust", "Rust is a language", 0.9),
        ]);
        assert!(ranked[0].url.contains("wikipedia"));
        assert!(ranked[0].credibility > ranked[1].credibility);
        assert!(ranked.iter().all(|c| c.credibility > 0.0));
    }

    #[test]
    fn tables_deserialise_partially() {
        let tables: CredibilityTables =
            toml::from_str("tier1_domains = [\"example.org\"]").expect("parse");
        assert_eq!(tables.tier1_domains, vec!["example.org"]);
        assert_eq!(tables.social_domains, CredibilityTables::default().social_domains);
    }
}
