//! Result deduplication by normalised URL.
//!
//! Collapses results that refer to the same resource, keeping the
//! first-seen entry per [`dedup_key`] and preserving arrival order.

use std::collections::HashSet;

use crate::types::CandidateResult;
use crate::url_normalize::dedup_key;

/// Deduplicate results by normalised URL.
///
/// The first result seen for a key wins; later duplicates are dropped.
/// Relative order of the survivors is unchanged, so running this on an
/// already-deduplicated set is a no-op.
pub fn deduplicate(results: Vec<CandidateResult>) -> Vec<CandidateResult> {
    let before = results.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);

    let unique: Vec<CandidateResult> = results
        .into_iter()
        .filter(|result| seen.insert(dedup_key(&result.url)))
        .collect();

    tracing::debug!(before, after = unique.len(), "deduplicated results");
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(url: &str, provider: &str) -> CandidateResult {
        CandidateResult::new(
            format!("Title from {provider}"),
            url,
            format!("Content from {provider}"),
            provider,
            0.5,
        )
    }

    #[test]
    fn keeps_first_seen_duplicate() {
        let results = vec![
            make_result("https://example.com/page", "SearXNG"),
            make_result("https://EXAMPLE.com/page/", "BraveAPI"),
        ];
        let deduped = deduplicate(results);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].provider, "SearXNG");
    }

    #[test]
    fn preserves_arrival_order() {
        let results = vec![
            make_result("https://c.com", "SearXNG"),
            make_result("https://a.com", "SearXNG"),
            make_result("https://c.com/", "DDGHTML"),
            make_result("https://b.com", "DDGHTML"),
        ];
        let urls: Vec<String> = deduplicate(results).into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://c.com", "https://a.com", "https://b.com"]);
    }

    #[test]
    fn distinct_paths_are_not_merged() {
        let results = vec![
            make_result("https://example.com/a", "SearXNG"),
            make_result("https://example.com/b", "SearXNG"),
        ];
        assert_eq!(deduplicate(results).len(), 2);
    }

    #[test]
    fn deduplicate_is_idempotent() {
        let results = vec![
            make_result("https://x.org/1", "SearXNG"),
            make_result("https://X.org/1/", "BraveAPI"),
            make_result("https://y.org", "DDGInstant"),
            make_result("https://y.org//", "DDGHTML"),
            make_result("https://z.org", "DDGHTML"),
        ];
        let once = deduplicate(results);
        let twice = deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(deduplicate(vec![]).is_empty());
    }
}
