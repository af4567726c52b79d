//! Domain-diverse selection of ranked candidates.

use std::collections::{HashMap, HashSet};

use sift_search::CandidateResult;
use sift_search::url_normalize::domain_of;

/// Select up to `max_results` candidates, at most `max_per_domain` per domain.
///
/// The first pass walks the ranking in order and admits a candidate while
/// its domain is under the cap; candidates whose domain cannot be
/// determined are skipped in this pass. If the budget is not yet filled, a
/// second pass admits the remaining candidates in ranking order regardless
/// of domain. The output is ordered by selection.
pub fn select_diverse(
    ranked: &[CandidateResult],
    max_results: usize,
    max_per_domain: usize,
) -> Vec<CandidateResult> {
    let mut selected: Vec<CandidateResult> = Vec::with_capacity(max_results.min(ranked.len()));
    let mut taken: HashSet<usize> = HashSet::new();
    let mut per_domain: HashMap<String, usize> = HashMap::new();

    for (i, candidate) in ranked.iter().enumerate() {
        if selected.len() >= max_results {
            break;
        }
        let domain = domain_of(&candidate.url);
        if domain.is_empty() {
            continue;
        }
        let count = per_domain.entry(domain).or_insert(0);
        if *count < max_per_domain {
            *count += 1;
            taken.insert(i);
            selected.push(candidate.clone());
        }
    }

    if selected.len() < max_results {
        for (i, candidate) in ranked.iter().enumerate() {
            if selected.len() >= max_results {
                break;
            }
            if taken.insert(i) {
                selected.push(candidate.clone());
            }
        }
    }

    tracing::debug!(
        selected = selected.len(),
        domains = per_domain.len(),
        "diverse selection"
    );
    selected
}

/// Number of distinct non-empty domains in `results`.
pub fn unique_domains(results: &[CandidateResult]) -> usize {
    results
        .iter()
        .map(|r| domain_of(&r.url))
        .filter(|d| !d.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(url: &str) -> CandidateResult {
        CandidateResult::new(url, url, "content", "SearXNG", 0.5)
    }

    fn domain_counts(results: &[CandidateResult]) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for r in results {
            *counts.entry(domain_of(&r.url)).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn six_from_one_domain_capped_then_refilled_last() {
        let ranked = vec![
            c("https://a.com/1"),
            c("https://a.com/2"),
            c("https://a.com/3"),
            c("https://b.com/1"),
            c("https://a.com/4"),
            c("https://c.com/1"),
            c("https://a.com/5"),
            c("https://d.com/1"),
            c("https://a.com/6"),
            c("https://e.com/1"),
        ];
        let selected = select_diverse(&ranked, 10, 2);
        assert_eq!(selected.len(), 10);

        let urls: Vec<&str> = selected.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            &urls[..6],
            &[
                "https://a.com/1",
                "https://a.com/2",
                "https://b.com/1",
                "https://c.com/1",
                "https://d.com/1",
                "https://e.com/1",
            ]
        );
        // a.com only returns once other domains are exhausted.
        assert!(urls[6..].iter().all(|u| u.starts_with("https://a.com/")));
    }

    #[test]
    fn cap_holds_when_enough_diversity_exists() {
        let mut ranked = Vec::new();
        for d in ["a", "b", "c", "d", "e", "f"] {
            for i in 0..3 {
                ranked.push(c(&format!("https://{d}.com/{i}")));
            }
        }
        let selected = select_diverse(&ranked, 10, 2);
        assert_eq!(selected.len(), 10);
        assert!(domain_counts(&selected).values().all(|&n| n <= 2));
    }

    #[test]
    fn www_prefix_shares_a_domain() {
        let ranked = vec![
            c("https://www.a.com/1"),
            c("https://a.com/2"),
            c("https://WWW.A.com/3"),
            c("https://b.com/1"),
        ];
        let selected = select_diverse(&ranked, 3, 2);
        let urls: Vec<&str> = selected.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://www.a.com/1", "https://a.com/2", "https://b.com/1"]);
    }

    #[test]
    fn unparseable_urls_only_fill_leftover_slots() {
        let ranked = vec![c("garbage"), c("https://a.com/1"), c("https://b.com/1")];
        let selected = select_diverse(&ranked, 3, 2);
        assert_eq!(selected[2].url, "garbage");
        assert_eq!(select_diverse(&ranked, 2, 2).len(), 2);
        assert!(select_diverse(&ranked, 2, 2).iter().all(|r| r.url != "garbage"));
    }

    #[test]
    fn never_exceeds_budget_or_duplicates() {
        let ranked: Vec<CandidateResult> = (0..20).map(|i| c(&format!("https://a.com/{i}"))).collect();
        let selected = select_diverse(&ranked, 10, 2);
        assert_eq!(selected.len(), 10);
        let unique: HashSet<&str> = selected.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(unique.len(), 10);
        assert!(select_diverse(&ranked, 0, 2).is_empty());
    }

    #[test]
    fn counts_unique_domains() {
        let results = vec![c("https://a.com/1"), c("https://www.a.com/2"), c("https://b.org"), c("bad")];
        assert_eq!(unique_domains(&results), 2);
    }
}
