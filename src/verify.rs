//! Cross-source corroboration by shared 3-token phrases.

use std::collections::{HashMap, HashSet};

use sift_search::CandidateResult;

use crate::types::VerificationVerdict;

/// Count 3-token phrases that occur in at least two distinct candidates.
///
/// Tokens are lowercased whitespace-separated words. A phrase repeated
/// inside one candidate counts once for that candidate.
pub fn shared_phrase_count(candidates: &[CandidateResult]) -> usize {
    let mut sources_per_phrase: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let content = candidate.content.to_lowercase();
        let words: Vec<&str> = content.split_whitespace().collect();
        let phrases: HashSet<String> = words.windows(3).map(|w| w.join(" ")).collect();
        for phrase in phrases {
            *sources_per_phrase.entry(phrase).or_insert(0) += 1;
        }
    }

    sources_per_phrase.values().filter(|&&n| n >= 2).count()
}

/// Verdict for the selection, or `None` with fewer than two candidates.
pub fn cross_verify(candidates: &[CandidateResult]) -> Option<VerificationVerdict> {
    if candidates.len() < 2 {
        return None;
    }
    let verdict = VerificationVerdict::from_shared_phrases(shared_phrase_count(candidates));
    tracing::debug!(%verdict, "cross-verification");
    Some(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Corroboration;

    fn c(content: &str) -> CandidateResult {
        CandidateResult::new("t", "https://a.com", content, "SearXNG", 0.5)
    }

    #[test]
    fn fewer_than_two_is_none() {
        assert!(cross_verify(&[]).is_none());
        assert!(cross_verify(&[c("the eiffel tower is tall")]).is_none());
    }

    #[test]
    fn strongly_corroborated_when_many_shared() {
        let a = c("The Eiffel Tower is 330 metres tall and located in Paris");
        let b = c("the eiffel tower is 330 metres tall, a landmark");
        let verdict = cross_verify(&[a, b]).expect("verdict");
        // "tall," keeps its comma, so "330 metres tall" is not shared.
        assert_eq!(verdict.shared_phrases, 4);
        assert_eq!(verdict.corroboration, Corroboration::StronglyCorroborated);
    }

    #[test]
    fn partially_corroborated_for_few_shared() {
        let a = c("paris is the capital of france");
        let b = c("many say paris is the best city");
        let verdict = cross_verify(&[a, b]).expect("verdict");
        assert_eq!(verdict.shared_phrases, 1);
        assert_eq!(verdict.corroboration, Corroboration::PartiallyCorroborated);
    }

    #[test]
    fn no_overlap_is_contradictory_or_insufficient() {
        let verdict = cross_verify(&[c("alpha beta gamma"), c("delta epsilon zeta")]).expect("verdict");
        assert_eq!(verdict.shared_phrases, 0);
        assert_eq!(verdict.corroboration, Corroboration::ContradictoryOrInsufficient);
    }

    #[test]
    fn repetition_within_one_source_does_not_count() {
        let repeated = c("one two three one two three one two three");
        let other = c("nothing in common here");
        assert_eq!(shared_phrase_count(&[repeated, other]), 0);
    }

    #[test]
    fn short_content_has_no_phrases() {
        assert_eq!(shared_phrase_count(&[c("a b"), c("a b")]), 0);
    }
}
