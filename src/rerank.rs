//! BM25 lexical reranking.
//!
//! Documents are a candidate's title and content. Terms are lowercase
//! alphanumeric runs longer than two characters. IDF is computed over the
//! candidate set itself, so scores are only comparable within one call.

use std::collections::HashMap;

use sift_search::CandidateResult;

/// Term-frequency saturation.
pub const K1: f64 = 1.5;
/// Document length normalisation.
pub const B: f64 = 0.75;

/// Split text into lowercase alphanumeric terms longer than two characters.
///
/// # Examples
///
/// ```
/// use sift::rerank::tokenize;
///
/// assert_eq!(tokenize("Rust's 2024 edition, is OK!"), vec!["rust", "2024", "edition"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// `ln((N - df + 0.5) / (df + 0.5) + 1)`.
pub fn idf(n_docs: usize, doc_freq: usize) -> f64 {
    let n = n_docs as f64;
    let df = doc_freq as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// One term's BM25 contribution.
pub fn term_score(idf: f64, tf: usize, doc_len: usize, avg_doc_len: f64) -> f64 {
    if tf == 0 {
        return 0.0;
    }
    let tf = tf as f64;
    let norm = if avg_doc_len > 0.0 {
        doc_len as f64 / avg_doc_len
    } else {
        1.0
    };
    idf * tf * (K1 + 1.0) / (tf + K1 * (1.0 - B + B * norm))
}

/// Score candidates against `query` with BM25.
///
/// Returns one score per candidate, in input order. An empty vector means
/// the query had no usable terms.
pub fn bm25_scores(query: &str, candidates: &[CandidateResult]) -> Vec<f64> {
    let mut query_terms = tokenize(query);
    query_terms.sort_unstable();
    query_terms.dedup();
    if query_terms.is_empty() || candidates.is_empty() {
        return Vec::new();
    }

    let docs: Vec<HashMap<String, usize>> = candidates
        .iter()
        .map(|c| {
            let mut tf = HashMap::new();
            for term in tokenize(&format!("{} {}", c.title, c.content)) {
                *tf.entry(term).or_insert(0) += 1;
            }
            tf
        })
        .collect();
    let lengths: Vec<usize> = docs.iter().map(|d| d.values().sum()).collect();
    let avg_len = lengths.iter().sum::<usize>() as f64 / docs.len() as f64;

    let idfs: Vec<f64> = query_terms
        .iter()
        .map(|term| {
            let df = docs.iter().filter(|d| d.contains_key(term)).count();
            idf(docs.len(), df)
        })
        .collect();

    docs.iter()
        .zip(&lengths)
        .map(|(doc, &len)| {
            query_terms
                .iter()
                .zip(&idfs)
                .map(|(term, &idf)| term_score(idf, doc.get(term).copied().unwrap_or(0), len, avg_len))
                .sum()
        })
        .collect()
}

/// Overwrite each candidate's score with its BM25 score and stable-sort
/// descending. Ties keep their prior relative order.
///
/// A query without usable terms leaves the input untouched.
pub fn rerank(query: &str, candidates: Vec<CandidateResult>) -> Vec<CandidateResult> {
    let scores = bm25_scores(query, &candidates);
    if scores.is_empty() {
        tracing::debug!("no query terms, skipping rerank");
        return candidates;
    }

    let mut scored: Vec<CandidateResult> = candidates
        .into_iter()
        .zip(scores)
        .map(|(mut c, score)| {
            c.score = score;
            c
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    tracing::debug!(
        count = scored.len(),
        top = scored.first().map(|c| c.score).unwrap_or(0.0),
        "reranked candidates"
    );
    scored
}
