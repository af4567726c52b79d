//! Query planning: multi-hop detection, decomposition and history rewriting.
//!
//! Detection is purely lexical. A query is multi-hop when it contains a
//! comparison, causation or analysis trigger phrase, or when it is long
//! (more than 20 words) and mixes at least two distinct question words.
//! Only multi-hop queries are sent to the generator for decomposition, and
//! every generator failure degrades to searching the original query.

use std::collections::HashSet;
use std::sync::Arc;

use crate::generation::Generator;
use crate::types::{Query, Role, SubQuery};

/// Phrases that mark a question as needing decomposition.
const MULTI_HOP_TRIGGERS: &[&str] = &[
    // comparison
    "compare",
    "difference",
    "difference between",
    "сравни",
    "отличия",
    "различия",
    "разница между",
    // causation
    "relationship",
    "influence",
    "impact",
    "causes and effects",
    "what led to",
    "how did",
    "как связаны",
    "взаимосвязь",
    "влияние",
    "причины и следствия",
    "что привело к",
    // analysis
    "advantages and disadvantages",
    "pros and cons",
    "преимущества и недостатки",
    "за и против",
];

/// Question words counted for long-query detection.
const QUESTION_WORDS: &[&str] = &["what", "how", "why", "when", "когда", "как", "почему", "что"];

/// Word count above which a query is considered long.
const LONG_QUERY_WORDS: usize = 20;

/// Upper bound on generated sub-queries.
pub const MAX_SUB_QUERIES: usize = 3;

/// Generated lines must be longer than this many characters to be kept.
const MIN_SUB_QUERY_CHARS: usize = 10;

const DECOMPOSE_TEMPERATURE: f64 = 0.3;
const DECOMPOSE_MAX_TOKENS: u32 = 300;
const ENHANCE_TEMPERATURE: f64 = 0.3;
const ENHANCE_MAX_TOKENS: u32 = 200;

/// Returns `true` if `query` should be decomposed into sub-questions.
///
/// # Examples
///
/// ```
/// use sift::planner::is_multi_hop;
///
/// assert!(is_multi_hop("Compare nuclear energy and renewable energy"));
/// assert!(!is_multi_hop("What is the capital of France?"));
/// ```
pub fn is_multi_hop(query: &str) -> bool {
    let lower = query.to_lowercase();
    if MULTI_HOP_TRIGGERS.iter().any(|t| lower.contains(t)) {
        return true;
    }

    let words: Vec<&str> = lower.split_whitespace().collect();
    if words.len() <= LONG_QUERY_WORDS {
        return false;
    }

    let distinct: HashSet<&str> = words
        .iter()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| QUESTION_WORDS.contains(w))
        .collect();
    distinct.len() >= 2
}

/// Clean a decomposition response into at most `max` sub-query strings.
///
/// Strips bullet (`- `, `• `, `* `) and numbering (`1. `, `1) `) prefixes,
/// drops short lines and lines that echo the instruction.
pub fn parse_sub_queries(response: &str, max: usize) -> Vec<String> {
    response
        .lines()
        .map(strip_list_prefix)
        .filter(|line| line.chars().count() > MIN_SUB_QUERY_CHARS)
        .filter(|line| {
            let lower = line.to_lowercase();
            !lower.contains("sub-question") && !lower.contains("подвопрос")
        })
        .take(max)
        .map(str::to_string)
        .collect()
}

fn strip_list_prefix(line: &str) -> &str {
    let mut line = line.trim();
    for bullet in ["- ", "• ", "* "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            line = rest;
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            line = rest;
        }
    }
    line.trim()
}

/// Decision and decomposition for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Whether the query was flagged as multi-hop.
    pub multi_hop: bool,
    /// Whether the generator produced a usable decomposition.
    pub decomposed: bool,
    /// Sub-queries to search. Never empty.
    pub sub_queries: Vec<SubQuery>,
}

impl QueryPlan {
    /// Plan that searches `query` as asked, keeping the multi-hop flag the
    /// detector would give it.
    pub fn undecomposed(query: &str) -> Self {
        Self::single(query, is_multi_hop(query))
    }

    fn single(query: &str, multi_hop: bool) -> Self {
        Self {
            multi_hop,
            decomposed: false,
            sub_queries: vec![SubQuery {
                index: 0,
                text: query.to_string(),
            }],
        }
    }

    /// Sub-query texts in index order.
    pub fn texts(&self) -> Vec<String> {
        self.sub_queries.iter().map(|s| s.text.clone()).collect()
    }
}

/// Plans retrieval for a query using the generation collaborator.
#[derive(Clone)]
pub struct QueryPlanner {
    generator: Arc<dyn Generator>,
}

impl std::fmt::Debug for QueryPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPlanner").finish_non_exhaustive()
    }
}

impl QueryPlanner {
    /// Create a planner backed by `generator`.
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Decide how to search `query`.
    ///
    /// Single-hop queries never reach the generator. For multi-hop queries a
    /// failed or unusable decomposition falls back to the original query.
    pub async fn plan(&self, query: &str) -> QueryPlan {
        if !is_multi_hop(query) {
            return QueryPlan::single(query, false);
        }

        let prompt = format!(
            "Break down this complex question into 2-3 simple sub-questions for information search.\n\n\
             Question: {query}\n\n\
             Sub-questions (one per line, no numbering):"
        );

        let response = match self
            .generator
            .complete(&prompt, DECOMPOSE_TEMPERATURE, DECOMPOSE_MAX_TOKENS)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "query decomposition failed, searching original query");
                return QueryPlan::single(query, true);
            }
        };

        let texts = parse_sub_queries(&response, MAX_SUB_QUERIES);
        if texts.is_empty() {
            tracing::warn!("decomposition returned no usable sub-queries");
            return QueryPlan::single(query, true);
        }

        tracing::debug!(count = texts.len(), "query decomposed");
        QueryPlan {
            multi_hop: true,
            decomposed: true,
            sub_queries: texts
                .into_iter()
                .enumerate()
                .map(|(index, text)| SubQuery { index, text })
                .collect(),
        }
    }

    /// Rewrite `query` into a self-contained search query using its history.
    ///
    /// Only the last `window` turns are shown to the generator. Without
    /// history, or when the generator fails or answers blank, the original
    /// text is returned unchanged.
    pub async fn enhance_query(&self, query: &Query, window: usize) -> String {
        let recent = query.recent_history(window);
        if recent.is_empty() {
            return query.text.clone();
        }

        let mut prompt = String::from("Previous conversation:\n");
        for turn in recent {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            prompt.push_str(&format!("\n{role}: {}\n", turn.content));
        }
        prompt.push_str(&format!(
            "\n\nCurrent question: {}\n\n\
             Rephrase the current question to be self-contained and include important \
             information from context. Enhanced search query:",
            query.text
        ));

        match self
            .generator
            .complete(&prompt, ENHANCE_TEMPERATURE, ENHANCE_MAX_TOKENS)
            .await
        {
            Ok(enhanced) => {
                let cleaned = enhanced.trim().trim_matches(|c| c == '"' || c == '\'').trim();
                if cleaned.is_empty() {
                    tracing::debug!("enhanced query empty after cleanup, keeping original");
                    query.text.clone()
                } else {
                    cleaned.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "query enhancement failed, keeping original");
                query.text.clone()
            }
        }
    }
}
