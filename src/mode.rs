//! Research mode routing.
//!
//! A request either names a mode or asks for `auto`, in which case the
//! question is classified by keyword heuristics first and only borderline
//! questions reach the generator.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SiftError;
use crate::generation::Generator;
use crate::types::Query;

/// How much work the pipeline does for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchMode {
    /// One direct search, no decomposition, reranking or verification.
    Simple,
    /// The full research pipeline.
    Pro,
}

impl ResearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for ResearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResearchMode {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "pro" => Ok(Self::Pro),
            other => Err(SiftError::InvalidMode(format!("unknown research mode: {other:?}"))),
        }
    }
}

/// A caller's mode request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeRequest {
    /// Let the router decide.
    #[default]
    Auto,
    /// Use exactly this mode.
    Fixed(ResearchMode),
}

impl fmt::Display for ModeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(mode) => mode.fmt(f),
        }
    }
}

impl FromStr for ModeRequest {
    type Err = SiftError;

    /// Parses `auto`, `simple` or `pro`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse().map(Self::Fixed)
    }
}

const SIMPLE_INDICATORS: &[&str] = &[
    "кто", "что такое", "когда", "где", "сколько", "какой", "какая", "какое", "как зовут",
    "столица", "год", "дата", "возраст", "погода", "курс", "цена",
    "who", "what is", "when", "where", "how much", "capital", "weather", "price",
];

const COMPLEX_INDICATORS: &[&str] = &[
    "сравни", "проанализируй", "объясни почему", "различия между",
    "преимущества и недостатки", "как работает", "причины", "последствия",
    "влияние", "взаимосвязь", "теории",
    "compare", "analyze", "explain why", "differences between",
    "advantages and disadvantages", "how does", "causes", "consequences",
];

/// Questions with a simple indicator must be shorter than this to be
/// classified without the generator.
const SIMPLE_MAX_WORDS: usize = 10;

/// Conversations longer than this many turns always get the full pipeline.
const PRO_HISTORY_TURNS: usize = 2;

const CLASSIFY_TEMPERATURE: f64 = 0.1;
const CLASSIFY_MAX_TOKENS: u32 = 10;

/// Keyword classification. `None` means the question is borderline.
///
/// # Examples
///
/// ```
/// use sift::mode::{classify_heuristic, ResearchMode};
///
/// assert_eq!(classify_heuristic("Who wrote Dune?"), Some(ResearchMode::Simple));
/// assert_eq!(classify_heuristic("Compare Go and Rust"), Some(ResearchMode::Pro));
/// assert_eq!(classify_heuristic("Rust borrow checker internals"), None);
/// ```
pub fn classify_heuristic(question: &str) -> Option<ResearchMode> {
    let lower = question.to_lowercase();
    let has_simple = SIMPLE_INDICATORS.iter().any(|i| lower.contains(i));
    let has_complex = COMPLEX_INDICATORS.iter().any(|i| lower.contains(i));

    if has_simple && !has_complex && question.split_whitespace().count() < SIMPLE_MAX_WORDS {
        Some(ResearchMode::Simple)
    } else if has_complex {
        Some(ResearchMode::Pro)
    } else {
        None
    }
}

/// Resolves [`ModeRequest`]s to concrete modes.
#[derive(Clone)]
pub struct ModeRouter {
    generator: Arc<dyn Generator>,
}

impl fmt::Debug for ModeRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeRouter").finish_non_exhaustive()
    }
}

impl ModeRouter {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Resolve `request` for `query`. Never fails; an unreachable generator
    /// resolves borderline questions to [`ResearchMode::Simple`].
    pub async fn resolve(&self, request: ModeRequest, query: &Query) -> ResearchMode {
        match request {
            ModeRequest::Fixed(mode) => mode,
            ModeRequest::Auto => self.select(query).await,
        }
    }

    async fn select(&self, query: &Query) -> ResearchMode {
        if query.history.len() > PRO_HISTORY_TURNS {
            tracing::debug!(turns = query.history.len(), "ongoing conversation, using pro mode");
            return ResearchMode::Pro;
        }

        if let Some(mode) = classify_heuristic(&query.text) {
            tracing::info!(%mode, "mode selected by heuristic");
            return mode;
        }

        let prompt = format!(
            "You classify search questions by complexity.\n\n\
             SIMPLE: short factual lookups, e.g. \"Who is the president of the USA?\", \
             \"When was Google founded?\", \"Capital of France?\"\n\
             PRO: analytical questions, e.g. \"Compare approaches to AI regulation\", \
             \"Explain the causes of the 2008 crisis\"\n\n\
             Question: {}\n\n\
             Answer with exactly one word: SIMPLE or PRO",
            query.text
        );

        match self
            .generator
            .complete(&prompt, CLASSIFY_TEMPERATURE, CLASSIFY_MAX_TOKENS)
            .await
        {
            Ok(answer) => {
                let mode = if answer.to_uppercase().contains("PRO") {
                    ResearchMode::Pro
                } else {
                    ResearchMode::Simple
                };
                tracing::info!(%mode, "mode selected by generator");
                mode
            }
            Err(e) => {
                tracing::warn!(error = %e, "mode classification failed, using simple mode");
                ResearchMode::Simple
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedGenerator;
    use crate::types::Turn;

    #[test]
    fn parses_mode_requests() {
        assert_eq!("auto".parse::<ModeRequest>().expect("auto"), ModeRequest::Auto);
        assert_eq!(
            " Pro ".parse::<ModeRequest>().expect("pro"),
            ModeRequest::Fixed(ResearchMode::Pro)
        );
        assert_eq!(
            "SIMPLE".parse::<ModeRequest>().expect("simple"),
            ModeRequest::Fixed(ResearchMode::Simple)
        );
        let err = "pro-finance".parse::<ModeRequest>().expect_err("unknown");
        assert_eq!(err.code(), crate::error::error_codes::INVALID_MODE);
    }

    #[test]
    fn display_round_trips() {
        for request in [
            ModeRequest::Auto,
            ModeRequest::Fixed(ResearchMode::Simple),
            ModeRequest::Fixed(ResearchMode::Pro),
        ] {
            assert_eq!(request.to_string().parse::<ModeRequest>().expect("parse"), request);
        }
    }

    #[test]
    fn heuristic_classification() {
        assert_eq!(classify_heuristic("What is the capital of France?"), Some(ResearchMode::Simple));
        assert_eq!(classify_heuristic("Какая погода в Москве?"), Some(ResearchMode::Simple));
        assert_eq!(
            classify_heuristic("Explain why the 2008 financial crisis happened"),
            Some(ResearchMode::Pro)
        );
        // Simple indicator but too long.
        assert_eq!(
            classify_heuristic("where can I find a detailed history of medieval trade routes in europe"),
            None
        );
        // Both kinds of indicator: complex wins.
        assert_eq!(classify_heuristic("what is the price and how does it compare"), Some(ResearchMode::Pro));
    }

    #[tokio::test]
    async fn fixed_request_skips_classification() {
        let generator = Arc::new(ScriptedGenerator::new([]));
        let router = ModeRouter::new(generator.clone());
        let mode = router
            .resolve(ModeRequest::Fixed(ResearchMode::Pro), &Query::new("Who wrote Dune?"))
            .await;
        assert_eq!(mode, ResearchMode::Pro);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn long_conversation_forces_pro() {
        let generator = Arc::new(ScriptedGenerator::new([]));
        let router = ModeRouter::new(generator.clone());
        let query = Query::new("Who wrote it?").with_history(vec![
            Turn::user("Tell me about Dune"),
            Turn::assistant("Dune is a novel."),
            Turn::user("Is it long?"),
        ]);
        assert_eq!(router.resolve(ModeRequest::Auto, &query).await, ResearchMode::Pro);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn borderline_asks_generator() {
        let generator = Arc::new(ScriptedGenerator::new(["PRO"]));
        let router = ModeRouter::new(generator.clone());
        let mode = router
            .resolve(ModeRequest::Auto, &Query::new("Rust borrow checker internals"))
            .await;
        assert_eq!(mode, ResearchMode::Pro);
        assert_eq!(generator.calls(), 1);
        assert!(generator.prompts()[0].contains("Rust borrow checker internals"));
    }

    #[tokio::test]
    async fn borderline_defaults_to_simple_when_generator_fails() {
        let router = ModeRouter::new(Arc::new(ScriptedGenerator::unavailable()));
        let mode = router
            .resolve(ModeRequest::Auto, &Query::new("Rust borrow checker internals"))
            .await;
        assert_eq!(mode, ResearchMode::Simple);
    }
}
