//! Request, evidence and diagnostics types shared by the pipeline stages.

use std::fmt;

use serde::{Deserialize, Serialize};
use sift_search::types::truncate_chars;
use sift_search::CandidateResult;

/// Characters of source content rendered into the generator context.
const CONTEXT_CONTENT_CHARS: usize = 800;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The assistant answering them.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One prior conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who spoke.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl Turn {
    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The question being researched plus the conversation that led to it.
///
/// History is only used to rewrite the question into a self-contained
/// form before retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Original question text.
    pub text: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl Query {
    /// A query with no conversation history.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            history: Vec::new(),
        }
    }

    /// Attach prior conversation turns.
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    /// The last `window` turns of history.
    pub fn recent_history(&self, window: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }
}

/// A derived query produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuery {
    /// Position in the decomposition, `0..k`.
    pub index: usize,
    /// Self-contained query text.
    pub text: String,
}

/// Corroboration level derived from shared phrasing across sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corroboration {
    /// More than three phrases appear in at least two sources.
    StronglyCorroborated,
    /// One to three shared phrases.
    PartiallyCorroborated,
    /// No shared phrasing.
    ContradictoryOrInsufficient,
}

impl Corroboration {
    /// Classify a count of phrases shared by at least two sources.
    pub fn from_shared_phrases(count: usize) -> Self {
        match count {
            0 => Self::ContradictoryOrInsufficient,
            1..=3 => Self::PartiallyCorroborated,
            _ => Self::StronglyCorroborated,
        }
    }

    /// Stable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StronglyCorroborated => "strongly-corroborated",
            Self::PartiallyCorroborated => "partially-corroborated",
            Self::ContradictoryOrInsufficient => "contradictory/insufficient",
        }
    }
}

impl fmt::Display for Corroboration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of cross-verifying the selected sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    /// Corroboration level.
    pub corroboration: Corroboration,
    /// Number of 3-token phrases found in two or more sources.
    pub shared_phrases: usize,
}

impl VerificationVerdict {
    /// Build a verdict from a shared phrase count.
    pub fn from_shared_phrases(shared_phrases: usize) -> Self {
        Self {
            corroboration: Corroboration::from_shared_phrases(shared_phrases),
            shared_phrases,
        }
    }
}

impl fmt::Display for VerificationVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} shared phrases)",
            self.corroboration, self.shared_phrases
        )
    }
}

/// What happened during one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Human-readable trace of the stages taken.
    pub reasoning_steps: Vec<String>,
    /// Query after history-based enhancement.
    pub enhanced_query: String,
    /// Whether the planner flagged the query as multi-hop.
    pub multi_hop: bool,
    /// Sub-queries that were fanned out.
    pub sub_queries: Vec<String>,
    /// Sub-query branches that failed or timed out.
    pub failed_branches: usize,
    /// Whether the direct-search fallback ran.
    pub fallback_used: bool,
    /// Candidates collected before deduplication.
    pub candidates_collected: usize,
    /// Candidates left after deduplication.
    pub candidates_unique: usize,
    /// Size of the final selection.
    pub selected: usize,
    /// Distinct domains in the final selection.
    pub unique_domains: usize,
    /// Wall-clock time of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl Diagnostics {
    /// Record a reasoning step and mirror it to the debug log.
    pub fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(step = %message, "pipeline step");
        self.reasoning_steps.push(message);
    }
}

/// Ranked, diversity-constrained evidence ready for answer generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSet {
    /// Full selection, best first.
    pub selection: Vec<CandidateResult>,
    /// Leading slice of the selection shown to the generator.
    pub display: Vec<CandidateResult>,
    /// Cross-verification verdict, absent for fewer than two sources or in simple mode.
    pub verdict: Option<VerificationVerdict>,
    /// Run diagnostics.
    pub diagnostics: Diagnostics,
}

impl EvidenceSet {
    /// Render the display slice as numbered source blocks.
    ///
    /// Each block reads `Source N [Credibility: X.XX] (title):` followed by
    /// the content, truncated to 800 characters.
    pub fn context_block(&self) -> String {
        self.display
            .iter()
            .enumerate()
            .map(|(i, r)| {
                format!(
                    "Source {} [Credibility: {:.2}] ({}):\n{}\n\n",
                    i + 1,
                    r.credibility,
                    r.title,
                    truncate_chars(&r.content, CONTEXT_CONTENT_CHARS)
                )
            })
            .collect()
    }

    /// Numbered `title - url` lines for the display slice.
    pub fn source_list(&self) -> Vec<String> {
        self.display
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} - {}", i + 1, r.title, r.url))
            .collect()
    }
}

/// Outcome of one pipeline run.
///
/// Finding nothing is an ordinary outcome rather than an error, so the
/// caller can still produce a graceful answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// At least one candidate survived retrieval and deduplication.
    Evidence(EvidenceSet),
    /// No relevant information was found.
    NoInformation(Diagnostics),
}

impl PipelineOutcome {
    /// Diagnostics for either outcome.
    pub fn diagnostics(&self) -> &Diagnostics {
        match self {
            Self::Evidence(set) => &set.diagnostics,
            Self::NoInformation(diagnostics) => diagnostics,
        }
    }

    /// The evidence set, if any.
    pub fn evidence(&self) -> Option<&EvidenceSet> {
        match self {
            Self::Evidence(set) => Some(set),
            Self::NoInformation(_) => None,
        }
    }

    /// Whether nothing relevant was found.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoInformation(_))
    }
}
