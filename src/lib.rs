//! Sift: multi-source web research pipeline.
//!
//! Turns a question (plus optional conversation history) into a small,
//! ranked, domain-diverse set of evidence ready for an answer generator:
//! Query → Plan → Search (cascade / fan-out) → Dedup → BM25 → Credibility
//! → Diversity → Cross-verify
//!
//! # Architecture
//!
//! - **Retrieval** lives in the `sift-search` crate: an ordered cascade of
//!   search providers with rate limiting, circuit breaking and caching
//! - **Planning**: lexical multi-hop detection, LLM decomposition and
//!   history-based query rewriting ([`planner`])
//! - **Fan-out**: concurrent sub-query execution with per-branch timeouts
//!   and a direct-search fallback ([`executor`])
//! - **Ranking**: BM25 ([`rerank`]), heuristic credibility
//!   ([`credibility`]), domain diversity ([`diversity`]) and a shared-phrase
//!   corroboration check ([`verify`])
//! - **Orchestration**: [`pipeline::ResearchPipeline`], mode routing
//!   ([`mode`]) and conversation sessions ([`session`])

pub mod config;
pub mod credibility;
pub mod diversity;
pub mod error;
pub mod executor;
pub mod generation;
pub mod mode;
pub mod pipeline;
pub mod planner;
pub mod rerank;
pub mod session;
#[doc(hidden)]
pub mod test_utils;
pub mod types;
pub mod verify;

pub use config::SiftConfig;
pub use error::{Result, SiftError};
pub use generation::{Generator, OpenAiGenerator};
pub use mode::{ModeRequest, ModeRouter, ResearchMode};
pub use pipeline::ResearchPipeline;
pub use session::{MemorySessionStore, ResearchService, SessionStore};
pub use types::{Diagnostics, EvidenceSet, PipelineOutcome, Query, Turn};

pub use sift_search::{CandidateResult, ProviderCascade};
