//! The research pipeline: from a question to a ranked, diverse evidence set.
//!
//! ```text
//! enhance ─► plan ─┬─ single-hop ─► direct cascade search ───────────────┐
//!                  └─ multi-hop ──► parallel sub-queries ─► [fallback] ──┤
//!                                                                        ▼
//!        dedup ─► BM25 rerank ─► credibility ─► diversity ─► cross-verify
//! ```
//!
//! The whole run sits under one overall deadline. Enhancement and
//! decomposition get the first `planning_timeout_secs` of it and fall back
//! to the question as asked when the generator is slower. Everything after
//! retrieval is synchronous and works on data already in memory. Provider failures,
//! exhausted cascades, failed decompositions and under-delivering fan-outs
//! are all absorbed here; an empty result is reported as
//! [`PipelineOutcome::NoInformation`] rather than an error.

use std::sync::Arc;
use std::time::Duration;

use sift_search::{CandidateResult, ProviderCascade, deduplicate};
use tokio::time::{Instant, timeout_at};

use crate::config::{MAX_TIMEOUT_SECS, PipelineConfig, SiftConfig};
use crate::credibility::CredibilityScorer;
use crate::diversity::{select_diverse, unique_domains};
use crate::error::Result;
use crate::executor::ParallelSubqueryExecutor;
use crate::generation::{Generator, OpenAiGenerator};
use crate::planner::{QueryPlan, QueryPlanner};
use crate::rerank::rerank;
use crate::types::{Diagnostics, EvidenceSet, PipelineOutcome, Query};
use crate::verify::cross_verify;

/// Characters of a sub-query shown in reasoning steps.
const STEP_QUERY_CHARS: usize = 60;

/// Orchestrates retrieval and ranking for one question at a time.
///
/// Cheap to share behind an `Arc`; the cascade (and its cache and circuit
/// breaker) is shared by every run.
#[derive(Debug, Clone)]
pub struct ResearchPipeline {
    cascade: Arc<ProviderCascade>,
    planner: QueryPlanner,
    executor: ParallelSubqueryExecutor,
    scorer: CredibilityScorer,
    config: PipelineConfig,
}

impl ResearchPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(cascade: Arc<ProviderCascade>, generator: Arc<dyn Generator>, config: &SiftConfig) -> Self {
        let executor = ParallelSubqueryExecutor::new(
            Arc::clone(&cascade),
            Duration::from_secs(config.pipeline.subquery_timeout_secs),
            config.pipeline.subquery_results,
        );
        Self {
            cascade,
            planner: QueryPlanner::new(generator),
            executor,
            scorer: CredibilityScorer::new(config.credibility.clone()),
            config: config.pipeline.clone(),
        }
    }

    /// Build the real providers and the OpenAI-compatible generator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SiftError::Config`] for invalid configuration.
    pub fn from_config(config: &SiftConfig) -> Result<Self> {
        config.validate()?;
        let cascade = Arc::new(ProviderCascade::from_config(&config.search)?);
        let generator: Arc<dyn Generator> = Arc::new(OpenAiGenerator::new(&config.generation)?);
        Ok(Self::new(cascade, generator, config))
    }

    /// Replace the credibility scorer, e.g. to pin the freshness year.
    pub fn with_scorer(mut self, scorer: CredibilityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// The planner used by this pipeline.
    pub fn planner(&self) -> &QueryPlanner {
        &self.planner
    }

    /// The shared provider cascade.
    pub fn cascade(&self) -> &Arc<ProviderCascade> {
        &self.cascade
    }

    /// Run the full pipeline for `query`.
    ///
    /// # Errors
    ///
    /// Currently infallible in practice; retrieval failures degrade to
    /// [`PipelineOutcome::NoInformation`]. The `Result` leaves room for
    /// collaborators that can fail hard.
    pub async fn process(&self, query: &Query) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let deadline = deadline_after(started, self.config.overall_timeout_secs);
        let planning_deadline = deadline_after(started, self.config.planning_timeout_secs).min(deadline);
        let mut diagnostics = Diagnostics::default();
        tracing::trace!(query = %query.text, "pipeline start");

        let enhanced = if query.history.is_empty() {
            diagnostics.step("Processing query without prior context");
            query.text.clone()
        } else {
            diagnostics.step("Analyzing previous conversation context");
            let enhance = self.planner.enhance_query(query, self.config.history_window);
            match timeout_at(planning_deadline, enhance).await {
                Ok(enhanced) if enhanced != query.text => {
                    diagnostics.step(format!("Enhanced query: \"{enhanced}\""));
                    enhanced
                }
                Ok(_) => {
                    diagnostics.step("Using original query");
                    query.text.clone()
                }
                Err(_) => {
                    tracing::warn!("query enhancement timed out, using original query");
                    diagnostics.step("Context analysis timed out, using original query");
                    query.text.clone()
                }
            }
        };
        diagnostics.enhanced_query = enhanced.clone();

        let plan = match timeout_at(planning_deadline, self.planner.plan(&enhanced)).await {
            Ok(plan) => plan,
            Err(_) => {
                tracing::warn!("query decomposition timed out, searching original query");
                diagnostics.step("Query decomposition timed out");
                QueryPlan::undecomposed(&enhanced)
            }
        };
        diagnostics.multi_hop = plan.multi_hop;
        diagnostics.sub_queries = plan.texts();

        let collected = if plan.decomposed {
            diagnostics.step("Complex question detected, applying multi-hop retrieval");
            diagnostics.step(format!("Split into {} sub-questions", plan.sub_queries.len()));

            let report = self.executor.execute(&plan.sub_queries, deadline).await;
            diagnostics.failed_branches = report.failed;
            diagnostics.step(format!(
                "Sub-queries: {} succeeded, {} failed, {} results",
                report.succeeded,
                report.failed,
                report.results.len()
            ));

            let needs_fallback = report.needs_direct_fallback();
            let mut results = report.results;
            if needs_fallback {
                diagnostics.fallback_used = true;
                diagnostics.step(format!(
                    "Insufficient sub-query results, performing direct search for \"{}\"",
                    sift_search::types::truncate_chars(&enhanced, STEP_QUERY_CHARS)
                ));
                let direct = self
                    .direct_search(&enhanced, self.config.direct_search_results, deadline)
                    .await;
                diagnostics.step(format!("Direct search added {} results", direct.len()));
                results.extend(direct);
            }
            results
        } else {
            if plan.multi_hop {
                diagnostics.step("Decomposition unavailable, searching the question directly");
            }
            diagnostics.step(format!("Searching for: \"{enhanced}\""));
            let results = self
                .direct_search(&enhanced, self.config.direct_search_results, deadline)
                .await;
            diagnostics.step(format!("Found {} sources", results.len()));
            results
        };

        diagnostics.candidates_collected = collected.len();
        let unique = deduplicate(collected);
        diagnostics.candidates_unique = unique.len();

        if unique.is_empty() {
            diagnostics.step("No relevant information found");
            diagnostics.elapsed_ms = elapsed_ms(started);
            tracing::info!(elapsed_ms = diagnostics.elapsed_ms, "pipeline found nothing");
            return Ok(PipelineOutcome::NoInformation(diagnostics));
        }

        diagnostics.step("Applying BM25 re-ranking");
        let ranked = rerank(&enhanced, unique);

        diagnostics.step("Evaluating source credibility");
        let credible = self.scorer.rank(ranked);

        diagnostics.step("Ensuring source diversity");
        let selection = select_diverse(&credible, self.config.max_selected, self.config.max_per_domain);
        diagnostics.selected = selection.len();
        diagnostics.unique_domains = unique_domains(&selection);

        diagnostics.step("Cross-verifying information across sources");
        let verdict = cross_verify(&selection);
        if let Some(verdict) = &verdict {
            diagnostics.step(format!("Verification: {verdict}"));
        }

        let display: Vec<CandidateResult> = selection
            .iter()
            .take(self.config.display_limit)
            .cloned()
            .collect();

        diagnostics.elapsed_ms = elapsed_ms(started);
        tracing::info!(
            collected = diagnostics.candidates_collected,
            unique = diagnostics.candidates_unique,
            selected = diagnostics.selected,
            domains = diagnostics.unique_domains,
            elapsed_ms = diagnostics.elapsed_ms,
            "pipeline finished"
        );

        Ok(PipelineOutcome::Evidence(EvidenceSet {
            selection,
            display,
            verdict,
            diagnostics,
        }))
    }

    /// Quick lookup: one direct search, deduplicated, in provider order.
    ///
    /// No enhancement, decomposition, reranking or verification. Each
    /// result still gets a credibility score for display.
    ///
    /// # Errors
    ///
    /// Same as [`process`](Self::process).
    pub async fn process_simple(&self, query: &Query) -> Result<PipelineOutcome> {
        let started = Instant::now();
        let deadline = deadline_after(started, self.config.overall_timeout_secs);
        let mut diagnostics = Diagnostics {
            enhanced_query: query.text.clone(),
            sub_queries: vec![query.text.clone()],
            ..Default::default()
        };

        diagnostics.step(format!("Searching for: \"{}\"", query.text));
        let collected = self
            .direct_search(&query.text, self.config.simple_search_results, deadline)
            .await;
        diagnostics.candidates_collected = collected.len();

        let unique = deduplicate(collected);
        diagnostics.candidates_unique = unique.len();
        diagnostics.elapsed_ms = elapsed_ms(started);

        if unique.is_empty() {
            diagnostics.step("No relevant information found");
            return Ok(PipelineOutcome::NoInformation(diagnostics));
        }
        diagnostics.step(format!("Found {} sources", unique.len()));

        let selection: Vec<CandidateResult> = unique
            .into_iter()
            .take(self.config.simple_search_results)
            .map(|mut c| {
                c.credibility = self.scorer.score(&c);
                c
            })
            .collect();
        diagnostics.selected = selection.len();
        diagnostics.unique_domains = unique_domains(&selection);

        Ok(PipelineOutcome::Evidence(EvidenceSet {
            display: selection.clone(),
            selection,
            verdict: None,
            diagnostics,
        }))
    }

    /// One cascade call bounded by `deadline`. Failures and timeouts yield
    /// an empty list.
    async fn direct_search(&self, query: &str, max_results: usize, deadline: Instant) -> Vec<CandidateResult> {
        match tokio::time::timeout_at(deadline, self.cascade.search(query, max_results)).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "direct search failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!("direct search hit the pipeline deadline");
                Vec::new()
            }
        }
    }
}

/// `start + secs`, with `secs` capped so the addition cannot overflow.
fn deadline_after(start: Instant, secs: u64) -> Instant {
    start + Duration::from_secs(secs.min(MAX_TIMEOUT_SECS))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
