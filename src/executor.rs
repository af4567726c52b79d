//! Parallel sub-query fan-out over the provider cascade.
//!
//! Every sub-query runs as its own cascade call, bounded by a per-branch
//! timeout, and the fan-in loop is bounded by the overall pipeline
//! deadline. Results are appended in completion order. A branch that
//! errors, times out, or is still running at the deadline contributes
//! nothing and is counted as failed; it never cancels its siblings.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};
use sift_search::{CandidateResult, ProviderCascade};
use tokio::time::Instant;

use crate::types::SubQuery;

/// Fan-outs collecting fewer results than this trigger the direct fallback.
pub const MIN_FANOUT_RESULTS: usize = 3;

/// Whether a fan-out under-delivered and the caller should run one direct
/// search on the original query.
///
/// `k` is the number of sub-queries, `failures` the failed branches and
/// `results` the total collected. True iff `failures >= k / 2` (integer
/// division) or `results < 3`. A single-branch fan-out therefore always
/// falls back.
pub fn needs_direct_fallback(k: usize, failures: usize, results: usize) -> bool {
    failures >= k / 2 || results < MIN_FANOUT_RESULTS
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    /// Collected results in branch completion order (not deduplicated).
    pub results: Vec<CandidateResult>,
    /// Number of sub-queries launched.
    pub launched: usize,
    /// Branches that completed with a result list (possibly empty).
    pub succeeded: usize,
    /// Branches that errored, timed out, or missed the deadline.
    pub failed: usize,
}

impl FanOutReport {
    /// Apply [`needs_direct_fallback`] to this report.
    pub fn needs_direct_fallback(&self) -> bool {
        needs_direct_fallback(self.launched, self.failed, self.results.len())
    }
}

/// Runs sub-queries concurrently against a shared cascade.
#[derive(Debug, Clone)]
pub struct ParallelSubqueryExecutor {
    cascade: Arc<ProviderCascade>,
    branch_timeout: Duration,
    results_per_branch: usize,
}

impl ParallelSubqueryExecutor {
    /// Create an executor.
    pub fn new(cascade: Arc<ProviderCascade>, branch_timeout: Duration, results_per_branch: usize) -> Self {
        Self {
            cascade,
            branch_timeout,
            results_per_branch,
        }
    }

    /// Fan `sub_queries` out and collect whatever finishes before `deadline`.
    pub async fn execute(&self, sub_queries: &[SubQuery], deadline: Instant) -> FanOutReport {
        let mut report = FanOutReport {
            launched: sub_queries.len(),
            ..Default::default()
        };

        let mut branches: FuturesUnordered<_> = sub_queries
            .iter()
            .map(|sub_query| {
                let cascade = Arc::clone(&self.cascade);
                let text = sub_query.text.clone();
                let index = sub_query.index;
                let branch_timeout = self.branch_timeout;
                let max_results = self.results_per_branch;
                async move {
                    let outcome =
                        tokio::time::timeout(branch_timeout, cascade.search(&text, max_results)).await;
                    (index, outcome)
                }
            })
            .collect();

        loop {
            match tokio::time::timeout_at(deadline, branches.next()).await {
                Ok(Some((index, Ok(Ok(results))))) => {
                    tracing::debug!(branch = index, count = results.len(), "sub-query completed");
                    report.succeeded += 1;
                    report.results.extend(results);
                }
                Ok(Some((index, Ok(Err(e))))) => {
                    tracing::warn!(branch = index, error = %e, "sub-query failed");
                    report.failed += 1;
                }
                Ok(Some((index, Err(_)))) => {
                    tracing::warn!(branch = index, timeout = ?self.branch_timeout, "sub-query timed out");
                    report.failed += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    let unfinished = branches.len();
                    tracing::warn!(unfinished, "pipeline deadline reached, abandoning sub-queries");
                    report.failed += unfinished;
                    break;
                }
            }
        }

        tracing::debug!(
            launched = report.launched,
            succeeded = report.succeeded,
            failed = report.failed,
            results = report.results.len(),
            "fan-out finished"
        );
        report
    }
}
