//! Deterministic collaborators shared by unit and integration tests.
//!
//! [`ScriptedGenerator`] replays canned completions (or fails), and
//! [`ScriptedProvider`] answers searches from a fixed table with optional
//! delay and failure, so pipeline behaviour can be exercised without any
//! network access.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sift_search::{CandidateResult, SearchError, SearchProvider};

use crate::error::{Result, SiftError};
use crate::generation::Generator;

/// Generator that returns queued responses in order.
///
/// When the queue is empty every call fails, which doubles as an
/// "unavailable collaborator".
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl ScriptedGenerator {
    /// A generator that answers with `responses`, then fails.
    pub fn new(responses: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    /// Sleep for `latency` before every completion.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// A generator whose every call fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn complete(&self, prompt: &str, _temperature: f64, _max_tokens: u32) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let next = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| Err(SiftError::Generation("scripted generator exhausted".into())))
    }
}

/// Search provider answering from a fixed query → results table.
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    answers: HashMap<String, Vec<CandidateResult>>,
    fallback: Vec<CandidateResult>,
    delays: HashMap<String, Duration>,
    fail_all: bool,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// A provider named `name` that returns nothing until configured.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            answers: HashMap::new(),
            fallback: Vec::new(),
            delays: HashMap::new(),
            fail_all: false,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Return `results` for exactly `query`.
    pub fn answer(mut self, query: impl Into<String>, results: Vec<CandidateResult>) -> Self {
        self.answers.insert(query.into(), results);
        self
    }

    /// Return `results` for any query without a specific answer.
    pub fn otherwise(mut self, results: Vec<CandidateResult>) -> Self {
        self.fallback = results;
        self
    }

    /// Sleep for `delay` before answering `query`.
    pub fn delay(mut self, query: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(query.into(), delay);
        self
    }

    /// Fail every call.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Number of searches served.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<Vec<CandidateResult>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        if self.fail_all {
            return Err(SearchError::Http(format!("{} unavailable", self.name)));
        }
        let results = self.answers.get(query).unwrap_or(&self.fallback);
        Ok(results.iter().take(max_results).cloned().collect())
    }
}

/// Build a candidate on `url` with a derived title.
pub fn candidate(url: &str, content: &str) -> CandidateResult {
    let title = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .to_string();
    CandidateResult::new(title, url, content, "scripted", 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_generator_replays_then_fails() {
        let generator = ScriptedGenerator::new(["one", "two"]);
        assert_eq!(generator.complete("a", 0.3, 10).await.expect("first"), "one");
        assert_eq!(generator.complete("b", 0.3, 10).await.expect("second"), "two");
        assert!(generator.complete("c", 0.3, 10).await.is_err());
        assert_eq!(generator.calls(), 3);
        assert_eq!(generator.prompts()[1], "b");
    }

    #[tokio::test]
    async fn scripted_provider_prefers_exact_answer() {
        let provider = ScriptedProvider::new("p")
            .answer("rust", vec![candidate("https://rust-lang.org", "rust")])
            .otherwise(vec![candidate("https://a.com", "a"), candidate("https://b.com", "b")]);

        assert_eq!(provider.search("rust", 10).await.expect("ok").len(), 1);
        assert_eq!(provider.search("other", 1).await.expect("ok").len(), 1);
        assert_eq!(provider.calls(), 2);
        assert_eq!(provider.queries(), vec!["rust", "other"]);
    }
}
