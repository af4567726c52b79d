//! Provider cascade: ordered fallback across independent search providers.
//!
//! Providers are tried strictly in priority order. After each provider's
//! results are appended the sufficiency predicate
//! (`accumulated >= min_results_threshold`) is checked and the cascade
//! stops once it holds. A provider that errors or returns nothing is
//! skipped; its failure is logged and never aborts the cascade.
//!
//! Output keeps provider priority order and is **not** deduplicated.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheKey, ResultCache};
use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::{build_providers, SearchProvider};
use crate::types::CandidateResult;

/// Fixed-interval rate limiter shared by every call through one cascade.
///
/// Each caller reserves the next free slot under the lock and then sleeps
/// outside it, so concurrent sub-query branches queue up without holding
/// the mutex across an await.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_free: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter enforcing `interval` between permitted calls.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_free: Mutex::new(None),
        }
    }

    /// Wait until the minimum interval since the previous call has passed.
    pub async fn acquire(&self) {
        if self.interval.is_zero() {
            return;
        }
        let now = Instant::now();
        let slot = {
            let mut next_free = match self.next_free.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let slot = next_free.map_or(now, |t| t.max(now));
            *next_free = Some(slot + self.interval);
            slot
        };
        if slot > now {
            tokio::time::sleep_until(slot).await;
        }
    }
}

/// Ordered provider cascade with a sufficiency threshold.
pub struct ProviderCascade {
    providers: Vec<Arc<dyn SearchProvider>>,
    min_results_threshold: usize,
    default_max_results: usize,
    limiter: RateLimiter,
    breaker: Mutex<CircuitBreaker>,
    cache: ResultCache,
}

impl ProviderCascade {
    /// Build a cascade over explicit provider adapters, in the given order.
    pub fn new(providers: Vec<Arc<dyn SearchProvider>>, config: &SearchConfig) -> Self {
        Self {
            providers,
            min_results_threshold: config.min_results_threshold.max(1),
            default_max_results: config.max_results,
            limiter: RateLimiter::new(Duration::from_millis(config.request_delay_ms)),
            breaker: Mutex::new(CircuitBreaker::new(
                config.breaker_failure_threshold,
                Duration::from_secs(config.breaker_cooldown_secs),
            )),
            cache: ResultCache::new(config.cache_ttl_seconds),
        }
    }

    /// Build a cascade with the real provider adapters listed in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid configuration or
    /// [`SearchError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let providers = build_providers(config)?;
        Ok(Self::new(providers, config))
    }

    /// Names of the providers in cascade order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Result count used when the caller has no preference.
    pub fn default_max_results(&self) -> usize {
        self.default_max_results
    }

    /// Circuit state of every provider that has been called.
    pub fn breaker_report(&self) -> Vec<(String, CircuitState, u32)> {
        self.with_breaker(|b| b.health_report())
    }

    /// Run the cascade for `query`, returning at most `max_results` results.
    ///
    /// Later providers are asked only for the results still missing. An
    /// exhausted cascade where at least one provider answered (even with
    /// zero results) yields `Ok` with whatever was collected.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::AllProvidersFailed`] only when every attempted
    /// provider failed, or when no provider could be attempted at all.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let key = CacheKey::new(query, max_results);
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(count = hit.len(), "cascade cache hit");
            return Ok(hit);
        }

        let sufficient = self.min_results_threshold.min(max_results);
        let mut accumulated: Vec<CandidateResult> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        let mut attempted = 0usize;

        for provider in &self.providers {
            if accumulated.len() >= sufficient {
                break;
            }
            let name = provider.name();

            if !self.with_breaker(|b| b.should_attempt(name)) {
                tracing::debug!(provider = name, "circuit open, skipping provider");
                continue;
            }

            if attempted > 0 {
                self.limiter.acquire().await;
            }
            attempted += 1;

            let remaining = max_results - accumulated.len();
            match provider.search(query, remaining).await {
                Ok(results) => {
                    self.with_breaker(|b| b.record_success(name));
                    if results.is_empty() {
                        tracing::debug!(provider = name, "provider returned no results");
                    } else {
                        tracing::debug!(provider = name, count = results.len(), "provider returned results");
                    }
                    accumulated.extend(results.into_iter().take(remaining));
                }
                Err(err) => {
                    self.with_breaker(|b| b.record_failure(name));
                    tracing::warn!(provider = name, error = %err, "provider failed, continuing cascade");
                    errors.push(format!("{name}: {err}"));
                }
            }
        }

        if accumulated.is_empty() && errors.len() == attempted {
            let reason = if attempted == 0 {
                "no provider available".to_string()
            } else {
                errors.join("; ")
            };
            return Err(SearchError::AllProvidersFailed(reason));
        }

        tracing::debug!(total = accumulated.len(), attempted, "cascade finished");
        self.cache.insert(key, accumulated.clone()).await;
        Ok(accumulated)
    }

    fn with_breaker<T>(&self, f: impl FnOnce(&mut CircuitBreaker) -> T) -> T {
        let mut guard = match self.breaker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl std::fmt::Debug for ProviderCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCascade")
            .field("providers", &self.provider_names())
            .field("min_results_threshold", &self.min_results_threshold)
            .field("cache", &self.cache)
            .finish()
    }
}
