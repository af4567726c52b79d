//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures per provider and temporarily skips providers
//! that keep failing. After a cooldown a tripped provider gets a single
//! trial request that decides whether the circuit closes again. Concurrent
//! callers are turned away while that request is in flight. A trial that
//! never reports back (its caller was cancelled) expires after another
//! cooldown.
//!
//! # State Machine
//!
//! ```text
//! ┌────────┐  N failures   ┌────────┐  cooldown   ┌──────────┐
//! │ Closed ├──────────────►│  Open  ├────────────►│ HalfOpen │
//! └───▲────┘               └────────┘             └────┬─────┘
//!     │                         ▲                      │
//!     │  success                │  failure             │
//!     └─────────────────────────┴──────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Circuit state for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Provider is healthy, requests flow through.
    Closed,
    /// Provider failed too often, requests are skipped until cooldown expires.
    Open,
    /// Cooldown elapsed, one trial request is allowed at a time.
    HalfOpen,
}

#[derive(Debug, Clone)]
struct ProviderHealth {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    trial_started_at: Option<Instant>,
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            trial_started_at: None,
        }
    }
}

/// Failure-counting breaker keyed by provider name.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    cooldown: Duration,
    providers: HashMap<String, ProviderHealth>,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `failure_threshold` consecutive
    /// failures and tries again after `cooldown`.
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            cooldown,
            providers: HashMap::new(),
        }
    }

    /// Record a successful call. Closes the circuit and resets the count.
    pub fn record_success(&mut self, provider: &str) {
        let health = self.providers.entry(provider.to_string()).or_default();
        health.state = CircuitState::Closed;
        health.consecutive_failures = 0;
        health.trial_started_at = None;
    }

    /// Record a failed call, opening the circuit at the threshold.
    ///
    /// A failure while half-open re-opens immediately.
    pub fn record_failure(&mut self, provider: &str) {
        let threshold = self.failure_threshold;
        let health = self.providers.entry(provider.to_string()).or_default();
        health.consecutive_failures += 1;
        health.last_failure_at = Some(Instant::now());
        health.trial_started_at = None;

        if health.state == CircuitState::HalfOpen || health.consecutive_failures >= threshold {
            health.state = CircuitState::Open;
        }
    }

    /// Whether a call to `provider` should be attempted now.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open and
    /// lets this caller through as the trial. Further callers are refused
    /// until the trial records an outcome.
    pub fn should_attempt(&mut self, provider: &str) -> bool {
        let cooldown = self.cooldown;
        let health = self.providers.entry(provider.to_string()).or_default();

        let trial_free = match health.state {
            CircuitState::Closed => return true,
            CircuitState::HalfOpen => health
                .trial_started_at
                .is_none_or(|t| t.elapsed() >= cooldown),
            CircuitState::Open => health
                .last_failure_at
                .is_none_or(|t| t.elapsed() >= cooldown),
        };
        if trial_free {
            health.state = CircuitState::HalfOpen;
            health.trial_started_at = Some(Instant::now());
        }
        trial_free
    }

    /// Current state for `provider` (closed if never seen).
    pub fn state(&self, provider: &str) -> CircuitState {
        self.providers
            .get(provider)
            .map_or(CircuitState::Closed, |h| h.state)
    }

    /// `(provider, state, consecutive_failures)` for every provider seen.
    pub fn health_report(&self) -> Vec<(String, CircuitState, u32)> {
        let mut report: Vec<_> = self
            .providers
            .iter()
            .map(|(name, h)| (name.clone(), h.state, h.consecutive_failures))
            .collect();
        report.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }
}
