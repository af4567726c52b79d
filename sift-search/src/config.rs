//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which providers the cascade walks and in what
//! order, the sufficiency threshold, timeouts, rate limiting, caching and
//! provider endpoints. It deserialises from the `[search]` table of the
//! application config file; every field has a default.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::ProviderKind;

/// Configuration for provider cascade searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Providers in priority order. The cascade stops early once enough
    /// results have been collected.
    pub providers: Vec<ProviderKind>,
    /// Default maximum number of results a cascade call returns.
    pub max_results: usize,
    /// The cascade stops once at least this many results are accumulated.
    pub min_results_threshold: usize,
    /// Per-provider HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Minimum delay in milliseconds enforced between consecutive provider calls.
    pub request_delay_ms: u64,
    /// Base URL of the SearXNG instance.
    pub searxng_url: String,
    /// Brave Search subscription token. The Brave provider is skipped when unset.
    #[serde(skip_serializing)]
    pub brave_api_key: Option<String>,
    /// Custom User-Agent string. If `None`, rotates through a built-in list.
    pub user_agent: Option<String>,
    /// Provider content longer than this many characters is truncated.
    pub max_content_chars: usize,
    /// How long to cache cascade results in seconds. `0` disables caching.
    pub cache_ttl_seconds: u64,
    /// Consecutive failures before a provider's circuit opens.
    pub breaker_failure_threshold: u32,
    /// Seconds an open circuit waits before allowing a trial request.
    pub breaker_cooldown_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            providers: ProviderKind::all().to_vec(),
            max_results: 15,
            min_results_threshold: 3,
            timeout_seconds: 20,
            request_delay_ms: 500,
            searxng_url: "http://localhost:8080".into(),
            brave_api_key: None,
            user_agent: None,
            max_content_chars: 500,
            cache_ttl_seconds: 300,
            breaker_failure_threshold: 3,
            breaker_cooldown_secs: 60,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - `min_results_threshold` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `providers` must not be empty
    /// - `searxng_url` must parse when SearXNG is enabled
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.min_results_threshold == 0 {
            return Err(SearchError::Config(
                "min_results_threshold must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        if self.providers.contains(&ProviderKind::SearXng)
            && url::Url::parse(&self.searxng_url).is_err()
        {
            return Err(SearchError::Config(format!(
                "searxng_url is not a valid URL: {}",
                self.searxng_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, 15);
        assert_eq!(config.min_results_threshold, 3);
        assert_eq!(config.timeout_seconds, 20);
        assert_eq!(config.request_delay_ms, 500);
        assert_eq!(config.max_content_chars, 500);
        assert!(config.brave_api_key.is_none());
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn default_providers_follow_priority_order() {
        let config = SearchConfig::default();
        assert_eq!(
            config.providers,
            vec![
                ProviderKind::SearXng,
                ProviderKind::BraveApi,
                ProviderKind::InstantAnswer,
                ProviderKind::DuckDuckGoHtml,
            ]
        );
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn zero_threshold_rejected() {
        let config = SearchConfig {
            min_results_threshold: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_results_threshold"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn empty_providers_rejected() {
        let config = SearchConfig {
            providers: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider"));
    }

    #[test]
    fn bad_searxng_url_rejected_only_when_enabled() {
        let config = SearchConfig {
            searxng_url: "not a url".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SearchConfig {
            searxng_url: "not a url".into(),
            providers: vec![ProviderKind::DuckDuckGoHtml],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_partial_table_with_defaults() {
        let json = r#"{"providers":["instant_answer"],"min_results_threshold":5}"#;
        let config: SearchConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.providers, vec![ProviderKind::InstantAnswer]);
        assert_eq!(config.min_results_threshold, 5);
        assert_eq!(config.max_results, 15);
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = SearchConfig {
            brave_api_key: Some("secret-token".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).expect("serialize");
        assert!(!json.contains("secret-token"));
    }
}
