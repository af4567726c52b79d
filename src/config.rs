//! Configuration types for sift.
//!
//! [`SiftConfig`] is loaded from a TOML file with one table per concern:
//!
//! ```toml
//! [search]
//! searxng_url = "http://localhost:8080"
//! min_results_threshold = 3
//!
//! [pipeline]
//! overall_timeout_secs = 20
//! planning_timeout_secs = 8
//! max_per_domain = 2
//!
//! [generation]
//! model = "gpt-4"
//!
//! [credibility]
//! tier1_domains = ["wikipedia.org", "reuters.com"]
//! ```
//!
//! Every field has a default, so an empty file is a valid config. Secrets
//! are normally supplied through the environment rather than the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sift_search::SearchConfig;

use crate::credibility::CredibilityTables;
use crate::error::{Result, SiftError};

/// Upper bound for every pipeline timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Top-level sift configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Provider cascade settings.
    pub search: SearchConfig,
    /// Orchestration deadlines and selection budgets.
    pub pipeline: PipelineConfig,
    /// OpenAI-compatible generation endpoint.
    pub generation: GenerationConfig,
    /// Domain tiers and keyword tables for credibility scoring.
    pub credibility: CredibilityTables,
}

/// Deadlines, fan-out sizes and selection budgets for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Overall deadline for one run in seconds, generation calls included.
    pub overall_timeout_secs: u64,
    /// Share of the overall deadline that query enhancement and
    /// decomposition may use before retrieval starts without them.
    pub planning_timeout_secs: u64,
    /// Per sub-query branch timeout in seconds.
    pub subquery_timeout_secs: u64,
    /// Maximum size of the diversity-constrained selection.
    pub max_selected: usize,
    /// How many selected sources are shown to the generator.
    pub display_limit: usize,
    /// Maximum selected entries sharing one domain.
    pub max_per_domain: usize,
    /// Results requested for a direct (non-decomposed) search.
    pub direct_search_results: usize,
    /// Results requested per sub-query branch.
    pub subquery_results: usize,
    /// Results requested in simple mode.
    pub simple_search_results: usize,
    /// Conversation turns considered for query enhancement.
    pub history_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            overall_timeout_secs: 20,
            planning_timeout_secs: 8,
            subquery_timeout_secs: 12,
            max_selected: 10,
            display_limit: 8,
            max_per_domain: 2,
            direct_search_results: 15,
            subquery_results: 5,
            simple_search_results: 5,
            history_window: 6,
        }
    }
}

/// OpenAI-compatible chat completion endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key. Never written back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4".into(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SiftConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SiftError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            SiftError::Config(format!(
                "failed to parse config file '{}': {e}",
                path.display()
            ))
        })
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] on serialization or write failure.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SiftError::Config(format!(
                    "failed to create config directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| SiftError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| SiftError::Config(format!("failed to write config: {e}")))
    }

    /// Returns the default config file path.
    ///
    /// `$SIFT_CONFIG_DIR/config.toml` when set, else
    /// `dirs::config_dir()/sift/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        let dir = match std::env::var_os("SIFT_CONFIG_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .map(|d| d.join("sift"))
                .unwrap_or_else(|| PathBuf::from("/tmp/sift-config")),
        };
        dir.join("config.toml")
    }

    /// Load the effective configuration.
    ///
    /// Reads `path` if given, else the default path when it exists, else
    /// starts from defaults. Environment overrides are applied last and the
    /// result is validated.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] for unreadable files or invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `SEARXNG_URL`, `BRAVE_SEARCH_API_KEY`,
    /// `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`. Empty values
    /// are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("SEARXNG_URL") {
            self.search.searxng_url = url;
        }
        if let Some(key) = get("BRAVE_SEARCH_API_KEY") {
            self.search.brave_api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.generation.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.generation.base_url = url;
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;

        let p = &self.pipeline;
        let positive = [
            ("pipeline.overall_timeout_secs", p.overall_timeout_secs as usize),
            ("pipeline.planning_timeout_secs", p.planning_timeout_secs as usize),
            ("pipeline.subquery_timeout_secs", p.subquery_timeout_secs as usize),
            ("pipeline.max_selected", p.max_selected),
            ("pipeline.display_limit", p.display_limit),
            ("pipeline.max_per_domain", p.max_per_domain),
            ("pipeline.direct_search_results", p.direct_search_results),
            ("pipeline.subquery_results", p.subquery_results),
            ("pipeline.simple_search_results", p.simple_search_results),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(SiftError::Config(format!("{name} must be greater than 0")));
            }
        }
        if p.overall_timeout_secs > MAX_TIMEOUT_SECS {
            return Err(SiftError::Config(format!(
                "pipeline.overall_timeout_secs must be at most {MAX_TIMEOUT_SECS}"
            )));
        }
        if p.planning_timeout_secs >= p.overall_timeout_secs {
            return Err(SiftError::Config(
                "pipeline.planning_timeout_secs must be less than pipeline.overall_timeout_secs".into(),
            ));
        }

        if self.generation.model.trim().is_empty() {
            return Err(SiftError::Config("generation.model must not be empty".into()));
        }
        if url::Url::parse(&self.generation.base_url).is_err() {
            return Err(SiftError::Config(format!(
                "generation.base_url is not a valid URL: {}",
                self.generation.base_url
            )));
        }
        Ok(())
    }
}
