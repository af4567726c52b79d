//! Error types for the sift-search crate.
//!
//! Messages are stable and never include API keys or subscription tokens.

/// Errors that can occur while querying search providers.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Every provider attempted by the cascade failed.
    #[error("all search providers failed: {0}")]
    AllProvidersFailed(String),

    /// A provider call timed out.
    #[error("search timed out: {0}")]
    Timeout(String),

    /// An HTTP request to a provider failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a provider response body.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Returns true for failures that are expected to clear on their own
    /// (network errors, timeouts, upstream hiccups).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout(_))
    }
}

/// Convenience type alias for sift-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
