//! Error types for the sift pipeline.
//!
//! Each variant carries a stable error code (SCREAMING_SNAKE_CASE) that is
//! included in the Display output and accessible via [`SiftError::code()`].
//!
//! Most retrieval failures never reach this type: provider errors, empty
//! cascades, decomposition failures and under-delivering fan-outs are all
//! recovered inside the pipeline. What remains is configuration, the
//! generation collaborator, session storage and hard search failures
//! surfaced by `sift-search`.

/// Stable error codes for programmatic error handling.
pub mod error_codes {
    /// Invalid or missing configuration.
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";

    /// The generation collaborator failed or returned nothing usable.
    pub const GENERATION_FAILED: &str = "GENERATION_FAILED";

    /// A search operation failed in a way the pipeline could not absorb.
    pub const SEARCH_FAILED: &str = "SEARCH_FAILED";

    /// Request or operation timed out.
    pub const TIMEOUT_ERROR: &str = "TIMEOUT_ERROR";

    /// Session storage error.
    pub const SESSION_ERROR: &str = "SESSION_ERROR";

    /// Unrecognised research mode.
    pub const INVALID_MODE: &str = "INVALID_MODE";
}

/// Errors produced by the sift pipeline.
///
/// The Display impl formats as `[CODE] message`.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// Invalid or missing configuration.
    #[error("[{}] {}", error_codes::CONFIG_INVALID, .0)]
    Config(String),

    /// The generation collaborator failed.
    #[error("[{}] {}", error_codes::GENERATION_FAILED, .0)]
    Generation(String),

    /// A search failure that could not be recovered locally.
    #[error("[{}] {}", error_codes::SEARCH_FAILED, .0)]
    Search(String),

    /// Request or operation timed out.
    #[error("[{}] {}", error_codes::TIMEOUT_ERROR, .0)]
    Timeout(String),

    /// Session storage error.
    #[error("[{}] {}", error_codes::SESSION_ERROR, .0)]
    Session(String),

    /// Unrecognised research mode.
    #[error("[{}] {}", error_codes::INVALID_MODE, .0)]
    InvalidMode(String),
}

impl SiftError {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => error_codes::CONFIG_INVALID,
            Self::Generation(_) => error_codes::GENERATION_FAILED,
            Self::Search(_) => error_codes::SEARCH_FAILED,
            Self::Timeout(_) => error_codes::TIMEOUT_ERROR,
            Self::Session(_) => error_codes::SESSION_ERROR,
            Self::InvalidMode(_) => error_codes::INVALID_MODE,
        }
    }

    /// Returns the inner message without the code prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Generation(m)
            | Self::Search(m)
            | Self::Timeout(m)
            | Self::Session(m)
            | Self::InvalidMode(m) => m,
        }
    }

    /// Returns true if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Config(_) | Self::InvalidMode(_) | Self::Session(_) => false,
            Self::Generation(_) | Self::Search(_) | Self::Timeout(_) => true,
        }
    }
}

impl From<sift_search::SearchError> for SiftError {
    fn from(err: sift_search::SearchError) -> Self {
        match err {
            sift_search::SearchError::Config(m) => Self::Config(m),
            sift_search::SearchError::Timeout(m) => Self::Timeout(m),
            other => Self::Search(other.to_string()),
        }
    }
}

/// Convenience alias for sift results.
pub type Result<T> = std::result::Result<T, SiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_prefix() {
        let err = SiftError::Config("pipeline.max_selected must be > 0".into());
        assert_eq!(
            err.to_string(),
            "[CONFIG_INVALID] pipeline.max_selected must be > 0"
        );
    }

    #[test]
    fn code_and_message_are_split() {
        let err = SiftError::Generation("empty choices".into());
        assert_eq!(err.code(), "GENERATION_FAILED");
        assert_eq!(err.message(), "empty choices");
    }

    #[test]
    fn every_variant_has_distinct_code() {
        let errors = [
            SiftError::Config(String::new()),
            SiftError::Generation(String::new()),
            SiftError::Search(String::new()),
            SiftError::Timeout(String::new()),
            SiftError::Session(String::new()),
            SiftError::InvalidMode(String::new()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(SiftError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn retryable_classification() {
        assert!(SiftError::Timeout("x".into()).is_retryable());
        assert!(SiftError::Generation("x".into()).is_retryable());
        assert!(!SiftError::Config("x".into()).is_retryable());
        assert!(!SiftError::InvalidMode("x".into()).is_retryable());
    }

    #[test]
    fn search_errors_map_by_kind() {
        let cfg: SiftError = sift_search::SearchError::Config("bad".into()).into();
        assert_eq!(cfg.code(), "CONFIG_INVALID");

        let timeout: SiftError = sift_search::SearchError::Timeout("slow".into()).into();
        assert_eq!(timeout.code(), "TIMEOUT_ERROR");

        let all: SiftError = sift_search::SearchError::AllProvidersFailed("x".into()).into();
        assert_eq!(all.code(), "SEARCH_FAILED");
        assert!(all.message().contains("all search providers failed"));
    }
}
