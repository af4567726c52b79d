//! HTTP plumbing shared by the provider adapters.
//!
//! One client per provider, built from [`SearchConfig`], plus a single
//! request path that applies the provider's header profile and maps
//! transport failures, non-success statuses and body reads onto
//! [`SearchError`].

use crate::config::SearchConfig;
use crate::error::SearchError;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Browser User-Agent strings. Only the HTML scrape depends on looking like
/// a browser, but every client picks one so requests stay uniform.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Header profile a provider sends with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestProfile {
    /// JSON APIs: SearXNG, Brave, Instant Answer.
    JsonApi,
    /// The DuckDuckGo HTML results page.
    HtmlPage,
}

impl RequestProfile {
    fn headers(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::JsonApi => &[("Accept", "application/json")],
            Self::HtmlPage => &[
                ("Accept", "text/html,application/xhtml+xml"),
                ("Accept-Language", "en-US,en;q=0.9"),
            ],
        }
    }
}

/// Build a [`reqwest::Client`] for one provider.
///
/// Carries the configured timeout, a cookie store for the HTML scrape and
/// either the configured User-Agent or one from the rotation list.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Send `request` with the profile's headers and return the response body.
///
/// Timeouts become [`SearchError::Timeout`]. Transport failures and
/// non-success statuses become [`SearchError::Http`] naming `provider` and
/// the status code.
pub(crate) async fn fetch_body(
    request: reqwest::RequestBuilder,
    provider: &str,
    profile: RequestProfile,
) -> Result<String, SearchError> {
    let request = profile
        .headers()
        .iter()
        .fold(request, |req, (name, value)| req.header(*name, *value));

    let response = request
        .send()
        .await
        .map_err(|e| map_request_error(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Http(format!(
            "{provider} HTTP error: {}",
            status.as_u16()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| map_request_error(provider, e))
}

fn map_request_error(provider: &str, err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(format!("{provider} request timed out"))
    } else {
        SearchError::Http(format!("{provider} request failed: {err}"))
    }
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // USER_AGENTS is a non-empty const array
        .unwrap_or(USER_AGENTS[0])
}
