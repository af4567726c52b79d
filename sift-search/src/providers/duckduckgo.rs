//! DuckDuckGo HTML provider: last-resort scraper.
//!
//! Uses the HTML-only endpoint at `https://html.duckduckgo.com/html/`,
//! which needs no JavaScript and tolerates automated requests.

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::SearchProvider;
use crate::types::{positional_score, truncate_chars, CandidateResult, ProviderKind};

const DDG_HTML_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo HTML scraper.
pub struct DuckDuckGoHtmlProvider {
    client: reqwest::Client,
    endpoint: String,
    max_content_chars: usize,
}

impl DuckDuckGoHtmlProvider {
    /// Create a scraper for the public HTML endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        Ok(Self {
            client: http::build_client(config)?,
            endpoint: DDG_HTML_ENDPOINT.to_string(),
            max_content_chars: config.max_content_chars,
        })
    }

    /// Override the HTML endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Extract the target URL from DuckDuckGo's redirect wrapper.
    ///
    /// DDG wraps links like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`.
    fn extract_url(href: &str) -> Option<String> {
        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else {
            href.to_string()
        };

        let parsed = Url::parse(&full_href).ok()?;

        if parsed.host_str() == Some("duckduckgo.com") && parsed.path().starts_with("/l/") {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        } else {
            Some(full_href)
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoHtmlProvider {
    fn name(&self) -> &str {
        ProviderKind::DuckDuckGoHtml.name()
    }

    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        tracing::trace!(query, "DuckDuckGo HTML search");

        let request = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .header("Referer", "https://duckduckgo.com/");
        let html = http::fetch_body(request, "DuckDuckGo HTML", http::RequestProfile::HtmlPage).await?;

        tracing::trace!(bytes = html.len(), "DuckDuckGo HTML response received");

        parse_duckduckgo_html(&html, max_results, self.max_content_chars)
    }
}

/// Parse a DuckDuckGo HTML page into candidate results.
pub(crate) fn parse_duckduckgo_html(
    html: &str,
    max_results: usize,
    max_content_chars: usize,
) -> Result<Vec<CandidateResult>, SearchError> {
    let document = Html::parse_document(html);

    let result_sel = Selector::parse(".result:not(.result--ad)")
        .map_err(|e| SearchError::Parse(format!("invalid result selector: {e:?}")))?;
    let title_sel = Selector::parse(".result__a")
        .map_err(|e| SearchError::Parse(format!("invalid title selector: {e:?}")))?;
    let snippet_sel = Selector::parse(".result__snippet")
        .map_err(|e| SearchError::Parse(format!("invalid snippet selector: {e:?}")))?;

    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }

        let Some(title_el) = element.select(&title_sel).next() else {
            continue;
        };

        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let Some(url) = title_el
            .value()
            .attr("href")
            .and_then(DuckDuckGoHtmlProvider::extract_url)
        else {
            continue;
        };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let position = results.len();
        results.push(CandidateResult::new(
            title,
            url,
            truncate_chars(&snippet, max_content_chars),
            ProviderKind::DuckDuckGoHtml.name(),
            positional_score(0.8, 0.05, position),
        ));
    }

    tracing::debug!(count = results.len(), "DuckDuckGo HTML results parsed");
    Ok(results)
}
