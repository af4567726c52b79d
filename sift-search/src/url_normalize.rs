//! URL keys used for deduplication, domain diversity and URL hygiene checks.

use url::Url;

/// Query parameter keys treated as tracking noise.
const TRACKING_PARAMS: &[&str] = &["ref", "fbclid", "gclid", "si"];

/// Normalise a URL into its deduplication key.
///
/// Case-folds the whole string and strips trailing slashes. Applying it
/// twice yields the same key, which is what makes deduplication idempotent.
///
/// # Examples
///
/// ```
/// use sift_search::url_normalize::dedup_key;
///
/// assert_eq!(dedup_key("https://Example.com/Page/"), "https://example.com/page");
/// assert_eq!(dedup_key(&dedup_key("https://a.com//")), dedup_key("https://a.com"));
/// ```
pub fn dedup_key(raw: &str) -> String {
    raw.trim().to_lowercase().trim_end_matches('/').to_string()
}

/// Extract the normalised domain of a URL: lowercase hostname with any
/// leading `www.` removed.
///
/// Returns an empty string when the URL cannot be parsed or has no host.
///
/// # Examples
///
/// ```
/// use sift_search::url_normalize::domain_of;
///
/// assert_eq!(domain_of("https://WWW.Example.com/a"), "example.com");
/// assert_eq!(domain_of("not a url"), "");
/// ```
pub fn domain_of(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return String::new();
    };
    let host = parsed.host_str().unwrap_or("").to_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Returns `true` if the URL carries UTM or other tracking parameters.
pub fn has_tracking_params(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw.trim()) else {
        return false;
    };
    parsed.query_pairs().any(|(key, _)| {
        let k = key.to_lowercase();
        k.starts_with("utm_") || TRACKING_PARAMS.contains(&k.as_str())
    })
}
