//! Domain extraction from visited URLs

use crate::errors::{MonitorError, Result};
use url::Url;

/// Schemes that belong to the browser itself rather than a visited site.
/// URLs with these schemes are never recorded and never reported.
const INTERNAL_SCHEMES: &[&str] = &[
    "about",
    "blob",
    "chrome",
    "chrome-extension",
    "chrome-untrusted",
    "data",
    "devtools",
    "edge",
    "javascript",
    "moz-extension",
    "opera",
    "view-source",
    "vivaldi",
];

/// Extract the hostname from a visited URL.
///
/// Returns `Ok(None)` for browser-internal schemes and for URLs that carry
/// no host. Unparseable input is an error so callers can log and skip it.
pub fn extract_domain(raw_url: &str) -> Result<Option<String>> {
    let parsed = Url::parse(raw_url)
        .map_err(|e| MonitorError::Url(format!("invalid URL {:?}: {}", raw_url, e)))?;

    if is_internal_scheme(parsed.scheme()) {
        return Ok(None);
    }

    Ok(parsed.host_str().map(|host| host.to_string()))
}

/// Check whether a URL scheme is browser-internal
pub fn is_internal_scheme(scheme: &str) -> bool {
    INTERNAL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_hostname() {
        let domain = extract_domain("https://example.com/path?q=1").unwrap();
        assert_eq!(domain, Some("example.com".to_string()));
    }

    #[test]
    fn test_extracts_subdomain_host() {
        let domain = extract_domain("http://news.ycombinator.com/item?id=1").unwrap();
        assert_eq!(domain, Some("news.ycombinator.com".to_string()));
    }

    #[test]
    fn test_internal_schemes_are_skipped() {
        assert_eq!(extract_domain("chrome://extensions/").unwrap(), None);
        assert_eq!(extract_domain("about:blank").unwrap(), None);
        assert_eq!(extract_domain("devtools://devtools/bundled/inspector.html").unwrap(), None);
        assert_eq!(
            extract_domain("chrome-extension://abcdef/popup.html").unwrap(),
            None
        );
    }

    #[test]
    fn test_internal_scheme_check_is_case_insensitive() {
        assert!(is_internal_scheme("Chrome"));
        assert!(is_internal_scheme("ABOUT"));
        assert!(!is_internal_scheme("https"));
    }

    #[test]
    fn test_url_without_host_is_skipped() {
        assert_eq!(extract_domain("file:///etc/hosts").unwrap(), None);
    }

    #[test]
    fn test_invalid_url_is_an_error() {
        assert!(extract_domain("not a url").is_err());
        assert!(extract_domain("").is_err());
    }
}
