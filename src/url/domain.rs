use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks whether a URL belongs to the crawl's base domain
///
/// A URL is in scope when its host equals `base_domain` or is a subdomain of
/// it. Hosts are compared case-insensitively; ports are ignored. Strings that
/// do not parse as absolute URLs are never in scope.
///
/// # Examples
///
/// ```
/// use site_scout::url::is_in_scope;
///
/// assert!(is_in_scope("https://example.com/x", "example.com"));
/// assert!(is_in_scope("https://sub.example.com/x", "example.com"));
/// assert!(!is_in_scope("https://other-domain.com/x", "example.com"));
/// assert!(!is_in_scope("https://notexample.com/x", "example.com"));
/// ```
pub fn is_in_scope(url: &str, base_domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = extract_domain(&parsed) else {
        return false;
    };

    let base = base_domain.trim().trim_end_matches('.').to_lowercase();
    if base.is_empty() {
        return false;
    }

    host == base || host.ends_with(&format!(".{}", base))
}
