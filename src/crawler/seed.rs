//! Crawl seed built from operator input

use crate::url::extract_domain;
use crate::UrlError;
use url::Url;

/// Immutable inputs for one crawl run
#[derive(Debug, Clone)]
pub struct Seed {
    /// Absolute homepage URL the crawl starts from
    pub homepage_url: Url,

    /// Host that bounds the crawl (subdomains included)
    pub base_domain: String,

    /// Keywords and phrases to profile, as supplied by the operator
    pub keywords: Vec<String>,
}

impl Seed {
    /// Builds a seed from a homepage URL and a comma-separated keyword list
    ///
    /// # Examples
    ///
    /// ```
    /// use site_scout::Seed;
    ///
    /// let seed = Seed::new("https://www.example.com/", " cat food, Dog ,,").unwrap();
    /// assert_eq!(seed.base_domain, "www.example.com");
    /// assert_eq!(seed.keywords, vec!["cat food".to_string(), "Dog".to_string()]);
    /// ```
    pub fn new(homepage: &str, keyword_list: &str) -> Result<Self, UrlError> {
        let homepage_url =
            Url::parse(homepage.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

        if homepage_url.scheme() != "http" && homepage_url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                homepage_url.scheme()
            )));
        }

        let base_domain = extract_domain(&homepage_url).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            homepage_url,
            base_domain,
            keywords: parse_keywords(keyword_list),
        })
    }
}

/// Splits a comma-separated keyword list
///
/// Items are trimmed, empty items are dropped, and case-insensitive
/// duplicates keep their first spelling.
pub fn parse_keywords(list: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let lowered = item.to_lowercase();
        if !keywords.iter().any(|k| k.to_lowercase() == lowered) {
            keywords.push(item.to_string());
        }
    }
    keywords
}
