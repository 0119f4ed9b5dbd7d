//! Sitemap resolution
//!
//! Strategies are tried in order, each only if the previous found nothing:
//! 1. A link on the homepage whose href mentions "sitemap"
//! 2. Conventional sitemap paths, checked with HEAD
//! 3. The first `Sitemap:` directive in robots.txt
//!
//! A transport failure inside a strategy counts as "found nothing".

use crate::crawler::links::find_sitemap_link;
use crate::crawler::transport::Transport;
use url::Url;

/// Conventional sitemap locations, relative to the homepage
pub const COMMON_SITEMAP_PATHS: &[&str] = &[
    "sitemap.xml",
    "sitemap_index.xml",
    "sitemap/sitemap.xml",
    "sitemap.xml.gz",
];

/// Which strategy located the sitemap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapSource {
    HomepageLink,
    CommonPath,
    RobotsTxt,
}

/// A resolved sitemap location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSitemap {
    pub url: String,
    pub source: SitemapSource,
}

/// Resolves the sitemap URL for a homepage
///
/// # Returns
///
/// * `Some(ResolvedSitemap)` - The first strategy that produced a URL
/// * `None` - No strategy found a sitemap
pub async fn resolve_sitemap(transport: &dyn Transport, homepage: &Url) -> Option<ResolvedSitemap> {
    if let Some(url) = sitemap_from_homepage(transport, homepage).await {
        return Some(ResolvedSitemap {
            url,
            source: SitemapSource::HomepageLink,
        });
    }

    tracing::info!("No sitemap link found on the homepage. Checking common sitemap URLs...");
    if let Some(url) = check_common_paths(transport, homepage).await {
        return Some(ResolvedSitemap {
            url,
            source: SitemapSource::CommonPath,
        });
    }

    tracing::info!("No common sitemap URL found. Checking robots.txt...");
    if let Some(url) = sitemap_from_robots(transport, homepage).await {
        return Some(ResolvedSitemap {
            url,
            source: SitemapSource::RobotsTxt,
        });
    }

    None
}

/// Strategy 1: scan homepage anchors for a sitemap link
async fn sitemap_from_homepage(transport: &dyn Transport, homepage: &Url) -> Option<String> {
    match transport.fetch(homepage.as_str()).await {
        Ok(page) => find_sitemap_link(&page.body, homepage),
        Err(e) => {
            tracing::warn!("Failed to fetch homepage {}: {}", homepage, e);
            None
        }
    }
}

/// Strategy 2: HEAD each conventional path
async fn check_common_paths(transport: &dyn Transport, homepage: &Url) -> Option<String> {
    for path in COMMON_SITEMAP_PATHS {
        let Ok(candidate) = homepage.join(path) else {
            continue;
        };

        match transport.fetch_head(candidate.as_str()).await {
            Ok(200) => return Some(candidate.to_string()),
            Ok(status) => tracing::debug!("Sitemap candidate {} returned {}", candidate, status),
            Err(e) => tracing::debug!("Sitemap candidate {} failed: {}", candidate, e),
        }
    }
    None
}

/// Strategy 3: read the `Sitemap:` directive from robots.txt
async fn sitemap_from_robots(transport: &dyn Transport, homepage: &Url) -> Option<String> {
    let robots_url = homepage.join("robots.txt").ok()?;

    match transport.fetch(robots_url.as_str()).await {
        Ok(page) => extract_sitemap_directive(&page.body),
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            None
        }
    }
}

/// Returns the value of the first `Sitemap:` line
///
/// The key is case-sensitive and must start the line. Empty values are
/// skipped.
///
/// # Examples
///
/// ```
/// use site_scout::crawler::extract_sitemap_directive;
///
/// let robots = "User-agent: *\nDisallow: /cart\nSitemap: https://x.com/s.xml\n";
/// assert_eq!(extract_sitemap_directive(robots), Some("https://x.com/s.xml".to_string()));
/// ```
pub fn extract_sitemap_directive(robots_txt: &str) -> Option<String> {
    robots_txt
        .lines()
        .filter_map(|line| line.strip_prefix("Sitemap:"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
