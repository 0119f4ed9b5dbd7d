//! Link extraction for HTML pages and sitemap documents
//!
//! This module turns one fetched document into the outbound links it names:
//! - XML documents: the text of every `<loc>` element
//! - HTML documents: every `<a href>`, resolved against the page URL
//!
//! Both modes drop links matched by the noise table and return each link
//! once, in document order.

use crate::crawler::transport::{FetchedPage, Transport};
use crate::url::is_noise;
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts the outbound links of a fetched document
///
/// # Arguments
///
/// * `page_url` - URL the content was fetched from, used as the resolution base
/// * `content` - The document body
/// * `content_type` - Content-Type header; any value containing "xml" selects sitemap mode
///
/// # Returns
///
/// Absolute http(s) URLs, deduplicated, noise removed. A document that
/// cannot be parsed yields no links.
pub fn extract_links(page_url: &Url, content: &str, content_type: &str) -> Vec<String> {
    if content_type.to_ascii_lowercase().contains("xml") {
        return extract_sitemap_links(page_url, content);
    }

    filter_links(extract_anchor_links(content, page_url))
}

/// Extracts the `<loc>` links of a sitemap document regardless of its Content-Type
pub fn extract_sitemap_links(doc_url: &Url, xml: &str) -> Vec<String> {
    match parse_sitemap_locs(xml, doc_url) {
        Ok(locs) => filter_links(locs),
        Err(e) => {
            tracing::warn!("Failed to parse XML from {}: {}", doc_url, e);
            Vec::new()
        }
    }
}

/// Extracts links from an already fetched page
pub fn extract_page_links(page_url: &Url, page: &FetchedPage) -> Vec<String> {
    extract_links(page_url, &page.body, &page.content_type)
}

/// Extracts links from a fetched page, reporting malformed sitemap XML
///
/// Unlike [`extract_page_links`], a sitemap document that fails to parse
/// is an error rather than an empty list.
pub fn try_extract_page_links(page_url: &Url, page: &FetchedPage) -> Result<Vec<String>, String> {
    if page.is_xml() {
        return parse_sitemap_locs(&page.body, page_url).map(filter_links);
    }
    Ok(filter_links(extract_anchor_links(&page.body, page_url)))
}

/// Fetches a URL and extracts its links
///
/// Transport failures are logged and yield an empty list.
pub async fn fetch_page_links(transport: &dyn Transport, page_url: &Url) -> Vec<String> {
    match transport.fetch(page_url.as_str()).await {
        Ok(page) => extract_page_links(page_url, &page),
        Err(e) => {
            tracing::warn!("Error fetching page links from {}: {}", page_url, e);
            Vec::new()
        }
    }
}

/// Drops noise links and duplicates, keeping first-seen order
fn filter_links(links: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| {
            if is_noise(link) {
                tracing::trace!("Dropping noise link {}", link);
                return false;
            }
            seen.insert(link.clone())
        })
        .collect()
}

/// Extracts the text of every `<loc>` element in a sitemap document
///
/// Works for both `<urlset>` and `<sitemapindex>` documents. Relative
/// values are resolved against `base_url`.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Every non-empty `<loc>` value, in document order
/// * `Err(String)` - The document is not well-formed XML
pub fn parse_sitemap_locs(xml: &str, base_url: &Url) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_loc = false;
    let mut current = String::new();
    let mut locs = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if is_loc(e.local_name().as_ref()) => {
                in_loc = true;
                current.clear();
            }
            Ok(Event::End(e)) if is_loc(e.local_name().as_ref()) => {
                in_loc = false;
                if let Some(url) = resolve_loc(current.trim(), base_url) {
                    locs.push(url);
                }
            }
            Ok(Event::Text(t)) if in_loc => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                current.push_str(&text);
            }
            Ok(Event::CData(t)) if in_loc => {
                current.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
    }

    Ok(locs)
}

fn is_loc(name: &[u8]) -> bool {
    name.eq_ignore_ascii_case(b"loc")
}

/// Resolves a `<loc>` value, keeping absolute values as written
fn resolve_loc(value: &str, base_url: &Url) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let mut absolute = match Url::parse(value) {
        Ok(absolute) => absolute,
        Err(_) => base_url.join(value).ok()?,
    };
    absolute.set_fragment(None);
    Some(absolute.to_string())
}

/// Extracts every anchor href from an HTML document
fn extract_anchor_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// Fragments are stripped from the resolved URL.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

/// Finds the first anchor whose href mentions "sitemap"
///
/// The match is a plain substring test on the raw href; the result is
/// resolved against `base_url`.
pub fn find_sitemap_link(html: &str, base_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let a_selector = Selector::parse("a[href]").ok()?;

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.contains("sitemap"))
        .find_map(|href| resolve_link(href, base_url))
}
