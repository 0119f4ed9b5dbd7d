//! Page analysis: metadata, visible text, and keyword profiles

use crate::crawler::transport::{Transport, TransportError};
use regex::Regex;
use scraper::{Html, Node, Selector};
use std::collections::BTreeMap;

/// Title used when a page has no `<title>`
pub const NO_TITLE: &str = "No Title";

/// Description used when a page has no meta description
pub const NO_DESCRIPTION: &str = "No Description";

/// Elements whose text is never rendered
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Per-page keyword counts, one entry per requested keyword
pub type KeywordProfile = BTreeMap<String, u32>;

/// Extracted content of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// Page title, or [`NO_TITLE`]
    pub title: String,

    /// Meta description content, or [`NO_DESCRIPTION`]
    pub meta_description: String,

    /// Visible text, whitespace-collapsed and lowercased
    pub text: String,
}

/// Fetches and analyzes a page
///
/// # Returns
///
/// * `Ok(PageContent)` - The page was fetched and analyzed
/// * `Err(TransportError)` - The fetch failed; nothing should be recorded
pub async fn analyze(transport: &dyn Transport, url: &str) -> Result<PageContent, TransportError> {
    let page = transport.fetch(url).await?;
    Ok(analyze_html(&page.body))
}

/// Analyzes already fetched HTML
pub fn analyze_html(html: &str) -> PageContent {
    let document = Html::parse_document(html);

    PageContent {
        title: extract_title(&document).unwrap_or_else(|| NO_TITLE.to_string()),
        meta_description: extract_meta_description(&document)
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        text: extract_visible_text(&document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let meta_selector = Selector::parse("meta[name]").ok()?;

    document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("description"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
}

/// Collects rendered text, collapsing whitespace and lowercasing
fn extract_visible_text(document: &Html) -> String {
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ").to_lowercase()
}

/// Compiled whole-word matchers for a fixed keyword list
///
/// Build one per run and reuse it for every page.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    patterns: Vec<(String, Option<Regex>)>,
}

impl KeywordMatcher {
    pub fn new(keywords: &[String]) -> Self {
        let patterns = keywords
            .iter()
            .map(|keyword| (keyword.clone(), keyword_pattern(keyword)))
            .collect();
        Self { patterns }
    }

    /// Counts each keyword in `text`; every keyword gets an entry
    pub fn profile(&self, text: &str) -> KeywordProfile {
        let haystack = text.to_lowercase();

        self.patterns
            .iter()
            .map(|(keyword, pattern)| {
                let count = pattern
                    .as_ref()
                    .map(|re| re.find_iter(&haystack).count())
                    .unwrap_or(0);
                (keyword.clone(), u32::try_from(count).unwrap_or(u32::MAX))
            })
            .collect()
    }
}

/// Counts whole-word occurrences of each keyword in `text`
///
/// Matching is case-insensitive and non-overlapping. A multi-word keyword
/// only matches the full phrase. Every keyword gets an entry, zero included.
///
/// # Examples
///
/// ```
/// use site_scout::crawler::count_keywords;
///
/// let profile = count_keywords(
///     "the cat sat on the cat mat",
///     &["cat".to_string(), "dog".to_string()],
/// );
/// assert_eq!(profile["cat"], 2);
/// assert_eq!(profile["dog"], 0);
/// ```
pub fn count_keywords(text: &str, keywords: &[String]) -> KeywordProfile {
    KeywordMatcher::new(keywords).profile(text)
}

fn keyword_pattern(keyword: &str) -> Option<Regex> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    match Regex::new(&format!(r"\b{}\b", regex::escape(&needle))) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Cannot build matcher for keyword '{}': {}", keyword, e);
            None
        }
    }
}
