//! URL handling module for Site-Scout
//!
//! This module provides page categorization, domain extraction, crawl scope
//! checks, and the noise table used to drop junk links.

mod domain;
mod noise;

// Re-export main functions
pub use domain::{extract_domain, is_in_scope};
pub use noise::{is_noise, noise_verdict, NoiseKind, NOISE_PATTERNS};

use std::fmt;
use url::Url;

/// Page categories derived from URL path markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Page,
    Collection,
    Blog,
    Article,
    Product,
    Other,
}

impl Category {
    /// Label stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "Page",
            Self::Collection => "Collection",
            Self::Blog => "Blog",
            Self::Article => "Article",
            Self::Product => "Product",
            Self::Other => "Other",
        }
    }

    /// Parses a stored label back into a category
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Page" => Some(Self::Page),
            "Collection" => Some(Self::Collection),
            "Blog" => Some(Self::Blog),
            "Article" => Some(Self::Article),
            "Product" => Some(Self::Product),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }

    /// All categories, in marker priority order followed by `Other`
    pub fn all() -> [Category; 6] {
        [
            Self::Page,
            Self::Collection,
            Self::Blog,
            Self::Article,
            Self::Product,
            Self::Other,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path markers checked in order; the first marker found wins
pub const CATEGORY_MARKERS: &[(&str, Category)] = &[
    ("/page", Category::Page),
    ("/collection", Category::Collection),
    ("/blog", Category::Blog),
    ("/article", Category::Article),
    ("/product", Category::Product),
];

/// Classifies a URL into a page category
///
/// The markers in [`CATEGORY_MARKERS`] are tested as substrings of the URL
/// path, in table order. Strings that do not parse as URLs are matched as-is.
///
/// # Examples
///
/// ```
/// use site_scout::url::{classify_category, Category};
///
/// assert_eq!(classify_category("https://x.com/collection/shoes"), Category::Collection);
/// assert_eq!(classify_category("https://x.com/random"), Category::Other);
/// ```
pub fn classify_category(url: &str) -> Category {
    let parsed = Url::parse(url).ok();
    let path = parsed.as_ref().map(Url::path).unwrap_or(url);

    CATEGORY_MARKERS
        .iter()
        .find(|(marker, _)| path.contains(marker))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_marker() {
        assert_eq!(classify_category("https://x.com/pages/about"), Category::Page);
        assert_eq!(
            classify_category("https://x.com/collection/shoes"),
            Category::Collection
        );
        assert_eq!(classify_category("https://x.com/blogs/news"), Category::Blog);
        assert_eq!(classify_category("https://x.com/articles/1"), Category::Article);
        assert_eq!(classify_category("https://x.com/products/mug"), Category::Product);
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(classify_category("https://x.com/random"), Category::Other);
        assert_eq!(classify_category("https://x.com/"), Category::Other);
    }

    #[test]
    fn test_first_marker_wins() {
        assert_eq!(
            classify_category("https://x.com/blog/product-roundup"),
            Category::Blog
        );
        assert_eq!(
            classify_category("https://x.com/products/blog-featured"),
            Category::Blog
        );
        assert_eq!(
            classify_category("https://x.com/collections/x/products/y"),
            Category::Collection
        );
    }

    #[test]
    fn test_markers_only_match_path() {
        // The host contains "blog" but the path has no marker
        assert_eq!(classify_category("https://my.blog.com/about"), Category::Other);
        assert_eq!(
            classify_category("https://x.com/search?from=/product"),
            Category::Other
        );
    }

    #[test]
    fn test_unparseable_falls_back_to_raw_string() {
        assert_eq!(classify_category("/collection/summer"), Category::Collection);
        assert_eq!(classify_category("nothing here"), Category::Other);
    }

    #[test]
    fn test_label_roundtrip() {
        for category in Category::all() {
            assert_eq!(Category::from_label(category.as_str()), Some(category));
        }
        assert_eq!(Category::from_label("page"), None);
    }
}
