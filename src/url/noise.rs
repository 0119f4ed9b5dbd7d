//! Noise table for discovered links
//!
//! Links matching any entry are dropped from every extracted link set,
//! whether they came from HTML anchors or sitemap `<loc>` elements.

/// Why a link was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseKind {
    /// Third-party asset CDN
    AssetCdn,
    /// Cache-busted or variant duplicate of another URL
    QueryVariant,
    /// Social share/profile link
    SocialShare,
}

/// Substring patterns checked against each link, in order
pub const NOISE_PATTERNS: &[(&str, NoiseKind)] = &[
    ("cdn.shopify.com", NoiseKind::AssetCdn),
    ("?v=", NoiseKind::QueryVariant),
    ("?variant=", NoiseKind::QueryVariant),
    ("twitter.com", NoiseKind::SocialShare),
    ("facebook.com", NoiseKind::SocialShare),
    ("pinterest.com", NoiseKind::SocialShare),
];

/// Returns the first noise verdict matching `link`, if any
pub fn noise_verdict(link: &str) -> Option<NoiseKind> {
    NOISE_PATTERNS
        .iter()
        .find(|(pattern, _)| link.contains(pattern))
        .map(|(_, kind)| *kind)
}

/// Returns true if the link should be dropped
pub fn is_noise(link: &str) -> bool {
    noise_verdict(link).is_some()
}
