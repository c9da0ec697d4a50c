//! Sitemap discovery from robots.txt content

use crate::url::default_sitemap_url;
use url::Url;

/// Marker appended to the synthesized `/sitemap.xml` candidate
pub const DEFAULT_SITEMAP_SUFFIX: &str = " (Default check)";

const SITEMAP_DIRECTIVE: &str = "sitemap:";

/// Extracts every `Sitemap:` URL from robots.txt content
///
/// A line counts only if it begins with the directive (case-insensitive);
/// indented or commented-out directives are ignored. Empty values are skipped.
///
/// # Examples
///
/// ```
/// use seo_crawler::robots::extract_sitemaps;
///
/// let robots = "User-agent: *\nSitemap: https://example.com/a.xml\nsitemap: https://example.com/b.xml";
/// assert_eq!(
///     extract_sitemaps(robots),
///     vec!["https://example.com/a.xml", "https://example.com/b.xml"]
/// );
/// ```
pub fn extract_sitemaps(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| {
            let head = line.get(..SITEMAP_DIRECTIVE.len())?;
            if !head.eq_ignore_ascii_case(SITEMAP_DIRECTIVE) {
                return None;
            }
            let value = line[SITEMAP_DIRECTIVE.len()..].trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

/// Appends the conventional `/sitemap.xml` candidate for the page's authority
///
/// The candidate is only added when robots.txt did not already declare that
/// exact URL, and it is tagged with [`DEFAULT_SITEMAP_SUFFIX`] so it can be
/// told apart from declared sitemaps.
pub fn append_default_sitemap(sitemaps: &mut Vec<String>, page_url: &Url) {
    let candidate = default_sitemap_url(page_url);
    if !sitemaps.iter().any(|s| *s == candidate) {
        sitemaps.push(format!("{}{}", candidate, DEFAULT_SITEMAP_SUFFIX));
    }
}
