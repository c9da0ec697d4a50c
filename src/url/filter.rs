use url::Url;

/// Path extensions that are never queued for crawling
pub const ASSET_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".rar", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".jpg", ".jpeg",
    ".png", ".gif", ".svg",
];

/// Returns true if the path ends in a binary or document extension
///
/// The comparison is case-insensitive and only looks at the path, so a query
/// string such as `?file=report.pdf` does not disqualify a page.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::is_asset_path;
///
/// assert!(is_asset_path("/files/Report.PDF"));
/// assert!(!is_asset_path("/blog/post"));
/// ```
pub fn is_asset_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Strips the fragment from a URL, keeping the query string
pub fn clean_link(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_asset_extension_is_rejected() {
        for ext in ASSET_EXTENSIONS {
            let path = format!("/download/file{}", ext);
            assert!(is_asset_path(&path), "{} should be an asset", path);
        }
    }

    #[test]
    fn test_asset_extension_case_insensitive() {
        assert!(is_asset_path("/IMG/PHOTO.JPG"));
        assert!(is_asset_path("/slides.PpTx"));
    }

    #[test]
    fn test_html_pages_are_not_assets() {
        assert!(!is_asset_path("/"));
        assert!(!is_asset_path("/index.html"));
        assert!(!is_asset_path("/pdf-guide"));
        assert!(!is_asset_path("/docs/"));
    }

    #[test]
    fn test_clean_link_strips_fragment() {
        let url = Url::parse("https://example.com/page?a=1#section").unwrap();
        assert_eq!(clean_link(url).as_str(), "https://example.com/page?a=1");
    }

    #[test]
    fn test_clean_link_without_fragment_is_unchanged() {
        let url = Url::parse("https://example.com/page").unwrap();
        assert_eq!(clean_link(url).as_str(), "https://example.com/page");
    }
}
