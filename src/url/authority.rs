use url::{Origin, Url};

/// Returns the authority of a URL: scheme, host and port
///
/// Two URLs share an authority only when all three match. There is no
/// subdomain generalization: `blog.example.com` is a different authority
/// from `example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_crawler::url::authority_of;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(authority_of(&url), "https://example.com");
///
/// let url = Url::parse("http://example.com:8080/").unwrap();
/// assert_eq!(authority_of(&url), "http://example.com:8080");
/// ```
pub fn authority_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns true if both URLs have exactly the same authority
///
/// Opaque origins (`mailto:`, `javascript:`, `data:`) never match anything.
pub fn same_authority(a: &Url, b: &Url) -> bool {
    match (a.origin(), b.origin()) {
        (origin @ Origin::Tuple(..), other) => origin == other,
        _ => false,
    }
}

/// Builds the `/robots.txt` URL for the authority of `url`
pub fn robots_txt_url(url: &Url) -> String {
    format!("{}/robots.txt", authority_of(url))
}

/// Builds the conventional `/sitemap.xml` URL for the authority of `url`
pub fn default_sitemap_url(url: &Url) -> String {
    format!("{}/sitemap.xml", authority_of(url))
}
