//! URL handling module
//!
//! This module provides seed validation, authority (origin) comparison,
//! and the link filters that keep a crawl inside one site.

mod authority;
mod filter;

pub use authority::{authority_of, default_sitemap_url, robots_txt_url, same_authority};
pub use filter::{clean_link, is_asset_path, ASSET_EXTENSIONS};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses and validates a crawl seed
///
/// The seed must carry an explicit `http` or `https` scheme and a host.
/// Its fragment is dropped so the seed matches how discovered links are keyed.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::parse_seed;
///
/// let seed = parse_seed("https://example.com/start#top").unwrap();
/// assert_eq!(seed.as_str(), "https://example.com/start");
///
/// assert!(parse_seed("example.com").is_err());
/// assert!(parse_seed("ftp://example.com/").is_err());
/// ```
pub fn parse_seed(raw: &str) -> UrlResult<Url> {
    let trimmed = raw.trim();
    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            return Err(UrlError::MissingScheme(trimmed.to_string()))
        }
        Err(e) => return Err(UrlError::Parse(format!("{}: {}", trimmed, e))),
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(trimmed.to_string()));
    }

    Ok(clean_link(url))
}
