//! HTTP fetcher implementation
//!
//! This module handles the page fetch for the link extractor:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests with a per-request timeout
//! - Turning network errors and non-2xx responses into soft failures

use crate::config::Config;
use crate::crawler::parser::{extract_links, normalize_document};
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the link extractor learns from one page
///
/// A failed fetch yields an empty page: no document, no bodies, no links.
#[derive(Debug, Default)]
pub struct ExtractedPage {
    /// Parsed tree, only while the page is in hand
    pub document: Option<Html>,
    /// Response body, verbatim
    pub raw_html: Option<String>,
    /// Indented serialization of `document`
    pub normalized_html: Option<String>,
    /// Same-authority, non-asset links in discovery order
    pub links: Vec<Url>,
}

/// Builds the HTTP client shared by the page fetch and both probes
///
/// Redirects follow reqwest's default policy. Timeouts are set per request
/// by the caller.
///
/// # Example
///
/// ```no_run
/// use seo_crawler::config::load_config;
/// use seo_crawler::crawler::build_http_client;
/// use std::path::Path;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .connect_timeout(CONNECT_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body
///
/// Returns `None` on network errors, timeouts, non-2xx statuses and
/// unreadable bodies. Each case is logged as a warning.
pub async fn fetch_page(client: &Client, url: &Url, timeout: Duration) -> Option<String> {
    let response = match client.get(url.as_str()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            if e.is_timeout() {
                tracing::warn!("Timed out fetching {}", url);
            } else {
                tracing::warn!("Failed to fetch {}: {}", url, e);
            }
            return None;
        }
    };

    let response = match response.error_for_status() {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", url, e);
            return None;
        }
    };

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::warn!("Failed to read body of {}: {}", url, e);
            None
        }
    }
}

/// Fetches a page, parses it, and extracts its crawlable links
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `url` - Absolute URL of the page
/// * `base` - The crawl seed; only links with its authority are returned
/// * `timeout` - Request timeout for the fetch
pub async fn fetch_and_parse(
    client: &Client,
    url: &Url,
    base: &Url,
    timeout: Duration,
) -> ExtractedPage {
    let Some(body) = fetch_page(client, url, timeout).await else {
        return ExtractedPage::default();
    };

    let document = Html::parse_document(&body);
    let normalized = normalize_document(&document);
    let links = extract_links(&document, url, base);
    tracing::debug!("Extracted {} links from {}", links.len(), url);

    ExtractedPage {
        document: Some(document),
        raw_html: Some(body),
        normalized_html: Some(normalized),
        links,
    }
}
