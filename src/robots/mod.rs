//! Robots.txt probing module
//!
//! The crawler does not enforce robots.txt exclusion rules. It reads the file
//! for the audit: its HTTP status, its raw content, and the sitemaps it
//! declares.

mod parser;

pub use parser::{append_default_sitemap, extract_sitemaps, DEFAULT_SITEMAP_SUFFIX};

use crate::analysis::ProbeStatus;
use crate::url::robots_txt_url;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Outcome of fetching `/robots.txt` for a page's authority
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsProbe {
    /// HTTP status, or an error sentinel if the request failed
    pub status: ProbeStatus,
    /// Raw body, only kept on HTTP 200
    pub content: Option<String>,
    /// URLs from `Sitemap:` lines
    pub sitemaps: Vec<String>,
}

/// Fetches robots.txt for the authority of `page_url`
///
/// Failures never propagate: a network error becomes an `Error: ...` status
/// and a non-200 response keeps its status code with no content.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `page_url` - Any URL on the site being audited
/// * `timeout` - Request timeout for this probe
pub async fn fetch_robots(client: &Client, page_url: &Url, timeout: Duration) -> RobotsProbe {
    let robots_url = robots_txt_url(page_url);
    tracing::debug!("Fetching robots.txt: {}", robots_url);

    let response = match client.get(&robots_url).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", robots_url, e);
            return RobotsProbe {
                status: ProbeStatus::Error(format!("Error: {}", e)),
                content: None,
                sitemaps: Vec::new(),
            };
        }
    };

    let status = response.status();
    if status != StatusCode::OK {
        tracing::debug!("robots.txt not available at {} ({})", robots_url, status);
        return RobotsProbe {
            status: ProbeStatus::Code(status.as_u16()),
            content: None,
            sitemaps: Vec::new(),
        };
    }

    match response.text().await {
        Ok(body) => RobotsProbe {
            status: ProbeStatus::Code(status.as_u16()),
            sitemaps: extract_sitemaps(&body),
            content: Some(body),
        },
        Err(e) => {
            tracing::warn!("Failed to read body of {}: {}", robots_url, e);
            RobotsProbe {
                status: ProbeStatus::Error(format!("Error: {}", e)),
                content: None,
                sitemaps: Vec::new(),
            }
        }
    }
}
