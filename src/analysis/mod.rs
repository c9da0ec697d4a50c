//! Page analysis module
//!
//! Analysis runs in two phases. [`scan_document`] walks the parsed tree while
//! it is still in hand; [`PageAnalyzer::analyze`] then completes the record
//! with two independent network probes:
//! - an HTTP status probe that follows redirects
//! - a robots.txt probe for sitemap hints
//!
//! Either probe may fail without affecting the other or the DOM fields.

mod record;
mod scan;

pub use record::{
    AnalysisRecord, Heading, HreflangTag, JavascriptUsage, ProbeStatus, StructuredData,
    INVALID_JSON_LD, NETWORK_ERROR_SENTINEL,
};
pub use scan::{is_mobile_friendly_viewport, scan_document, DocumentScan};

use crate::config::CrawlerConfig;
use crate::robots::{append_default_sitemap, fetch_robots};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Outcome of the redirect-following status probe
#[derive(Debug, Clone, PartialEq)]
pub struct StatusProbe {
    pub status: ProbeStatus,
    pub final_url: String,
}

/// Completes DOM scans with live network probes
#[derive(Debug, Clone)]
pub struct PageAnalyzer {
    client: Client,
    page_timeout: Duration,
    robots_timeout: Duration,
}

impl PageAnalyzer {
    /// Creates an analyzer sharing the crawl's HTTP client
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            page_timeout: config.page_timeout(),
            robots_timeout: config.robots_timeout(),
        }
    }

    /// Produces the analysis record for a page
    ///
    /// Returns `None` when there is no scan, i.e. the page could not be
    /// fetched or parsed. Otherwise a complete record is always returned.
    pub async fn analyze(&self, url: &Url, scan: Option<DocumentScan>) -> Option<AnalysisRecord> {
        let mut record = scan?.into_record();

        let probe = probe_status(&self.client, url, self.page_timeout).await;
        record.http_status = Some(probe.status);
        record.final_url_after_redirects = Some(probe.final_url);

        let robots = fetch_robots(&self.client, url, self.robots_timeout).await;
        record.robots_txt_status = Some(robots.status);
        record.robots_txt_content = robots.content;
        record.sitemap_links = robots.sitemaps;
        append_default_sitemap(&mut record.sitemap_links, url);

        tracing::debug!(
            "Analyzed {} (status {})",
            url,
            record
                .http_status
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        );

        Some(record)
    }
}

/// Issues a GET that follows redirects and reports the final status and URL
///
/// Any status code is a success here. A request that cannot complete yields
/// [`NETWORK_ERROR_SENTINEL`] and keeps the requested URL as the final one.
pub async fn probe_status(client: &Client, url: &Url, timeout: Duration) -> StatusProbe {
    match client.get(url.as_str()).timeout(timeout).send().await {
        Ok(response) => StatusProbe {
            status: ProbeStatus::Code(response.status().as_u16()),
            final_url: response.url().to_string(),
        },
        Err(e) => {
            tracing::warn!("Status probe failed for {}: {}", url, e);
            StatusProbe {
                status: ProbeStatus::Error(NETWORK_ERROR_SENTINEL.to_string()),
                final_url: url.to_string(),
            }
        }
    }
}
