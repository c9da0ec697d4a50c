//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Page fetching and link extraction
//! - The breadth-first frontier with its page budget
//! - Overall crawl coordination
//! - Background crawl tasks with pollable status

mod coordinator;
mod fetcher;
mod frontier;
mod handle;
mod parser;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, fetch_and_parse, fetch_page, ExtractedPage};
pub use frontier::{Admission, Frontier};
pub use handle::{CrawlHandle, CrawlReport};
pub use parser::{extract_links, normalize_document};
