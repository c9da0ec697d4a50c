//! State module for tracking crawl runs
//!
//! # Components
//!
//! - `CrawlStatus`: lifecycle of a crawl run (pending, running, completed, failed)

mod crawl_status;

pub use crawl_status::CrawlStatus;
