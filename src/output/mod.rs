//! Output module for the reporting stage
//!
//! This module handles:
//! - Building the snapshot of analysis records the reporting stage consumes
//! - Exporting that snapshot as JSON
//! - Recording store statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::analysis::AnalysisRecord;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One page as handed to the reporting stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub analysis: Option<AnalysisRecord>,
}

/// Reads every stored record as a snapshot, ordered by URL
///
/// Raw and normalized documents are left out; the reporting stage reads
/// only the URL, timestamp and analysis.
pub fn snapshot(storage: &dyn Storage) -> crate::Result<Vec<PageSnapshot>> {
    let pages = storage
        .read_all()?
        .into_iter()
        .map(|record| PageSnapshot {
            url: record.url,
            fetched_at: record.fetched_at,
            analysis: record.analysis,
        })
        .collect();
    Ok(pages)
}

/// Writes the snapshot to `path` as pretty-printed JSON
///
/// # Returns
///
/// * `Ok(usize)` - Number of pages written
/// * `Err(CrawlError)` - Failed to read storage or write the file
pub fn export_snapshot(storage: &dyn Storage, path: &Path) -> crate::Result<usize> {
    let pages = snapshot(storage)?;
    let json = serde_json::to_string_pretty(&pages)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;

    tracing::info!("Exported {} pages to {}", pages.len(), path.display());
    Ok(pages.len())
}
