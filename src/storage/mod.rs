//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Keyed-by-URL upsert of crawl records
//! - Full reads and resets for the reporting stage
//! - Run tracking with in-flight progress

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::analysis::AnalysisRecord;
use crate::state::CrawlStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(CrawlError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> crate::Result<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A persisted page: one per URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRecord {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub raw_document: Option<String>,
    pub normalized_document: Option<String>,
    pub analysis: Option<AnalysisRecord>,
}

/// Represents a crawl run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub seed_url: String,
    pub page_budget: usize,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: CrawlStatus,
    pub pages_processed: usize,
    pub pages_persisted: usize,
    pub error_message: Option<String>,
}
