//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::analysis::AnalysisRecord;
use crate::state::CrawlStatus;
use crate::storage::{CrawlRecord, RunRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Page records are keyed by URL. Writers and readers may live in different
/// processes, so every write must be all-or-nothing.
pub trait Storage {
    // ===== Crawl Records =====

    /// Inserts or overwrites the record for `url`
    ///
    /// An existing record keeps its identity but gets a fresh timestamp and
    /// every payload field replaced. A failed write leaves the previously
    /// committed record untouched.
    fn upsert(
        &mut self,
        url: &str,
        raw_html: Option<&str>,
        normalized_html: Option<&str>,
        analysis: Option<&AnalysisRecord>,
    ) -> StorageResult<()>;

    /// Returns every stored record, ordered by URL
    fn read_all(&self) -> StorageResult<Vec<CrawlRecord>>;

    /// Gets a record by URL
    fn get_by_url(&self, url: &str) -> StorageResult<Option<CrawlRecord>>;

    /// Deletes every record and returns how many were removed
    ///
    /// Clearing an empty store is a no-op.
    fn clear_all(&mut self) -> StorageResult<usize>;

    /// Counts stored records
    fn count_records(&self) -> StorageResult<u64>;

    /// Counts stored records that carry an analysis
    fn count_analyzed_records(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `running` status
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, seed_url: &str, page_budget: usize, config_hash: &str)
        -> StorageResult<i64>;

    /// Records in-flight progress for a run
    fn update_run_progress(
        &mut self,
        run_id: i64,
        pages_processed: usize,
        pages_persisted: usize,
    ) -> StorageResult<()>;

    /// Marks a run as finished with a terminal status
    fn finish_run(
        &mut self,
        run_id: i64,
        status: CrawlStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    /// Fails every run still marked `running`
    ///
    /// Called when no crawl of this store can be live, so such rows belong
    /// to a process that died mid-crawl.
    ///
    /// # Returns
    ///
    /// The number of runs closed
    fn fail_interrupted_runs(&mut self, error_message: &str) -> StorageResult<usize>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
