//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::analysis::AnalysisRecord;
use crate::state::CrawlStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CrawlRecord, RunRecord};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "url, fetched_at, raw_html, normalized_html, analysis";

const RUN_COLUMNS: &str = "id, seed_url, page_budget, started_at, finished_at, config_hash, \
     status, pages_processed, pages_persisted, error_message";

/// Columns of a `crawled_pages` row before decoding
struct RecordRow {
    url: String,
    fetched_at: String,
    raw_html: Option<String>,
    normalized_html: Option<String>,
    analysis: Option<String>,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            url: row.get(0)?,
            fetched_at: row.get(1)?,
            raw_html: row.get(2)?,
            normalized_html: row.get(3)?,
            analysis: row.get(4)?,
        })
    }

    fn decode(self) -> StorageResult<CrawlRecord> {
        let fetched_at = DateTime::parse_from_rfc3339(&self.fetched_at)
            .map_err(|e| {
                StorageError::Serialization(format!("Bad timestamp for {}: {}", self.url, e))
            })?
            .with_timezone(&Utc);

        let analysis = self
            .analysis
            .as_deref()
            .map(serde_json::from_str::<AnalysisRecord>)
            .transpose()
            .map_err(|e| {
                StorageError::Serialization(format!("Bad analysis for {}: {}", self.url, e))
            })?;

        Ok(CrawlRecord {
            url: self.url,
            fetched_at,
            raw_document: self.raw_html,
            normalized_document: self.normalized_html,
            analysis,
        })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        seed_url: row.get(1)?,
        page_budget: count_from_db(row.get(2)?),
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        config_hash: row.get(5)?,
        status: CrawlStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(CrawlStatus::Failed),
        pages_processed: count_from_db(row.get(7)?),
        pages_persisted: count_from_db(row.get(8)?),
        error_message: row.get(9)?,
    })
}

fn count_to_db(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn count_from_db(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError)` - Failed to open database
    pub fn new(path: &Path) -> crate::Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets report readers run while a crawl writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    // ===== Crawl Records =====

    fn upsert(
        &mut self,
        url: &str,
        raw_html: Option<&str>,
        normalized_html: Option<&str>,
        analysis: Option<&AnalysisRecord>,
    ) -> StorageResult<()> {
        // Serialize before touching the database so a bad record writes nothing
        let analysis_json = analysis
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO crawled_pages (url, fetched_at, raw_html, normalized_html, analysis)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(url) DO UPDATE SET
                fetched_at = excluded.fetched_at,
                raw_html = excluded.raw_html,
                normalized_html = excluded.normalized_html,
                analysis = excluded.analysis",
            params![url, now, raw_html, normalized_html, analysis_json],
        )?;
        tx.commit()?;

        Ok(())
    }

    fn read_all(&self) -> StorageResult<Vec<CrawlRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawled_pages ORDER BY url",
            RECORD_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], RecordRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(RecordRow::decode).collect()
    }

    fn get_by_url(&self, url: &str) -> StorageResult<Option<CrawlRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawled_pages WHERE url = ?1", RECORD_COLUMNS),
                params![url],
                RecordRow::from_row,
            )
            .optional()?;

        row.map(RecordRow::decode).transpose()
    }

    fn clear_all(&mut self) -> StorageResult<usize> {
        let removed = self.conn.execute("DELETE FROM crawled_pages", [])?;
        Ok(removed)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM crawled_pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_analyzed_records(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM crawled_pages WHERE analysis IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn create_run(
        &mut self,
        seed_url: &str,
        page_budget: usize,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (seed_url, page_budget, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                seed_url,
                count_to_db(page_budget),
                now,
                config_hash,
                CrawlStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_run_progress(
        &mut self,
        run_id: i64,
        pages_processed: usize,
        pages_persisted: usize,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET pages_processed = ?1, pages_persisted = ?2 WHERE id = ?3",
            params![
                count_to_db(pages_processed),
                count_to_db(pages_persisted),
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: CrawlStatus,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        if !status.is_terminal() {
            return Err(StorageError::Database(format!(
                "Cannot finish run {} with non-terminal status {}",
                run_id, status
            )));
        }

        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, error_message, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn fail_interrupted_runs(&mut self, error_message: &str) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let closed = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, error_message = ?3 WHERE status = ?4",
            params![
                CrawlStatus::Failed.to_db_string(),
                now,
                error_message,
                CrawlStatus::Running.to_db_string()
            ],
        )?;
        Ok(closed)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }
}
