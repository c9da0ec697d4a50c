//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop, which for every URL the frontier
//! admits:
//! - Fetches and parses the page
//! - Scans the parsed tree, then completes the analysis with network probes
//! - Upserts the page record
//! - Feeds discovered links back into the frontier
//!
//! One URL is in flight at a time. Progress is published on a watch channel
//! and written to the `runs` table after every URL.

use crate::analysis::{scan_document, PageAnalyzer};
use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_and_parse};
use crate::crawler::frontier::{Admission, Frontier};
use crate::crawler::handle::CrawlReport;
use crate::output::{self, PageSnapshot};
use crate::state::CrawlStatus;
use crate::storage::{SqliteStorage, Storage, StorageError, StorageResult};
use crate::url::parse_seed;
use crate::Result;
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use url::Url;

const INTERRUPTED_RUN: &str = "crawl interrupted before finishing";

/// What processing one URL produced
#[derive(Debug, Default)]
struct PageOutcome {
    links: Vec<Url>,
    persisted: bool,
}

/// Main crawler coordinator structure
///
/// A coordinator can run any number of crawls one after another, and can be
/// shared behind an `Arc` to spawn them as background tasks.
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: String,
    storage: Arc<Mutex<SqliteStorage>>,
    client: Client,
    analyzer: PageAnalyzer,
}

impl Coordinator {
    /// Creates a coordinator over an already opened store
    ///
    /// Runs left `running` by a process that died mid-crawl are marked
    /// `failed`.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - The store page records are written to
    /// * `config_hash` - Hash of the configuration file, recorded on each run
    pub fn new(
        config: Config,
        mut storage: SqliteStorage,
        config_hash: impl Into<String>,
    ) -> Result<Self> {
        let interrupted = storage.fail_interrupted_runs(INTERRUPTED_RUN)?;
        if interrupted > 0 {
            tracing::warn!("Marked {} interrupted run(s) as failed", interrupted);
        }

        let client = build_http_client(&config)?;
        let analyzer = PageAnalyzer::new(client.clone(), &config.crawler);

        Ok(Self {
            config: Arc::new(config),
            config_hash: config_hash.into(),
            storage: Arc::new(Mutex::new(storage)),
            client,
            analyzer,
        })
    }

    /// Creates a coordinator over the database named in the configuration
    pub fn open(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        Self::new(config, storage, config_hash)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the shared store, for readers running beside a crawl
    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    /// Returns every persisted record for the reporting stage
    pub fn snapshot(&self) -> Result<Vec<PageSnapshot>> {
        let storage = self.lock_storage()?;
        output::snapshot(&*storage)
    }

    /// Irreversibly deletes every persisted record
    pub fn clear_records(&self) -> Result<usize> {
        let removed = self.with_storage(|storage| storage.clear_all())?;
        tracing::info!("Cleared {} stored records", removed);
        Ok(removed)
    }

    /// Fails every run of this store that is still `running`
    ///
    /// For use when the host process is shutting down mid-crawl.
    pub fn interrupt(&self) -> Result<usize> {
        let closed = self.with_storage(|storage| storage.fail_interrupted_runs(INTERRUPTED_RUN))?;
        tracing::warn!("Marked {} in-flight run(s) as failed", closed);
        Ok(closed)
    }

    /// Crawls from `seed` until the frontier empties or `budget` pages are visited
    ///
    /// A budget below 1 is clamped to 1. The seed must carry an explicit
    /// `http`/`https` scheme; anything else is rejected before any request.
    ///
    /// # Returns
    ///
    /// The number of pages whose analysis was persisted
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seo_crawler::config::load_config_with_hash;
    /// use seo_crawler::Coordinator;
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
    /// let coordinator = Coordinator::open(config, hash)?;
    /// let persisted = coordinator.run_crawl("https://example.com/", 5).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_crawl(&self, seed: &str, budget: usize) -> Result<usize> {
        let seed = parse_seed(seed)?;
        let budget = budget.max(1);
        let (progress, _status) = watch::channel(CrawlReport::pending(&seed, budget));
        self.execute(seed, budget, &progress).await
    }

    /// Runs one crawl and records its lifecycle
    ///
    /// The terminal status is published before this returns.
    pub(crate) async fn execute(
        &self,
        seed: Url,
        budget: usize,
        progress: &watch::Sender<CrawlReport>,
    ) -> Result<usize> {
        let run_id = match self
            .with_storage(|storage| storage.create_run(seed.as_str(), budget, &self.config_hash))
        {
            Ok(run_id) => run_id,
            Err(e) => {
                let message = e.to_string();
                progress.send_modify(|report| report.fail(message));
                return Err(e.into());
            }
        };

        progress.send_modify(|report| report.status = CrawlStatus::Running);
        tracing::info!("Starting crawl run {} from {} (budget {})", run_id, seed, budget);

        let start_time = std::time::Instant::now();
        let result = self.crawl(run_id, &seed, budget, progress).await;

        match &result {
            Ok(persisted) => {
                self.finish_run(run_id, CrawlStatus::Completed, None);
                progress.send_modify(|report| report.status = CrawlStatus::Completed);
                tracing::info!(
                    "Crawl run {} completed: {} pages persisted in {:?}",
                    run_id,
                    persisted,
                    start_time.elapsed()
                );
            }
            Err(e) => {
                let message = e.to_string();
                self.finish_run(run_id, CrawlStatus::Failed, Some(&message));
                tracing::error!("Crawl run {} failed: {}", run_id, message);
                progress.send_modify(|report| report.fail(message));
            }
        }

        result
    }

    /// The main crawl loop
    async fn crawl(
        &self,
        run_id: i64,
        seed: &Url,
        budget: usize,
        progress: &watch::Sender<CrawlReport>,
    ) -> Result<usize> {
        let mut frontier = Frontier::new(seed.clone(), budget);
        let delay = self.config.crawler.request_delay();
        let mut pages_processed = 0;
        let mut pages_persisted = 0;

        loop {
            let url = match frontier.next() {
                Admission::Next(url) => url,
                Admission::Completed => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
                Admission::Exhausted => {
                    tracing::info!("Page budget of {} reached", frontier.budget());
                    break;
                }
            };

            if pages_processed > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!("Processing URL: {}", url);
            let outcome = self.process_url(&url, frontier.base()).await?;

            pages_processed += 1;
            if outcome.persisted {
                pages_persisted += 1;
            }

            let queued = frontier.enqueue(outcome.links);
            tracing::debug!(
                "Queued {} new links from {} ({} pending)",
                queued,
                url,
                frontier.pending_count()
            );

            progress.send_modify(|report| {
                report.pages_processed = pages_processed;
                report.pages_persisted = pages_persisted;
            });
            if let Err(e) = self.with_storage(|storage| {
                storage.update_run_progress(run_id, pages_processed, pages_persisted)
            }) {
                tracing::warn!("Failed to record progress for run {}: {}", run_id, e);
            }

            tracing::info!(
                "Progress: {}/{} pages processed, {} persisted",
                pages_processed,
                budget,
                pages_persisted
            );
        }

        Ok(pages_persisted)
    }

    /// Processes a single URL
    ///
    /// Fetch failures and storage errors are logged and leave the page
    /// unpersisted. Only a poisoned store aborts the crawl.
    async fn process_url(&self, url: &Url, base: &Url) -> Result<PageOutcome> {
        let timeout = self.config.crawler.page_timeout();

        // The parsed tree must be dropped before the next await
        let (raw_html, normalized_html, links, scan) = {
            let page = fetch_and_parse(&self.client, url, base, timeout).await;
            let scan = page
                .document
                .as_ref()
                .map(|document| scan_document(url, document));
            (page.raw_html, page.normalized_html, page.links, scan)
        };

        let Some(analysis) = self.analyzer.analyze(url, scan).await else {
            tracing::debug!("Nothing to analyze for {}", url);
            return Ok(PageOutcome::default());
        };

        let write = self.with_storage(|storage| {
            storage.upsert(
                url.as_str(),
                raw_html.as_deref(),
                normalized_html.as_deref(),
                Some(&analysis),
            )
        });

        let persisted = match write {
            Ok(()) => {
                tracing::info!("Persisted analysis for {}", url);
                true
            }
            Err(StorageError::LockPoisoned) => return Err(StorageError::LockPoisoned.into()),
            Err(e) => {
                tracing::warn!("Failed to persist {}: {}", url, e);
                false
            }
        };

        Ok(PageOutcome { links, persisted })
    }

    fn finish_run(&self, run_id: i64, status: CrawlStatus, error: Option<&str>) {
        if let Err(e) = self.with_storage(|storage| storage.finish_run(run_id, status, error)) {
            tracing::warn!("Failed to finish run {}: {}", run_id, e);
        }
    }

    fn lock_storage(&self) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Runs a storage operation under the lock
    ///
    /// The guard never outlives `op`, so it is never held across an await.
    fn with_storage<T>(
        &self,
        op: impl FnOnce(&mut SqliteStorage) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut storage = self.lock_storage()?;
        op(&mut storage)
    }
}
