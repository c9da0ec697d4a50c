//! Background crawl tasks with pollable status

use crate::crawler::coordinator::Coordinator;
use crate::state::CrawlStatus;
use crate::url::parse_seed;
use crate::{CrawlError, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use url::Url;

const UNEXPECTED_EXIT: &str = "crawl task terminated unexpectedly";

/// Snapshot of a crawl's progress
///
/// Counters only grow while a crawl runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub status: CrawlStatus,
    pub pages_processed: usize,
    pub pages_persisted: usize,
    pub pages_budgeted: usize,
    pub url: String,
    pub error: Option<String>,
}

impl CrawlReport {
    /// Report for a crawl that has been accepted but not started
    pub fn pending(seed: &Url, budget: usize) -> Self {
        Self {
            status: CrawlStatus::Pending,
            pages_processed: 0,
            pages_persisted: 0,
            pages_budgeted: budget,
            url: seed.to_string(),
            error: None,
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = CrawlStatus::Failed;
        self.error = Some(message);
    }
}

/// Handle to a crawl running on a tokio task
#[derive(Debug)]
pub struct CrawlHandle {
    status: watch::Receiver<CrawlReport>,
    task: JoinHandle<Result<usize>>,
}

impl CrawlHandle {
    /// Returns the latest progress report
    ///
    /// If the task ended without publishing a terminal status (it panicked or
    /// was aborted), the report says `failed`.
    pub fn status(&self) -> CrawlReport {
        let mut report = self.status.borrow().clone();
        if self.task.is_finished() && !report.status.is_terminal() {
            report.fail(UNEXPECTED_EXIT.to_string());
        }
        report
    }

    /// Returns a receiver that is notified on every progress change
    pub fn subscribe(&self) -> watch::Receiver<CrawlReport> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the crawl to end
    ///
    /// # Returns
    ///
    /// The number of pages persisted, or the error that failed the crawl
    pub async fn wait(self) -> Result<usize> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(CrawlError::TaskFailed(e.to_string())),
        }
    }
}

impl Coordinator {
    /// Starts a crawl on a background task
    ///
    /// The seed is validated before the task is spawned, so a malformed seed
    /// is returned as an error here and no task runs. Must be called from
    /// within a tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use seo_crawler::config::load_config_with_hash;
    /// use seo_crawler::Coordinator;
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
    /// let coordinator = Arc::new(Coordinator::open(config, hash)?);
    /// let handle = coordinator.spawn("https://example.com/", 5)?;
    /// println!("{:?}", handle.status());
    /// let persisted = handle.wait().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn spawn(self: Arc<Self>, seed: &str, budget: usize) -> Result<CrawlHandle> {
        let seed = parse_seed(seed)?;
        let budget = budget.max(1);
        let (progress, status) = watch::channel(CrawlReport::pending(&seed, budget));

        let task = tokio::spawn(async move { self.execute(seed, budget, &progress).await });

        Ok(CrawlHandle { status, task })
    }
}
