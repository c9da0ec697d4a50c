//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::{RunRecord, Storage};

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Records that carry an analysis
    pub analyzed_records: u64,

    /// The most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    /// Share of records with an analysis, as a percentage
    pub fn analyzed_percentage(&self) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        (self.analyzed_records as f64 / self.total_records as f64) * 100.0
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
pub fn load_statistics(storage: &dyn Storage) -> crate::Result<CrawlStatistics> {
    Ok(CrawlStatistics {
        total_records: storage.count_records()?,
        analyzed_records: storage.count_analyzed_records()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints a run record to stdout
pub fn print_run(run: &RunRecord) {
    println!("Run {} ({})", run.id, run.status);
    println!("  Seed: {}", run.seed_url);
    println!(
        "  Progress: {} / {} pages processed, {} persisted",
        run.pages_processed, run.page_budget, run.pages_persisted
    );
    println!("  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        println!("  Finished: {}", finished);
    }
    println!("  Config hash: {}", run.config_hash);
    if let Some(error) = &run.error_message {
        println!("  Error: {}", error);
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Records:");
    println!("  Stored pages: {}", stats.total_records);
    println!(
        "  With analysis: {} ({:.1}%)",
        stats.analyzed_records,
        stats.analyzed_percentage()
    );
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            print_run(run);
        }
        None => println!("No crawl runs recorded"),
    }
}
