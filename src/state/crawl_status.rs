//! Lifecycle status of a crawl run
//!
//! The same values are stored in the `runs` table and published on a crawl
//! handle's status channel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current status of a crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Accepted but not started yet
    #[default]
    Pending,

    /// Pages are being fetched
    Running,

    /// The frontier emptied or the budget was spent
    Completed,

    /// The run stopped on an unhandled error
    Failed,
}

impl CrawlStatus {
    /// Returns true if the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> [Self; 4] {
        [Self::Pending, Self::Running, Self::Completed, Self::Failed]
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
