use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The singleton scan status record read by the dashboard while a scan runs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanProgress {
    pub is_scanning: bool,
    /// Label of the feed currently being processed
    pub current_feed: Option<String>,
    /// 1-indexed position within the run; fractional values express
    /// sub-feed progress
    pub current_index: f64,
    pub total_feeds: i64,
    pub completed: bool,
    pub last_updated: DateTime<Utc>,
}

/// Partial update merged into the scan progress record.
///
/// `None` fields are left untouched. `current_feed` is doubly optional so
/// the label can be cleared (`Some(None)`) as well as left alone (`None`).
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub is_scanning: Option<bool>,
    pub current_feed: Option<Option<String>>,
    pub current_index: Option<f64>,
    pub total_feeds: Option<i64>,
    pub completed: Option<bool>,
}

impl ProgressUpdate {
    /// The quiescent state: no scan running, progress cleared.
    pub fn quiescent() -> Self {
        Self {
            is_scanning: Some(false),
            current_feed: Some(None),
            current_index: Some(0.0),
            total_feeds: Some(0),
            completed: Some(true),
        }
    }
}

/// Aggregated statistics for one scan run
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanStats {
    /// Feeds in the snapshot at run start
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries seen across all fetched feeds
    pub entries_seen: usize,
    /// Articles newly persisted this run
    pub articles_added: usize,
}

/// Result payload of a single-feed refresh, returned for immediate display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FeedRefreshResult {
    pub last_scan_time: DateTime<Utc>,
    pub last_article_date: Option<DateTime<Utc>>,
}
