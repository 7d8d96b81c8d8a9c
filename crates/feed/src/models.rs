use chrono::{DateTime, Utc};

/// A fetched feed reduced to the fields the ingestion pipeline consumes.
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    /// Feed-level title, if the origin supplied one
    pub title: Option<String>,
    /// Entries in origin order
    pub entries: Vec<FeedEntry>,
}

/// A single feed entry
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    /// Canonical link, used downstream as the dedup key
    pub link: String,
    pub summary: String,
    /// Publication time, absent when the origin supplies none
    pub published: Option<DateTime<Utc>>,
}
