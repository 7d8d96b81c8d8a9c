use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health status of a feed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedStatus {
    Active,
    Error,
}

impl FeedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "error" => Self::Error,
            _ => Self::Active,
        }
    }
}

/// What started a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScanTrigger {
    Manual,
    Automatic,
}

impl ScanTrigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "automatic" => Some(Self::Automatic),
            _ => None,
        }
    }
}

/// A configured feed source and its health fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Feed {
    pub id: i64,
    pub created_at: DateTime<Utc>,

    /// Feed URL, unique across all sources
    pub url: String,
    /// Title taken from the last successful fetch
    pub title: Option<String>,
    pub status: FeedStatus,
    /// Consecutive failures since the last success
    pub error_count: i64,
    /// Message of the most recent failure, bounded in length
    pub last_error: Option<String>,
    /// Number of articles ingested from this feed
    pub num_articles: i64,
    /// Publication time of the newest known article; only ever advances
    pub last_article_date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_scan_time: Option<DateTime<Utc>>,
    pub last_scan_trigger: Option<ScanTrigger>,
}

/// Request body for registering a new feed
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateFeed {
    pub url: String,
}
