use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An ingested feed entry. Articles are append-only: created once at
/// ingestion time and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    /// Canonical link, unique across all feeds (the dedup key)
    pub link: String,
    pub description: String,
    /// Publication time from the origin, absent when it supplied none
    pub published_date: Option<DateTime<Utc>>,
    /// When this article was first ingested
    pub collected_date: DateTime<Utc>,
}

/// An article staged for insertion
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub feed_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_date: Option<DateTime<Utc>>,
}
