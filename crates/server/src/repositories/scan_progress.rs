use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::{ProgressUpdate, ScanProgress};

/// Repository for the singleton scan progress record. The row is seeded by
/// the migrations and only ever updated, so readers always find exactly one
/// snapshot. Each update writes the full record in a single statement;
/// concurrent readers see either the old or the new snapshot, never a mix.
pub struct ScanProgressRepository;

impl ScanProgressRepository {
    /// Read the current snapshot
    pub async fn get(pool: &SqlitePool) -> Result<ScanProgress, sqlx::Error> {
        let row = sqlx::query_as::<_, ScanProgressRow>(
            r#"
            SELECT is_scanning, current_feed, current_index, total_feeds,
                   completed, last_updated
            FROM scan_progress
            WHERE id = 1
            "#,
        )
        .fetch_one(pool)
        .await?;

        Ok(row.into())
    }

    /// Merge the given fields into the snapshot and stamp `last_updated`
    pub async fn update(
        pool: &SqlitePool,
        update: ProgressUpdate,
    ) -> Result<ScanProgress, sqlx::Error> {
        let current = Self::get(pool).await?;

        let merged = ScanProgress {
            is_scanning: update.is_scanning.unwrap_or(current.is_scanning),
            current_feed: update.current_feed.unwrap_or(current.current_feed),
            current_index: update.current_index.unwrap_or(current.current_index),
            total_feeds: update.total_feeds.unwrap_or(current.total_feeds),
            completed: update.completed.unwrap_or(current.completed),
            last_updated: Utc::now(),
        };

        sqlx::query(
            r#"
            UPDATE scan_progress SET
                is_scanning = $1,
                current_feed = $2,
                current_index = $3,
                total_feeds = $4,
                completed = $5,
                last_updated = $6
            WHERE id = 1
            "#,
        )
        .bind(merged.is_scanning)
        .bind(&merged.current_feed)
        .bind(merged.current_index)
        .bind(merged.total_feeds)
        .bind(merged.completed)
        .bind(merged.last_updated)
        .execute(pool)
        .await?;

        Ok(merged)
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct ScanProgressRow {
    is_scanning: bool,
    current_feed: Option<String>,
    current_index: f64,
    total_feeds: i64,
    completed: bool,
    last_updated: DateTime<Utc>,
}

impl From<ScanProgressRow> for ScanProgress {
    fn from(row: ScanProgressRow) -> Self {
        Self {
            is_scanning: row.is_scanning,
            current_feed: row.current_feed,
            current_index: row.current_index,
            total_feeds: row.total_feeds,
            completed: row.completed,
            last_updated: row.last_updated,
        }
    }
}
