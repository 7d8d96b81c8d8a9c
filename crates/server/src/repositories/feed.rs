use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{CreateFeed, Feed, FeedStatus, ScanTrigger};

/// Common SELECT fields for feed queries
const SELECT_FEED: &str = r#"
    SELECT
        id, created_at, url, title, status, error_count, last_error,
        num_articles, last_article_date, last_updated, last_scan_time,
        last_scan_trigger
    FROM feeds
"#;

/// Fields written when a feed's scan succeeds, applied in the same
/// transaction as the article inserts.
#[derive(Debug, Clone)]
pub struct FeedScanUpdate {
    pub title: String,
    pub num_articles: i64,
    pub last_article_date: Option<DateTime<Utc>>,
    pub scanned_at: DateTime<Utc>,
    pub trigger: ScanTrigger,
}

pub struct FeedRepository;

impl FeedRepository {
    /// Register a new feed source
    pub async fn create(pool: &SqlitePool, data: CreateFeed) -> Result<Feed, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO feeds (url)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(&data.url)
        .fetch_one(pool)
        .await?;

        let id: i64 = sqlx::Row::get(&result, "id");
        Self::get_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Get a feed by ID
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Feed>, sqlx::Error> {
        let query = format!("{} WHERE id = $1", SELECT_FEED);
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a feed by its URL
    pub async fn get_by_url(pool: &SqlitePool, url: &str) -> Result<Option<Feed>, sqlx::Error> {
        let query = format!("{} WHERE url = $1", SELECT_FEED);
        let row = sqlx::query_as::<_, FeedRow>(&query)
            .bind(url)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get all feeds in registration order. The scan iterates the returned
    /// list as a fixed snapshot; feeds added or removed afterwards are not
    /// reflected in a run already underway.
    pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Feed>, sqlx::Error> {
        let query = format!("{} ORDER BY id", SELECT_FEED);
        let rows = sqlx::query_as::<_, FeedRow>(&query).fetch_all(pool).await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Apply the result of a successful scan. Resets the error fields and
    /// stamps the scan metadata.
    pub async fn mark_scan_success(
        conn: &mut SqliteConnection,
        id: i64,
        update: FeedScanUpdate,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE feeds SET
                title = $1,
                status = 'active',
                error_count = 0,
                last_error = NULL,
                num_articles = $2,
                last_article_date = $3,
                last_updated = $4,
                last_scan_time = $4,
                last_scan_trigger = $5
            WHERE id = $6
            "#,
        )
        .bind(&update.title)
        .bind(update.num_articles)
        .bind(update.last_article_date)
        .bind(update.scanned_at)
        .bind(update.trigger.as_str())
        .bind(id)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Record a failed scan attempt. The scan time and trigger are still
    /// stamped so the attempt stays visible.
    pub async fn mark_scan_failure(
        pool: &SqlitePool,
        id: i64,
        message: &str,
        scanned_at: DateTime<Utc>,
        trigger: ScanTrigger,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE feeds SET
                status = 'error',
                error_count = error_count + 1,
                last_error = $1,
                last_scan_time = $2,
                last_scan_trigger = $3
            WHERE id = $4
            "#,
        )
        .bind(message)
        .bind(scanned_at)
        .bind(trigger.as_str())
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Delete a feed by ID
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feeds WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Internal row type for mapping SQLite results
#[derive(Debug, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    created_at: DateTime<Utc>,
    url: String,
    title: Option<String>,
    status: String,
    error_count: i64,
    last_error: Option<String>,
    num_articles: i64,
    last_article_date: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
    last_scan_time: Option<DateTime<Utc>>,
    last_scan_trigger: Option<String>,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            url: row.url,
            title: row.title,
            status: FeedStatus::from_str(&row.status),
            error_count: row.error_count,
            last_error: row.last_error,
            num_articles: row.num_articles,
            last_article_date: row.last_article_date,
            last_updated: row.last_updated,
            last_scan_time: row.last_scan_time,
            last_scan_trigger: row.last_scan_trigger.as_deref().and_then(ScanTrigger::from_str),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("../../migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_and_fetch_feed() {
        let pool = test_pool().await;

        let feed = FeedRepository::create(
            &pool,
            CreateFeed {
                url: "http://example.com/rss".into(),
            },
        )
        .await
        .unwrap();

        assert_eq!(feed.url, "http://example.com/rss");
        assert_eq!(feed.status, FeedStatus::Active);
        assert_eq!(feed.error_count, 0);
        assert_eq!(feed.num_articles, 0);
        assert!(feed.last_scan_time.is_none());

        let by_url = FeedRepository::get_by_url(&pool, "http://example.com/rss")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_url.id, feed.id);
    }

    #[tokio::test]
    async fn duplicate_url_is_rejected() {
        let pool = test_pool().await;

        FeedRepository::create(
            &pool,
            CreateFeed {
                url: "http://example.com/rss".into(),
            },
        )
        .await
        .unwrap();

        let result = FeedRepository::create(
            &pool,
            CreateFeed {
                url: "http://example.com/rss".into(),
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn scan_failure_then_success_resets_error_fields() {
        let pool = test_pool().await;
        let feed = FeedRepository::create(
            &pool,
            CreateFeed {
                url: "http://example.com/rss".into(),
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        FeedRepository::mark_scan_failure(&pool, feed.id, "timed out", now, ScanTrigger::Automatic)
            .await
            .unwrap();
        FeedRepository::mark_scan_failure(&pool, feed.id, "timed out", now, ScanTrigger::Automatic)
            .await
            .unwrap();

        let failed = FeedRepository::get_by_id(&pool, feed.id).await.unwrap().unwrap();
        assert_eq!(failed.status, FeedStatus::Error);
        assert_eq!(failed.error_count, 2);
        assert_eq!(failed.last_error.as_deref(), Some("timed out"));
        assert_eq!(failed.last_scan_trigger, Some(ScanTrigger::Automatic));

        let mut conn = pool.acquire().await.unwrap();
        FeedRepository::mark_scan_success(
            &mut conn,
            feed.id,
            FeedScanUpdate {
                title: "Example".into(),
                num_articles: 3,
                last_article_date: Some(now),
                scanned_at: now,
                trigger: ScanTrigger::Manual,
            },
        )
        .await
        .unwrap();
        drop(conn);

        let healthy = FeedRepository::get_by_id(&pool, feed.id).await.unwrap().unwrap();
        assert_eq!(healthy.status, FeedStatus::Active);
        assert_eq!(healthy.error_count, 0);
        assert!(healthy.last_error.is_none());
        assert_eq!(healthy.title.as_deref(), Some("Example"));
        assert_eq!(healthy.num_articles, 3);
        assert_eq!(healthy.last_scan_trigger, Some(ScanTrigger::Manual));
    }
}
