use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{Article, NewArticle};

/// Common SELECT fields for article queries
const SELECT_ARTICLE: &str = r#"
    SELECT
        id, feed_id, title, link, description, published_date, collected_date
    FROM articles
"#;

pub struct ArticleRepository;

impl ArticleRepository {
    /// Check whether an article with this link has already been ingested,
    /// from any feed.
    pub async fn exists_by_link(pool: &SqlitePool, link: &str) -> Result<bool, sqlx::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE link = $1")
                .bind(link)
                .fetch_one(pool)
                .await?;

        Ok(count > 0)
    }

    /// Insert a batch of staged articles inside the caller's transaction.
    /// Returns the number of rows inserted.
    pub async fn bulk_insert(
        conn: &mut SqliteConnection,
        articles: &[NewArticle],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;

        for article in articles {
            let result = sqlx::query(
                r#"
                INSERT INTO articles (feed_id, title, link, description, published_date)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(article.feed_id)
            .bind(&article.title)
            .bind(&article.link)
            .bind(&article.description)
            .bind(article.published_date)
            .execute(&mut *conn)
            .await?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// Get one page of a feed's articles, newest first
    pub async fn get_by_feed(
        pool: &SqlitePool,
        feed_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>, sqlx::Error> {
        let query = format!(
            "{} WHERE feed_id = $1 ORDER BY published_date DESC LIMIT $2 OFFSET $3",
            SELECT_ARTICLE
        );
        sqlx::query_as::<_, Article>(&query)
            .bind(feed_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total number of articles stored for a feed
    pub async fn count_by_feed(pool: &SqlitePool, feed_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE feed_id = $1")
            .bind(feed_id)
            .fetch_one(pool)
            .await
    }

    /// Number of a feed's articles collected since the given time
    pub async fn count_collected_since(
        pool: &SqlitePool,
        feed_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE feed_id = $1 AND collected_date >= $2",
        )
        .bind(feed_id)
        .bind(since)
        .fetch_one(pool)
        .await
    }

    /// Delete all articles belonging to a feed. Used when the feed itself
    /// is removed.
    pub async fn delete_by_feed(pool: &SqlitePool, feed_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM articles WHERE feed_id = $1")
            .bind(feed_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateFeed;
    use crate::repositories::FeedRepository;
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

    fn article(feed_id: i64, link: &str) -> NewArticle {
        NewArticle {
            feed_id,
            title: format!("Article at {}", link),
            link: link.to_string(),
            description: String::new(),
            published_date: None,
        }
    }

    #[tokio::test]
    async fn bulk_insert_and_lookup_by_link() {
        let pool = test_pool().await;
        let feed = FeedRepository::create(&pool, CreateFeed { url: "http://a".into() })
            .await
            .unwrap();

        let staged = vec![article(feed.id, "http://a/1"), article(feed.id, "http://a/2")];
        let mut tx = pool.begin().await.unwrap();
        let inserted = ArticleRepository::bulk_insert(&mut tx, &staged).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(inserted, 2);
        assert!(ArticleRepository::exists_by_link(&pool, "http://a/1").await.unwrap());
        assert!(!ArticleRepository::exists_by_link(&pool, "http://a/3").await.unwrap());
        assert_eq!(ArticleRepository::count_by_feed(&pool, feed.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_link_rolls_back_transaction() {
        let pool = test_pool().await;
        let feed = FeedRepository::create(&pool, CreateFeed { url: "http://a".into() })
            .await
            .unwrap();

        let mut tx = pool.begin().await.unwrap();
        ArticleRepository::bulk_insert(&mut tx, &[article(feed.id, "http://a/1")])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        // A batch containing an already-stored link fails as a whole; the
        // dropped transaction leaves no partial rows behind.
        let mut tx = pool.begin().await.unwrap();
        let result = ArticleRepository::bulk_insert(
            &mut tx,
            &[article(feed.id, "http://a/2"), article(feed.id, "http://a/1")],
        )
        .await;
        assert!(result.is_err());
        drop(tx);

        assert!(!ArticleRepository::exists_by_link(&pool, "http://a/2").await.unwrap());
        assert_eq!(ArticleRepository::count_by_feed(&pool, feed.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_by_feed_removes_all_articles() {
        let pool = test_pool().await;
        let feed = FeedRepository::create(&pool, CreateFeed { url: "http://a".into() })
            .await
            .unwrap();

        let mut tx = pool.begin().await.unwrap();
        ArticleRepository::bulk_insert(
            &mut tx,
            &[article(feed.id, "http://a/1"), article(feed.id, "http://a/2")],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        let removed = ArticleRepository::delete_by_feed(&pool, feed.id).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(ArticleRepository::count_by_feed(&pool, feed.id).await.unwrap(), 0);
    }
}
