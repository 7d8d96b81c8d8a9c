use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use feed::FeedFetcher;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::models::{
    Feed, FeedRefreshResult, NewArticle, ProgressUpdate, ScanStats, ScanTrigger,
};
use crate::repositories::{ArticleRepository, FeedRepository, FeedScanUpdate};
use crate::services::ProgressTracker;

/// Maximum length of an error message stored on a feed
const MAX_ERROR_LEN: usize = 500;

/// Refresh the progress label every this many entries while walking a feed
const ENTRY_PROGRESS_STEP: usize = 5;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] feed::FeedError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by a single-feed refresh
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("feed not found")]
    NotFound,

    #[error("a scan is already in progress")]
    Busy,

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// What one feed's pipeline pass produced
struct ProcessOutcome {
    entries_seen: usize,
    articles_added: usize,
    refresh: FeedRefreshResult,
}

/// Drives the fetch-parse-dedupe-persist pipeline across feeds.
///
/// A single service instance owns the scan flag; at most one full scan (or
/// single-feed refresh, which shares the flag) runs at a time. Callers of
/// [`run_scan`](Self::run_scan) must acquire the flag with
/// [`try_start_scan`](Self::try_start_scan) first; the flag is released on
/// the way out of the run.
pub struct ScanService {
    db: SqlitePool,
    fetcher: Arc<dyn FeedFetcher>,
    progress: Arc<ProgressTracker>,
    /// Flag to prevent concurrent scans
    scan_in_progress: AtomicBool,
}

impl ScanService {
    pub fn new(db: SqlitePool, fetcher: Arc<dyn FeedFetcher>, progress: Arc<ProgressTracker>) -> Self {
        Self {
            db,
            fetcher,
            progress,
            scan_in_progress: AtomicBool::new(false),
        }
    }

    /// Check if a scan is currently in progress
    pub fn is_scan_in_progress(&self) -> bool {
        self.scan_in_progress.load(Ordering::SeqCst)
    }

    /// Try to claim the scan flag. Returns false if a scan is already
    /// running; the caller must then skip its run (no queuing, no retry).
    pub fn try_start_scan(&self) -> bool {
        self.scan_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn finish_scan(&self) {
        self.scan_in_progress.store(false, Ordering::SeqCst);
    }

    /// Run the pipeline over a snapshot of all feeds.
    ///
    /// The caller must hold the scan flag. Per-feed failures are recorded on
    /// the feed and never abort the loop; each feed's changes are committed
    /// before the next feed starts. The progress snapshot is returned to its
    /// quiescent state and the flag released on every exit path.
    pub async fn run_scan(&self, trigger: ScanTrigger) -> ScanStats {
        let stats = self.run_scan_inner(trigger).await;
        self.progress.reset().await;
        self.finish_scan();
        stats
    }

    async fn run_scan_inner(&self, trigger: ScanTrigger) -> ScanStats {
        let mut stats = ScanStats::default();

        // Clear whatever a previously interrupted run may have left behind.
        self.progress.reset().await;

        let feeds = match FeedRepository::get_all(&self.db).await {
            Ok(feeds) => feeds,
            Err(e) => {
                tracing::error!("Failed to list feeds, aborting scan: {}", e);
                return stats;
            }
        };

        // The snapshot is fixed here: feeds added or removed from now on
        // belong to the next run.
        stats.total = feeds.len();
        if feeds.is_empty() {
            tracing::debug!("No feeds configured, nothing to scan");
            return stats;
        }

        self.progress
            .update(ProgressUpdate {
                is_scanning: Some(true),
                completed: Some(false),
                total_feeds: Some(feeds.len() as i64),
                current_index: Some(0.0),
                current_feed: Some(None),
            })
            .await;

        tracing::info!("Starting {} scan of {} feeds", trigger.as_str(), feeds.len());

        for (i, feed_row) in feeds.iter().enumerate() {
            let position = i + 1;
            let label = feed_row.title.clone().unwrap_or_else(|| feed_row.url.clone());

            self.progress
                .update(ProgressUpdate {
                    current_feed: Some(Some(label)),
                    current_index: Some(position as f64),
                    ..Default::default()
                })
                .await;

            match self.process_feed(feed_row, trigger).await {
                Ok(outcome) => {
                    stats.succeeded += 1;
                    stats.entries_seen += outcome.entries_seen;
                    stats.articles_added += outcome.articles_added;
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!("Error updating feed {}: {}", feed_row.url, e);
                }
            }
        }

        tracing::info!(
            "Scan completed: {} feeds, {} succeeded, {} failed, {} entries seen, {} new articles",
            stats.total,
            stats.succeeded,
            stats.failed,
            stats.entries_seen,
            stats.articles_added
        );

        stats
    }

    /// Run the pipeline for exactly one feed.
    ///
    /// Shares the scan flag with full scans, so a refresh while a scan is
    /// underway reports [`RefreshError::Busy`] instead of running
    /// concurrently.
    pub async fn refresh_feed(&self, feed_id: i64) -> Result<FeedRefreshResult, RefreshError> {
        let feed_row = FeedRepository::get_by_id(&self.db, feed_id)
            .await
            .map_err(ScanError::from)?
            .ok_or(RefreshError::NotFound)?;

        if !self.try_start_scan() {
            return Err(RefreshError::Busy);
        }

        let result = self.refresh_feed_inner(&feed_row).await;
        self.progress.reset().await;
        self.finish_scan();

        Ok(result?)
    }

    async fn refresh_feed_inner(&self, feed_row: &Feed) -> Result<FeedRefreshResult, ScanError> {
        let label = feed_row.title.clone().unwrap_or_else(|| feed_row.url.clone());

        self.progress
            .update(ProgressUpdate {
                is_scanning: Some(true),
                completed: Some(false),
                total_feeds: Some(1),
                current_index: Some(1.0),
                current_feed: Some(Some(label)),
            })
            .await;

        let outcome = self.process_feed(feed_row, ScanTrigger::Manual).await?;
        Ok(outcome.refresh)
    }

    /// Fetch, dedupe, and persist one feed, recording the outcome on the
    /// feed's health fields either way.
    async fn process_feed(
        &self,
        feed_row: &Feed,
        trigger: ScanTrigger,
    ) -> Result<ProcessOutcome, ScanError> {
        let scanned_at = Utc::now();

        match self.ingest(feed_row, trigger, scanned_at).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // The failed transaction has already rolled back; record the
                // failure in its own write so the attempt stays visible.
                let message = truncate_error(&e.to_string());
                if let Err(db_err) = FeedRepository::mark_scan_failure(
                    &self.db,
                    feed_row.id,
                    &message,
                    scanned_at,
                    trigger,
                )
                .await
                {
                    tracing::error!(
                        "Failed to record error for feed {}: {}",
                        feed_row.url,
                        db_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn ingest(
        &self,
        feed_row: &Feed,
        trigger: ScanTrigger,
        scanned_at: chrono::DateTime<Utc>,
    ) -> Result<ProcessOutcome, ScanError> {
        let parsed = self.fetcher.fetch(&feed_row.url).await?;
        let title = parsed.title.clone().unwrap_or_else(|| feed_row.url.clone());

        let mut staged: Vec<NewArticle> = Vec::new();
        let mut latest_date = feed_row.last_article_date;
        let total_entries = parsed.entries.len();

        for (entry_index, entry) in parsed.entries.iter().enumerate() {
            if entry_index % ENTRY_PROGRESS_STEP == 0 && entry_index > 0 {
                self.progress
                    .update(ProgressUpdate {
                        current_feed: Some(Some(format!(
                            "{} (processing article {})",
                            title,
                            entry_index + 1
                        ))),
                        ..Default::default()
                    })
                    .await;
            }

            if ArticleRepository::exists_by_link(&self.db, &entry.link).await? {
                continue;
            }

            // Only a strictly newer publication time advances the high-water
            // mark; undated entries never do.
            if let Some(published) = entry.published {
                if latest_date.map_or(true, |current| published > current) {
                    latest_date = Some(published);
                }
            }

            staged.push(NewArticle {
                feed_id: feed_row.id,
                title: entry.title.clone(),
                link: entry.link.clone(),
                description: entry.summary.clone(),
                published_date: entry.published,
            });
        }

        let mut tx = self.db.begin().await?;
        let added = ArticleRepository::bulk_insert(&mut tx, &staged).await?;
        FeedRepository::mark_scan_success(
            &mut tx,
            feed_row.id,
            FeedScanUpdate {
                title,
                num_articles: feed_row.num_articles + added as i64,
                last_article_date: latest_date,
                scanned_at,
                trigger,
            },
        )
        .await?;
        tx.commit().await?;

        if added > 0 {
            tracing::debug!("Feed {}: {} new articles", feed_row.url, added);
        }

        Ok(ProcessOutcome {
            entries_seen: total_entries,
            articles_added: added as usize,
            refresh: FeedRefreshResult {
                last_scan_time: scanned_at,
                last_article_date: latest_date,
            },
        })
    }
}

/// Bound an error message to what the feeds table stores
fn truncate_error(message: &str) -> String {
    if message.len() <= MAX_ERROR_LEN {
        return message.to_string();
    }

    let mut end = MAX_ERROR_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use feed::{FeedEntry, FeedError, ParsedFeed};
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::models::{CreateFeed, FeedStatus, ScanProgress};
    use crate::repositories::ScanProgressRepository;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("../../migrations").run(&pool).await.unwrap();
        pool
    }

    fn entry(link: &str, published: Option<DateTime<Utc>>) -> FeedEntry {
        FeedEntry {
            title: format!("Entry {}", link),
            link: link.to_string(),
            summary: "text".to_string(),
            published,
        }
    }

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, day, 12, 0, 0).unwrap()
    }

    /// Stub fetcher serving canned responses per URL
    #[derive(Default)]
    struct StubFetcher {
        responses: Mutex<HashMap<String, Vec<FeedEntry>>>,
        failures: Mutex<HashMap<String, String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn serve(&self, url: &str, entries: Vec<FeedEntry>) {
            self.responses.lock().unwrap().insert(url.to_string(), entries);
            self.failures.lock().unwrap().remove(url);
        }

        fn fail(&self, url: &str, message: &str) {
            self.failures
                .lock()
                .unwrap()
                .insert(url.to_string(), message.to_string());
        }

        fn fetched_urls(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FeedFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> feed::Result<ParsedFeed> {
            self.fetched.lock().unwrap().push(url.to_string());

            if let Some(message) = self.failures.lock().unwrap().get(url) {
                return Err(FeedError::Parse(message.clone()));
            }

            let entries = self
                .responses
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .unwrap_or_default();

            Ok(ParsedFeed {
                title: Some(format!("Title of {}", url)),
                entries,
            })
        }
    }

    fn service(pool: &SqlitePool, fetcher: Arc<dyn FeedFetcher>) -> ScanService {
        let progress = Arc::new(ProgressTracker::new(pool.clone()));
        ScanService::new(pool.clone(), fetcher, progress)
    }

    async fn run_locked(scan: &ScanService, trigger: ScanTrigger) -> ScanStats {
        assert!(scan.try_start_scan());
        scan.run_scan(trigger).await
    }

    #[tokio::test]
    async fn first_scan_ingests_all_entries() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve(
            "http://x",
            vec![
                entry("http://x/1", Some(date(1))),
                entry("http://x/2", Some(date(2))),
                entry("http://x/3", None),
            ],
        );
        let scan = service(&pool, fetcher);

        let stats = run_locked(&scan, ScanTrigger::Manual).await;
        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.articles_added, 3);

        let updated = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(updated.num_articles, 3);
        assert_eq!(updated.status, FeedStatus::Active);
        assert_eq!(updated.title.as_deref(), Some("Title of http://x"));
        assert_eq!(updated.last_article_date, Some(date(2)));
        assert_eq!(updated.last_scan_trigger, Some(ScanTrigger::Manual));
        assert_eq!(ArticleRepository::count_by_feed(&pool, feed_row.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn second_scan_of_unchanged_feed_adds_nothing() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve(
            "http://x",
            vec![entry("http://x/1", Some(date(1))), entry("http://x/2", None)],
        );
        let scan = service(&pool, fetcher);

        let first = run_locked(&scan, ScanTrigger::Automatic).await;
        assert_eq!(first.articles_added, 2);

        let second = run_locked(&scan, ScanTrigger::Automatic).await;
        assert_eq!(second.articles_added, 0);
        assert_eq!(second.succeeded, 1);

        let updated = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(updated.num_articles, 2);
    }

    #[tokio::test]
    async fn only_unseen_links_are_added() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve("http://x", vec![entry("http://x/1", None)]);
        let scan = service(&pool, fetcher.clone() as Arc<dyn FeedFetcher>);
        run_locked(&scan, ScanTrigger::Manual).await;

        fetcher.serve(
            "http://x",
            vec![entry("http://x/1", None), entry("http://x/2", None)],
        );
        let stats = run_locked(&scan, ScanTrigger::Manual).await;
        assert_eq!(stats.articles_added, 1);

        let updated = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(updated.num_articles, 2);
    }

    #[tokio::test]
    async fn failed_feed_is_marked_and_others_continue() {
        let pool = test_pool().await;
        let a = FeedRepository::create(&pool, CreateFeed { url: "http://a".into() })
            .await
            .unwrap();
        let b = FeedRepository::create(&pool, CreateFeed { url: "http://b".into() })
            .await
            .unwrap();
        let c = FeedRepository::create(&pool, CreateFeed { url: "http://c".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve("http://a", vec![entry("http://a/1", None)]);
        fetcher.fail("http://b", "connection timed out");
        fetcher.serve("http://c", vec![entry("http://c/1", None)]);
        let scan = service(&pool, fetcher);

        let stats = run_locked(&scan, ScanTrigger::Automatic).await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 1);

        let failed = FeedRepository::get_by_id(&pool, b.id).await.unwrap().unwrap();
        assert_eq!(failed.status, FeedStatus::Error);
        assert_eq!(failed.error_count, 1);
        assert!(failed.last_error.as_deref().unwrap().contains("timed out"));
        assert!(failed.last_scan_time.is_some());

        for id in [a.id, c.id] {
            let ok = FeedRepository::get_by_id(&pool, id).await.unwrap().unwrap();
            assert_eq!(ok.status, FeedStatus::Active);
            assert_eq!(ok.num_articles, 1);
        }
    }

    #[tokio::test]
    async fn error_count_resets_after_recovery() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.fail("http://x", "boom");
        let scan = service(&pool, fetcher.clone() as Arc<dyn FeedFetcher>);
        run_locked(&scan, ScanTrigger::Automatic).await;

        let failed = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(failed.error_count, 1);

        fetcher.serve("http://x", vec![entry("http://x/1", None)]);
        run_locked(&scan, ScanTrigger::Automatic).await;

        let recovered = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(recovered.error_count, 0);
        assert_eq!(recovered.status, FeedStatus::Active);
        assert!(recovered.last_error.is_none());
    }

    #[tokio::test]
    async fn last_article_date_never_regresses() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve("http://x", vec![entry("http://x/new", Some(date(20)))]);
        let scan = service(&pool, fetcher.clone() as Arc<dyn FeedFetcher>);
        run_locked(&scan, ScanTrigger::Manual).await;

        // An older entry and an undated one appear later; the high-water
        // mark must stay where it is.
        fetcher.serve(
            "http://x",
            vec![
                entry("http://x/old", Some(date(5))),
                entry("http://x/undated", None),
            ],
        );
        run_locked(&scan, ScanTrigger::Manual).await;

        let updated = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(updated.last_article_date, Some(date(20)));
        assert_eq!(updated.num_articles, 3);
    }

    #[tokio::test]
    async fn scan_flag_is_exclusive() {
        let pool = test_pool().await;
        let scan = service(&pool, Arc::new(StubFetcher::default()));

        assert!(scan.try_start_scan());
        assert!(!scan.try_start_scan());
        assert!(scan.is_scan_in_progress());

        scan.run_scan(ScanTrigger::Manual).await;
        assert!(!scan.is_scan_in_progress());
        assert!(scan.try_start_scan());
    }

    #[tokio::test]
    async fn progress_is_quiescent_after_run() {
        let pool = test_pool().await;
        FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve("http://x", vec![entry("http://x/1", None)]);
        let scan = service(&pool, fetcher);

        run_locked(&scan, ScanTrigger::Manual).await;

        let progress = ScanProgressRepository::get(&pool).await.unwrap();
        assert!(!progress.is_scanning);
        assert!(progress.completed);
        assert_eq!(progress.current_index, 0.0);
        assert_eq!(progress.total_feeds, 0);
    }

    /// Fetcher that records the progress snapshot observed during each fetch
    struct ProbeFetcher {
        pool: SqlitePool,
        observed: Mutex<Vec<ScanProgress>>,
    }

    #[async_trait]
    impl FeedFetcher for ProbeFetcher {
        async fn fetch(&self, url: &str) -> feed::Result<ParsedFeed> {
            let progress = ScanProgressRepository::get(&self.pool)
                .await
                .map_err(|e| FeedError::Parse(e.to_string()))?;
            self.observed.lock().unwrap().push(progress);

            Ok(ParsedFeed {
                title: Some(url.to_string()),
                entries: vec![],
            })
        }
    }

    #[tokio::test]
    async fn progress_walks_feeds_in_order() {
        let pool = test_pool().await;
        for url in ["http://a", "http://b", "http://c"] {
            FeedRepository::create(&pool, CreateFeed { url: url.into() })
                .await
                .unwrap();
        }

        let fetcher = Arc::new(ProbeFetcher {
            pool: pool.clone(),
            observed: Mutex::new(Vec::new()),
        });
        let scan = service(&pool, fetcher.clone() as Arc<dyn FeedFetcher>);
        run_locked(&scan, ScanTrigger::Automatic).await;

        let observed = fetcher.observed.lock().unwrap().clone();
        assert_eq!(observed.len(), 3);

        let mut previous = 0.0;
        for (i, snapshot) in observed.iter().enumerate() {
            assert!(snapshot.is_scanning);
            assert!(!snapshot.completed);
            assert_eq!(snapshot.total_feeds, 3);
            assert_eq!(snapshot.current_index, (i + 1) as f64);
            assert!(snapshot.current_index >= previous);
            previous = snapshot.current_index;
        }
    }

    /// Fetcher that deletes another feed from the store while fetching,
    /// simulating a concurrent removal mid-run
    struct DeletingFetcher {
        pool: SqlitePool,
        delete_id: i64,
        fetched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FeedFetcher for DeletingFetcher {
        async fn fetch(&self, url: &str) -> feed::Result<ParsedFeed> {
            self.fetched.lock().unwrap().push(url.to_string());

            if url == "http://a" {
                FeedRepository::delete(&self.pool, self.delete_id)
                    .await
                    .map_err(|e| FeedError::Parse(e.to_string()))?;
            }

            Ok(ParsedFeed {
                title: Some(url.to_string()),
                entries: vec![],
            })
        }
    }

    #[tokio::test]
    async fn snapshot_still_processes_feeds_deleted_mid_run() {
        let pool = test_pool().await;
        FeedRepository::create(&pool, CreateFeed { url: "http://a".into() })
            .await
            .unwrap();
        FeedRepository::create(&pool, CreateFeed { url: "http://b".into() })
            .await
            .unwrap();
        let c = FeedRepository::create(&pool, CreateFeed { url: "http://c".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(DeletingFetcher {
            pool: pool.clone(),
            delete_id: c.id,
            fetched: Mutex::new(Vec::new()),
        });
        let scan = service(&pool, fetcher.clone() as Arc<dyn FeedFetcher>);
        let stats = run_locked(&scan, ScanTrigger::Automatic).await;

        // The snapshot taken at run start still contains the deleted feed.
        assert_eq!(stats.total, 3);
        let fetched = fetcher.fetched.lock().unwrap().clone();
        assert_eq!(fetched, vec!["http://a", "http://b", "http://c"]);
    }

    #[tokio::test]
    async fn refresh_feed_returns_result_payload() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let fetcher = Arc::new(StubFetcher::default());
        fetcher.serve("http://x", vec![entry("http://x/1", Some(date(3)))]);
        let scan = service(&pool, fetcher);

        let result = scan.refresh_feed(feed_row.id).await.unwrap();
        assert_eq!(result.last_article_date, Some(date(3)));

        let updated = FeedRepository::get_by_id(&pool, feed_row.id).await.unwrap().unwrap();
        assert_eq!(updated.num_articles, 1);
        assert!(!scan.is_scan_in_progress());

        let missing = scan.refresh_feed(feed_row.id + 100).await;
        assert!(matches!(missing, Err(RefreshError::NotFound)));
    }

    #[tokio::test]
    async fn refresh_feed_reports_busy_while_scan_holds_flag() {
        let pool = test_pool().await;
        let feed_row = FeedRepository::create(&pool, CreateFeed { url: "http://x".into() })
            .await
            .unwrap();

        let scan = service(&pool, Arc::new(StubFetcher::default()));
        assert!(scan.try_start_scan());

        let result = scan.refresh_feed(feed_row.id).await;
        assert!(matches!(result, Err(RefreshError::Busy)));
    }

    #[test]
    fn truncate_error_respects_char_boundaries() {
        let short = truncate_error("boom");
        assert_eq!(short, "boom");

        let long = "é".repeat(400);
        let truncated = truncate_error(&long);
        assert!(truncated.len() <= MAX_ERROR_LEN);
        assert!(long.starts_with(&truncated));
    }
}
