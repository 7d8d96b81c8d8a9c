use std::sync::Arc;

use feed::{FeedClient, FeedFetcher};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::services::{FeedScanJob, ProgressTracker, ScanService, SchedulerService};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub progress: Arc<ProgressTracker>,
    pub scan: Arc<ScanService>,
    pub scheduler: Arc<SchedulerService>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Result<Self, feed::FeedError> {
        let config = Arc::new(config);

        let fetcher = Arc::new(FeedClient::new(
            config.fetch_timeout,
            config.proxy_url.as_deref(),
        )?);

        let progress = Arc::new(ProgressTracker::new(db.clone()));

        let scan = Arc::new(ScanService::new(
            db.clone(),
            Arc::clone(&fetcher) as Arc<dyn FeedFetcher>,
            Arc::clone(&progress),
        ));

        // Create and start the scheduler with the periodic scan job
        let scheduler = SchedulerService::new()
            .with_job(FeedScanJob::new(Arc::clone(&scan), config.scan_interval));
        scheduler.start();

        Ok(Self {
            db,
            config,
            progress,
            scan,
            scheduler: Arc::new(scheduler),
        })
    }
}
