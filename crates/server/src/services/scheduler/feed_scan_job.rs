use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::traits::{JobResult, SchedulerJob};
use crate::models::ScanTrigger;
use crate::services::ScanService;

/// Scheduled full-feed scan.
///
/// Each tick attempts to claim the scan flag; if a scan is already running
/// (manual or a still-running earlier tick), the tick is skipped outright
/// rather than queued.
pub struct FeedScanJob {
    scan: Arc<ScanService>,
    interval: Duration,
}

impl FeedScanJob {
    pub const NAME: &'static str = "FeedScan";

    pub fn new(scan: Arc<ScanService>, interval: Duration) -> Self {
        Self { scan, interval }
    }
}

#[async_trait]
impl SchedulerJob for FeedScanJob {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn execute(&self) -> JobResult {
        if !self.scan.try_start_scan() {
            tracing::warn!("Feed scan already in progress, skipping this tick");
            return Ok(());
        }

        tracing::info!("Starting scheduled feed scan");
        self.scan.run_scan(ScanTrigger::Automatic).await;

        Ok(())
    }
}
