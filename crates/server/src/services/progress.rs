use sqlx::SqlitePool;

use crate::models::{ProgressUpdate, ScanProgress};
use crate::repositories::ScanProgressRepository;

/// Owner of the scan progress snapshot.
///
/// Writes are best-effort telemetry: a failure to record progress is logged
/// and swallowed so it can never abort a scan. Reads are safe to issue
/// concurrently with a running scan and always return the latest committed
/// snapshot.
pub struct ProgressTracker {
    db: SqlitePool,
}

impl ProgressTracker {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Read the current snapshot
    pub async fn get(&self) -> Result<ScanProgress, sqlx::Error> {
        ScanProgressRepository::get(&self.db).await
    }

    /// Merge the given fields into the snapshot, best-effort
    pub async fn update(&self, update: ProgressUpdate) {
        if let Err(e) = ScanProgressRepository::update(&self.db, update).await {
            tracing::error!("Failed to update scan progress: {}", e);
        }
    }

    /// Return the snapshot to its quiescent state, best-effort
    pub async fn reset(&self) {
        self.update(ProgressUpdate::quiescent()).await;
    }
}
