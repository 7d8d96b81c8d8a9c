use std::time::Duration;

use async_trait::async_trait;

/// Result type returned by scheduler jobs
pub type JobResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A periodic background task managed by the scheduler.
#[async_trait]
pub trait SchedulerJob: Send + Sync {
    /// Stable name used for logging and next-run lookups
    fn name(&self) -> &'static str;

    /// How often the job fires
    fn interval(&self) -> Duration;

    /// One execution of the job
    async fn execute(&self) -> JobResult;
}
