mod feed_scan_job;
mod traits;

pub use feed_scan_job::FeedScanJob;
pub use traits::{JobResult, SchedulerJob};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::MissedTickBehavior;

type NextRuns = Arc<RwLock<HashMap<&'static str, DateTime<Utc>>>>;

/// Scheduler service that manages periodic background tasks.
///
/// Each registered job runs independently in its own tokio task at its own
/// interval. The scheduler tracks when each job will next fire so the API
/// can display upcoming runs.
pub struct SchedulerService {
    jobs: Vec<Arc<dyn SchedulerJob>>,
    next_runs: NextRuns,
}

impl SchedulerService {
    /// Creates a new scheduler service with no jobs.
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            next_runs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Adds a job to the scheduler.
    ///
    /// Jobs are not started until [`start`](Self::start) is called.
    pub fn with_job<J: SchedulerJob + 'static>(mut self, job: J) -> Self {
        self.jobs.push(Arc::new(job));
        self
    }

    /// Adds an already-wrapped Arc job to the scheduler.
    ///
    /// Useful when a reference to the job is kept for manual triggering.
    pub fn with_arc_job<J: SchedulerJob + 'static>(mut self, job: Arc<J>) -> Self {
        self.jobs.push(job);
        self
    }

    /// Starts all registered jobs.
    ///
    /// Each job runs in its own tokio task and executes at its specified
    /// interval. Returns immediately after spawning all tasks.
    pub fn start(&self) {
        for job in &self.jobs {
            let job = Arc::clone(job);
            let next_runs = Arc::clone(&self.next_runs);
            tokio::spawn(async move {
                Self::run_job_loop(job, next_runs).await;
            });
        }
    }

    /// When the named job will next fire, if it is scheduled.
    pub fn next_run(&self, name: &str) -> Option<DateTime<Utc>> {
        self.next_runs
            .read()
            .ok()
            .and_then(|runs| runs.get(name).copied())
    }

    /// Returns the number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Runs a single job in an infinite loop.
    async fn run_job_loop(job: Arc<dyn SchedulerJob>, next_runs: NextRuns) {
        let name = job.name();
        let interval = job.interval();

        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // The first tick completes immediately; consume it so the job first
        // fires a full interval from startup.
        timer.tick().await;
        Self::record_next_run(&next_runs, name, interval);

        loop {
            timer.tick().await;
            Self::record_next_run(&next_runs, name, interval);

            match job.execute().await {
                Ok(()) => {
                    tracing::debug!("Job '{}' completed successfully", name);
                }
                Err(e) => {
                    tracing::error!("Job '{}' failed: {}", name, e);
                }
            }
        }
    }

    fn record_next_run(next_runs: &NextRuns, name: &'static str, interval: std::time::Duration) {
        let delta = TimeDelta::from_std(interval).unwrap_or_default();
        if let Ok(mut runs) = next_runs.write() {
            runs.insert(name, Utc::now() + delta);
        }
    }
}

impl Default for SchedulerService {
    fn default() -> Self {
        Self::new()
    }
}
