use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::{FeedRefreshResult, ScanProgress, ScanTrigger};
use crate::services::FeedScanJob;
use crate::state::AppState;

/// Response for a scan that was accepted and started in the background
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanStartedResponse {
    pub message: String,
    pub started_at: DateTime<Utc>,
}

/// Start a manual scan of all feeds
///
/// The scan runs in the background; poll `/api/scan/progress` to follow it.
/// At most one scan runs at a time, so a second request while one is
/// underway is rejected rather than queued.
#[utoipa::path(
    post,
    path = "/api/feeds/refresh",
    tag = "scan",
    responses(
        (status = 202, description = "Scan started in background", body = ScanStartedResponse),
        (status = 409, description = "A scan is already in progress"),
    )
)]
pub async fn refresh_feeds(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<ScanStartedResponse>)> {
    let scan = Arc::clone(&state.scan);

    if !scan.try_start_scan() {
        return Err(AppError::conflict("A scan is already in progress"));
    }

    tokio::spawn(async move {
        scan.run_scan(ScanTrigger::Manual).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ScanStartedResponse {
            message: "Scan started in background".to_string(),
            started_at: Utc::now(),
        }),
    ))
}

/// Refresh a single feed and wait for the result
#[utoipa::path(
    post,
    path = "/api/feeds/{id}/refresh",
    tag = "scan",
    params(("id" = i64, Path, description = "Feed ID")),
    responses(
        (status = 200, description = "Feed refreshed", body = FeedRefreshResult),
        (status = 404, description = "Feed not found"),
        (status = 409, description = "A scan is already in progress"),
        (status = 502, description = "Feed could not be fetched or parsed"),
    )
)]
pub async fn refresh_feed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<FeedRefreshResult>> {
    let result = state.scan.refresh_feed(id).await?;
    Ok(Json(result))
}

/// Current scan progress
#[utoipa::path(
    get,
    path = "/api/scan/progress",
    tag = "scan",
    responses(
        (status = 200, description = "Latest progress snapshot", body = ScanProgress)
    )
)]
pub async fn get_progress(State(state): State<AppState>) -> AppResult<Json<ScanProgress>> {
    let progress = state.progress.get().await?;
    Ok(Json(progress))
}

/// When the next automatic scan will run
#[derive(Debug, Serialize, ToSchema)]
pub struct NextScanResponse {
    /// Absent when the scheduler has not started the scan job
    pub next_scan: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/api/scan/next",
    tag = "scan",
    responses(
        (status = 200, description = "Next scheduled scan time", body = NextScanResponse)
    )
)]
pub async fn get_next_scan(State(state): State<AppState>) -> Json<NextScanResponse> {
    Json(NextScanResponse {
        next_scan: state.scheduler.next_run(FeedScanJob::NAME),
    })
}
