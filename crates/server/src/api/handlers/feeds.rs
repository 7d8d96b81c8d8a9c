use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::models::{Article, CreateFeed, Feed, FeedStatus, ScanProgress, ScanTrigger};
use crate::repositories::{ArticleRepository, FeedRepository};
use crate::services::FeedScanJob;
use crate::state::AppState;

/// Articles returned per page when listing a feed's articles
const ARTICLES_PER_PAGE: i64 = 20;

/// Window for the recent-articles count shown on the dashboard
const RECENT_WINDOW_DAYS: i64 = 7;

/// A feed plus the derived fields the dashboard shows
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedSummary {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub status: FeedStatus,
    pub error_count: i64,
    pub last_error: Option<String>,
    pub num_articles: i64,
    /// Articles collected within the last seven days
    pub recent_articles: i64,
    pub last_article_date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_scan_time: Option<DateTime<Utc>>,
    pub last_scan_trigger: Option<ScanTrigger>,
}

/// Response for the feed list: all feeds plus the scan state the dashboard
/// polls alongside them
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedListResponse {
    pub feeds: Vec<FeedSummary>,
    pub scan_progress: ScanProgress,
    pub next_scan: Option<DateTime<Utc>>,
}

/// List all feeds with their health fields and current scan state
#[utoipa::path(
    get,
    path = "/api/feeds",
    tag = "feeds",
    responses(
        (status = 200, description = "Feeds with scan state", body = FeedListResponse)
    )
)]
pub async fn list_feeds(State(state): State<AppState>) -> AppResult<Json<FeedListResponse>> {
    let feeds = FeedRepository::get_all(&state.db).await?;
    let since = Utc::now() - Duration::days(RECENT_WINDOW_DAYS);

    let mut summaries = Vec::with_capacity(feeds.len());
    for feed in feeds {
        let recent_articles =
            ArticleRepository::count_collected_since(&state.db, feed.id, since).await?;
        summaries.push(summarize(feed, recent_articles));
    }

    let scan_progress = state.progress.get().await?;
    let next_scan = state.scheduler.next_run(FeedScanJob::NAME);

    Ok(Json(FeedListResponse {
        feeds: summaries,
        scan_progress,
        next_scan,
    }))
}

fn summarize(feed: Feed, recent_articles: i64) -> FeedSummary {
    FeedSummary {
        id: feed.id,
        url: feed.url,
        title: feed.title,
        status: feed.status,
        error_count: feed.error_count,
        last_error: feed.last_error,
        num_articles: feed.num_articles,
        recent_articles,
        last_article_date: feed.last_article_date,
        last_updated: feed.last_updated,
        last_scan_time: feed.last_scan_time,
        last_scan_trigger: feed.last_scan_trigger,
    }
}

/// Register a new feed
#[utoipa::path(
    post,
    path = "/api/feeds",
    tag = "feeds",
    request_body = CreateFeed,
    responses(
        (status = 201, description = "Feed registered", body = Feed),
        (status = 400, description = "URL missing"),
        (status = 409, description = "Feed already exists"),
    )
)]
pub async fn create_feed(
    State(state): State<AppState>,
    Json(payload): Json<CreateFeed>,
) -> AppResult<(StatusCode, Json<Feed>)> {
    let url = payload.url.trim().to_string();
    if url.is_empty() {
        return Err(AppError::bad_request("URL is required"));
    }

    if FeedRepository::get_by_url(&state.db, &url).await?.is_some() {
        return Err(AppError::conflict(format!("Feed already exists: {}", url)));
    }

    let feed = FeedRepository::create(&state.db, CreateFeed { url }).await?;
    Ok((StatusCode::CREATED, Json(feed)))
}

/// Request body for bulk feed registration
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkCreateRequest {
    pub urls: Vec<String>,
}

/// Outcome of a bulk registration
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkCreateResponse {
    pub added: usize,
    /// One message per URL that could not be registered
    pub errors: Vec<String>,
}

/// Register several feeds at once, reporting per-URL failures
#[utoipa::path(
    post,
    path = "/api/feeds/bulk",
    tag = "feeds",
    request_body = BulkCreateRequest,
    responses(
        (status = 200, description = "Bulk registration outcome", body = BulkCreateResponse),
        (status = 400, description = "No URLs provided"),
    )
)]
pub async fn create_feeds_bulk(
    State(state): State<AppState>,
    Json(payload): Json<BulkCreateRequest>,
) -> AppResult<Json<BulkCreateResponse>> {
    if payload.urls.is_empty() {
        return Err(AppError::bad_request("No URLs provided"));
    }

    let mut added = 0;
    let mut errors = Vec::new();

    for url in payload.urls {
        let url = url.trim().to_string();
        if url.is_empty() {
            continue;
        }

        match FeedRepository::get_by_url(&state.db, &url).await? {
            Some(_) => errors.push(format!("Feed already exists: {}", url)),
            None => match FeedRepository::create(&state.db, CreateFeed { url: url.clone() }).await
            {
                Ok(_) => added += 1,
                Err(e) => errors.push(format!("Error adding {}: {}", url, e)),
            },
        }
    }

    Ok(Json(BulkCreateResponse { added, errors }))
}

/// Delete a feed and all of its articles
#[utoipa::path(
    delete,
    path = "/api/feeds/{id}",
    tag = "feeds",
    params(("id" = i64, Path, description = "Feed ID")),
    responses(
        (status = 204, description = "Feed deleted"),
        (status = 404, description = "Feed not found"),
    )
)]
pub async fn delete_feed(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if FeedRepository::get_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("Feed not found"));
    }

    // Articles first, then the feed itself
    ArticleRepository::delete_by_feed(&state.db, id).await?;
    FeedRepository::delete(&state.db, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Query parameters for article pagination
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-indexed page number
    #[serde(default)]
    pub page: Option<i64>,
}

/// One page of a feed's articles
#[derive(Debug, Serialize, ToSchema)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// List a feed's articles, newest first
#[utoipa::path(
    get,
    path = "/api/feeds/{id}/articles",
    tag = "feeds",
    params(
        ("id" = i64, Path, description = "Feed ID"),
        PageQuery,
    ),
    responses(
        (status = 200, description = "One page of articles", body = ArticlePage),
        (status = 404, description = "Feed not found"),
    )
)]
pub async fn list_feed_articles(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ArticlePage>> {
    if FeedRepository::get_by_id(&state.db, id).await?.is_none() {
        return Err(AppError::not_found("Feed not found"));
    }

    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * ARTICLES_PER_PAGE;

    let articles = ArticleRepository::get_by_feed(&state.db, id, ARTICLES_PER_PAGE, offset).await?;
    let total = ArticleRepository::count_by_feed(&state.db, id).await?;

    Ok(Json(ArticlePage {
        articles,
        page,
        per_page: ARTICLES_PER_PAGE,
        total,
    }))
}
