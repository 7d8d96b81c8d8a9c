use utoipa::OpenApi;

use crate::api::handlers::{
    ArticlePage, BulkCreateRequest, BulkCreateResponse, FeedListResponse, FeedSummary,
    NextScanResponse, ScanStartedResponse,
};
use crate::models::{Article, CreateFeed, Feed, FeedRefreshResult, FeedStatus, ScanProgress, ScanTrigger};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "feedwatch API",
        version = "1.0.0"
    ),
    tags(
        (name = "feeds", description = "Feed source management"),
        (name = "scan", description = "Scan control and progress")
    ),
    components(schemas(
        Article,
        ArticlePage,
        BulkCreateRequest,
        BulkCreateResponse,
        CreateFeed,
        Feed,
        FeedListResponse,
        FeedRefreshResult,
        FeedStatus,
        FeedSummary,
        NextScanResponse,
        ScanProgress,
        ScanStartedResponse,
        ScanTrigger
    ))
)]
pub struct ApiDoc;
