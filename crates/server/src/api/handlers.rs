mod feeds;
mod scan;

pub use feeds::{
    __path_create_feed, __path_create_feeds_bulk, __path_delete_feed, __path_list_feed_articles,
    __path_list_feeds, create_feed, create_feeds_bulk, delete_feed, list_feed_articles, list_feeds,
    ArticlePage, BulkCreateRequest, BulkCreateResponse, FeedListResponse, FeedSummary, PageQuery,
};
pub use scan::{
    __path_get_next_scan, __path_get_progress, __path_refresh_feed, __path_refresh_feeds,
    get_next_scan, get_progress, refresh_feed, refresh_feeds, NextScanResponse,
    ScanStartedResponse,
};
