use axum::Router;
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::{openapi::ApiDoc, state::AppState};

use super::handlers;

pub fn create_router(state: AppState) -> (Router, utoipa::openapi::OpenApi) {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(handlers::list_feeds, handlers::create_feed))
        .routes(routes!(handlers::create_feeds_bulk))
        .routes(routes!(handlers::delete_feed))
        .routes(routes!(handlers::list_feed_articles))
        .routes(routes!(handlers::refresh_feeds))
        .routes(routes!(handlers::refresh_feed))
        .routes(routes!(handlers::get_progress))
        .routes(routes!(handlers::get_next_scan))
        .with_state(state)
        .split_for_parts();

    (router, api)
}
