use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::catalog::{Catalog, Entry};
use crate::config::AppConfig;
use crate::ingest::types::FeedReader;
use crate::page::{self, PageData};
use crate::publish::{self, RSS_CONTENT_TYPE};
use crate::stats::{disk_usage, NetworkStatsHandle};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub config: Arc<AppConfig>,
    pub feeds: Arc<dyn FeedReader>,
    pub network: NetworkStatsHandle,
}

pub fn create_router(state: AppState) -> Router {
    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .route("/", get(index))
        .route("/rss", get(rss_feed))
        .route("/mixed-rss", get(mixed_rss_feed))
        .route("/api/entries", get(entries))
        .route("/health", get(|| async { "OK" }))
        .nest_service("/videos", media)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.catalog.snapshot();
    let root = state.config.media_root.clone();
    let disk = tokio::task::spawn_blocking(move || disk_usage(&root))
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "disk usage lookup failed");
            None
        });

    Html(page::render(&PageData {
        entries: &snapshot,
        disk,
        clocks: page::world_clocks(Utc::now()),
        network: state.network.snapshot(),
    }))
}

fn rss_response(body: anyhow::Result<String>) -> Response {
    match body {
        Ok(xml) => ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], xml).into_response(),
        Err(e) => {
            tracing::error!(error = ?e, "rss rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "feed unavailable").into_response()
        }
    }
}

async fn rss_feed(State(state): State<AppState>) -> Response {
    let snapshot = state.catalog.snapshot();
    rss_response(publish::publish_catalog(&snapshot, state.config.base_url()))
}

async fn mixed_rss_feed(State(state): State<AppState>) -> Response {
    // A missing or unreadable registry yields an empty mixed feed.
    let urls = match crate::registry::load_lines(&state.config.feeds_file).await {
        Ok(urls) => urls,
        Err(e) => {
            tracing::warn!(error = ?e, "feed registry unavailable");
            Vec::new()
        }
    };
    rss_response(
        publish::publish_aggregate(state.feeds.as_ref(), &urls, state.config.base_url()).await,
    )
}

async fn entries(State(state): State<AppState>) -> Json<Vec<Entry>> {
    Json(state.catalog.snapshot().as_ref().clone())
}
