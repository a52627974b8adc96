//! HTTP surface consumed by the presentation layer.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::facade::{FeedState, NewsFacade};
use crate::ingest::types::SourceId;
use crate::query::{DateRange, NewsFilters, SortBy, KNOWN_CATEGORIES};

#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<NewsFacade>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/search", get(search))
        .route("/api/headlines", get(headlines))
        .route("/api/state", get(current_state))
        .route("/api/sources", get(sources))
        .route("/api/categories", get(categories))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
    #[serde(default)]
    q: String,
    /// Comma-joined provider ids.
    #[serde(default)]
    sources: Option<String>,
    #[serde(default)]
    date_range: DateRange,
    #[serde(default)]
    sort_by: SortBy,
}

#[derive(Debug, Deserialize)]
struct HeadlinesParams {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    sources: Option<String>,
}

async fn search(State(state): State<AppState>, Query(p): Query<SearchParams>) -> Json<FeedState> {
    let filters = NewsFilters {
        sources: split_csv(p.sources.as_deref()),
        date_range: p.date_range,
        sort_by: p.sort_by,
    };
    Json(state.facade.search(&p.q, &filters).await)
}

async fn headlines(
    State(state): State<AppState>,
    Query(p): Query<HeadlinesParams>,
) -> Json<FeedState> {
    let category = p
        .category
        .unwrap_or_else(|| state.facade.current_category());
    Json(
        state
            .facade
            .headlines(&category, p.sources.as_deref())
            .await,
    )
}

async fn current_state(State(state): State<AppState>) -> Json<FeedState> {
    Json(state.facade.snapshot())
}

#[derive(Serialize)]
struct SourceOut {
    id: SourceId,
    name: &'static str,
}

async fn sources() -> Json<Vec<SourceOut>> {
    Json(
        SourceId::ALL
            .into_iter()
            .map(|id| SourceOut {
                id,
                name: id.display_name(),
            })
            .collect(),
    )
}

async fn categories() -> Json<Vec<&'static str>> {
    Json(KNOWN_CATEGORIES.to_vec())
}

fn split_csv(csv: Option<&str>) -> Vec<String> {
    csv.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
