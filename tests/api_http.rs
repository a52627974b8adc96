// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use newsfeed_aggregator::api::{self, AppState};
use newsfeed_aggregator::ingest::providers::{embedded_fixture_providers, FixtureProvider};
use newsfeed_aggregator::{Aggregator, NewsFacade, SourceId};

const BODY_LIMIT: usize = 1024 * 1024;

fn fixture_facade() -> Arc<NewsFacade> {
    let agg = embedded_fixture_providers()
        .into_iter()
        .fold(Aggregator::new(), |agg, p| agg.with_provider(p));
    Arc::new(NewsFacade::new(Arc::new(agg)))
}

fn test_router(facade: Arc<NewsFacade>) -> Router {
    api::router(AppState { facade })
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router(fixture_facade());
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn search_returns_merged_sorted_state() {
    let app = test_router(fixture_facade());
    let (status, v) = get_json(app, "/api/search?q=climate").await;
    assert_eq!(status, StatusCode::OK);

    let arts = v["articles"].as_array().expect("articles array");
    assert_eq!(arts.len(), 12);
    assert_eq!(v["loading"], false);
    assert_eq!(v["phase"], "succeeded");
    assert!(v["error"].is_null());

    // newest article across all fixtures is the Guardian heat record
    assert_eq!(arts[0]["source"]["id"], "guardian");
    assert_eq!(arts[0]["publishedAt"], "2024-06-03T16:05:00Z");
    assert_eq!(arts[11]["source"]["id"], "guardian");
}

#[tokio::test]
async fn search_respects_sources_filter() {
    let app = test_router(fixture_facade());
    let (_, v) = get_json(app, "/api/search?q=climate&sources=nyt,guardian&dateRange=day").await;
    let arts = v["articles"].as_array().unwrap();
    assert_eq!(arts.len(), 7);
    assert!(arts.iter().all(|a| a["source"]["id"] != "newsapi"));
}

#[tokio::test]
async fn headlines_failure_reports_generic_error() {
    let agg = Aggregator::new().with_provider(Arc::new(FixtureProvider::failing(
        SourceId::Guardian,
        "HTTP 429",
    )));
    let app = test_router(Arc::new(NewsFacade::new(Arc::new(agg))));

    let (status, v) = get_json(app, "/api/headlines?category=sports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["phase"], "failed");
    assert_eq!(v["error"], "No articles found from selected sources");
    assert_eq!(v["category"], "sports");
    assert_eq!(v["articles"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn state_reflects_last_query() {
    let facade = fixture_facade();
    let (_, before) = get_json(test_router(facade.clone()), "/api/state").await;
    assert_eq!(before["phase"], "idle");

    get_json(test_router(facade.clone()), "/api/headlines?category=technology&sources=nyt").await;
    let (_, after) = get_json(test_router(facade), "/api/state").await;
    assert_eq!(after["phase"], "succeeded");
    assert_eq!(after["category"], "technology");
    assert_eq!(after["generation"], 1);
    assert_eq!(after["articles"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn sources_and_categories_are_listed() {
    let (_, sources) = get_json(test_router(fixture_facade()), "/api/sources").await;
    let ids: Vec<&str> = sources
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["newsapi", "guardian", "nyt"]);
    assert_eq!(sources[1]["name"], "The Guardian");

    let (_, cats) = get_json(test_router(fixture_facade()), "/api/categories").await;
    assert_eq!(cats[0], "general");
    assert_eq!(cats.as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn cors_allows_browser_origins() {
    let req = Request::builder()
        .uri("/api/categories")
        .header(http::header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let resp = test_router(fixture_facade()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(http::header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
}
