//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use shard_cache::{create_router, AppState, CacheConfig, CacheManager};
use tower::ServiceExt;

// == Helper Functions ==

fn test_config() -> CacheConfig {
    CacheConfig {
        shard_count: 3,
        shard_capacity: 100,
        staleness_threshold: Duration::ZERO,
        ..CacheConfig::default()
    }
}

fn create_test_app() -> Router {
    let manager = CacheManager::start(test_config()).unwrap();
    create_router(AppState::new(manager))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn wait_for_status(app: &Router, uri: &str, expected: StatusCode) -> bool {
    for _ in 0..100 {
        if send(app, "GET", uri).await.0 == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let (status, json) = send(&app, "PUT", "/cache/set?key=test_key&value=test_value").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert!(json["shard"].as_str().unwrap().starts_with("node-"));
}

#[tokio::test]
async fn test_set_endpoint_post() {
    let app = create_test_app();

    let (status, _) = send(&app, "POST", "/cache/set?key=k&value=v").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_set_endpoint_missing_params() {
    let app = create_test_app();

    for uri in ["/cache/set", "/cache/set?key=k", "/cache/set?value=v", "/cache/set?key=&value=v"] {
        let (status, json) = send(&app, "PUT", uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
        assert!(json.get("error").is_some());
    }
}

#[tokio::test]
async fn test_set_endpoint_key_too_long() {
    let app = create_test_app();
    let uri = format!("/cache/set?key={}&value=v", "a".repeat(300));

    let (status, json) = send(&app, "PUT", &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("maximum length"));
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();
    let (_, set) = send(&app, "PUT", "/cache/set?key=get_key&value=get_value").await;

    let (status, json) = send(&app, "GET", "/cache/get?key=get_key").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], "get_value");
    assert_eq!(json["shard"], set["shard"]);
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/cache/get?key=nonexistent").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nonexistent"));
}

#[tokio::test]
async fn test_get_endpoint_missing_key() {
    let app = create_test_app();

    let (status, _) = send(&app, "GET", "/cache/get").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overwrite_returns_latest_value() {
    let app = create_test_app();
    send(&app, "PUT", "/cache/set?key=k&value=first").await;
    send(&app, "PUT", "/cache/set?key=k&value=second").await;

    let (_, json) = send(&app, "GET", "/cache/get?key=k").await;
    assert_eq!(json["value"], "second");
}

// == INVALIDATE Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_key_removes_entry() {
    let app = create_test_app();
    send(&app, "PUT", "/cache/set?key=doomed&value=v").await;

    let (status, json) = send(&app, "DELETE", "/cache/invalidate?key=doomed").await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["delivered"], 1);
    assert!(wait_for_status(&app, "/cache/get?key=doomed", StatusCode::NOT_FOUND).await);
}

#[tokio::test]
async fn test_invalidate_value_removes_matching_entries() {
    let app = create_test_app();
    for i in 0..10 {
        send(&app, "PUT", &format!("/cache/set?key=k{}&value=shared", i)).await;
    }
    send(&app, "PUT", "/cache/set?key=other&value=own").await;

    let (status, json) = send(&app, "DELETE", "/cache/invalidate?value=shared").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["delivered"], 3);

    for i in 0..10 {
        let uri = format!("/cache/get?key=k{}", i);
        assert!(wait_for_status(&app, &uri, StatusCode::NOT_FOUND).await);
    }
    let (status, _) = send(&app, "GET", "/cache/get?key=other").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_requires_one_target() {
    let app = create_test_app();

    let (status, _) = send(&app, "DELETE", "/cache/invalidate").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "DELETE", "/cache/invalidate?key=a&value=b").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_tracks_hits_and_misses() {
    let app = create_test_app();
    send(&app, "PUT", "/cache/set?key=a&value=1").await;
    send(&app, "GET", "/cache/get?key=a").await;
    send(&app, "GET", "/cache/get?key=missing").await;

    let (status, json) = send(&app, "GET", "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["shard_count"], 3);
    assert_eq!(json["shards"].as_array().unwrap().len(), 3);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
    assert_eq!(json["shards"], 3);
}

// == Live Server Test ==

#[tokio::test]
async fn test_live_server_round_trip() {
    let manager = CacheManager::start(test_config()).unwrap();
    let app = create_router(AppState::new(manager.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = client
        .put(format!("{}/cache/set?key=live&value=hello", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let json: Value = client
        .get(format!("{}/cache/get?key=live", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["value"], "hello");

    server.abort();
    manager.shutdown().await;
}
