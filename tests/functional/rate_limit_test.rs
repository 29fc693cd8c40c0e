//! Functional tests for per-user rate limiting

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Request, StatusCode},
    Router,
};
use std::collections::HashMap;
use tower::ServiceExt;
use profileperfect_jobs::middleware::{auth::AuthLayer, rate_limit::RateLimitLayer};

fn create_test_app(rps: u32, burst: u32) -> Router {
    Router::new()
        .route("/health", axum::routing::get(|| async { "healthy" }))
        .route("/test", axum::routing::get(|| async { "OK" }))
        .layer(RateLimitLayer::new(rps, burst))
        .layer(AuthLayer::new(
            HashMap::from([
                ("token-alice".to_string(), "alice".to_string()),
                ("token-bob".to_string(), "bob".to_string()),
            ]),
            "mock-user-id",
        ))
}

fn request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_rate_limit_allows_within_limit() {
    let app = create_test_app(100, 100);

    for _ in 0..5 {
        let response = app.clone().oneshot(request("/test", "token-alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = create_test_app(1, 1);

    let first = app.clone().oneshot(request("/test", "token-alice")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(request("/test", "token-alice")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_limits_are_per_user() {
    let app = create_test_app(1, 1);

    let alice = app.clone().oneshot(request("/test", "token-alice")).await.unwrap();
    assert_eq!(alice.status(), StatusCode::OK);
    let alice_again = app.clone().oneshot(request("/test", "token-alice")).await.unwrap();
    assert_eq!(alice_again.status(), StatusCode::TOO_MANY_REQUESTS);

    let bob = app.oneshot(request("/test", "token-bob")).await.unwrap();
    assert_eq!(bob.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_health_bypass() {
    let app = create_test_app(1, 1);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
