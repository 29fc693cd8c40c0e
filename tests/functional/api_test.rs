//! Functional tests for the HTTP API

use axum::{
    body::{to_bytes, Body},
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use profileperfect_jobs::{
    adapter::DemoAdapter,
    api::create_router,
    config::Settings,
    ledger::InMemoryLedger,
    storage::FileStorage,
    store::InMemoryJobStore,
    AppState,
};

const ALICE: &str = "token-alice";
const BOB: &str = "token-bob";

struct TestApp {
    router: Router,
    _dir: TempDir,
}

fn create_test_app(alice_credits: u32) -> TestApp {
    let dir = TempDir::new().unwrap();

    let mut settings = Settings::default();
    settings.auth.enabled = true;
    settings.auth.tokens = HashMap::from([
        (ALICE.to_string(), "alice".to_string()),
        (BOB.to_string(), "bob".to_string()),
    ]);
    settings.rate_limit.enabled = false;
    settings.storage.base_path = dir.path().to_string_lossy().to_string();
    settings.storage.url_prefix = "http://localhost:8080/images".to_string();

    let ledger = Arc::new(InMemoryLedger::with_balances([("alice", alice_credits), ("bob", 10)]));
    let store = Arc::new(InMemoryJobStore::new());
    let storage = Arc::new(FileStorage::new(dir.path(), settings.storage.url_prefix.clone()));
    let adapter = Arc::new(DemoAdapter::new("https://demo.test/images", Duration::ZERO));

    let state = AppState::new(settings, ledger, store, adapter, storage);
    TestApp {
        router: create_router(state),
        _dir: dir,
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> Response {
    app.router.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn generation_body(count: u32) -> Value {
    json!({
        "referenceImages": [
            "https://cdn.test/1.jpg",
            "https://cdn.test/2.jpg",
            "https://cdn.test/3.jpg",
            "https://cdn.test/4.jpg",
            "https://cdn.test/5.jpg"
        ],
        "stylePreset": "Corporate",
        "backgroundPreset": "Office",
        "count": count
    })
}

async fn wait_for_job(app: &TestApp, job_id: &str, token: &str) -> Value {
    for _ in 0..500 {
        let response = send(
            app,
            request(Method::GET, &format!("/api/jobs/status?jobId={}", job_id), Some(token), None),
        )
        .await;
        let body = json_body(response).await;
        let status = body["job"]["status"].as_str().unwrap_or_default().to_string();
        if status == "completed" || status == "failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {} never finished", job_id);
}

#[tokio::test]
async fn test_generate_returns_created() {
    let app = create_test_app(10);

    let response = send(
        &app,
        request(Method::POST, "/api/generate", Some(ALICE), Some(generation_body(16))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["status"], "processing");
    assert!(body["estimatedCompletion"].is_string());
    let job_id = body["jobId"].as_str().unwrap().to_string();

    let finished = wait_for_job(&app, &job_id, ALICE).await;
    assert_eq!(finished["success"], true);
    assert_eq!(finished["job"]["status"], "completed");
    assert_eq!(finished["job"]["images"].as_array().unwrap().len(), 16);

    let credits = json_body(send(&app, request(Method::GET, "/api/credits", Some(ALICE), None)).await).await;
    assert_eq!(credits["userId"], "alice");
    assert_eq!(credits["credits"], 6);
}

#[tokio::test]
async fn test_generate_insufficient_credits() {
    let app = create_test_app(1);

    let response = send(
        &app,
        request(Method::POST, "/api/generate", Some(ALICE), Some(generation_body(16))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "insufficient_credits");
    assert_eq!(body["error"]["required"], 4);
    assert_eq!(body["error"]["available"], 1);

    let jobs = json_body(send(&app, request(Method::GET, "/api/jobs", Some(ALICE), None)).await).await;
    assert!(jobs["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_validation_errors() {
    let app = create_test_app(10);

    let mut too_few = generation_body(16);
    too_few["referenceImages"] = json!(["https://cdn.test/1.jpg"]);
    let response = send(&app, request(Method::POST, "/api/generate", Some(ALICE), Some(too_few))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header(AUTHORIZATION, format!("Bearer {}", ALICE))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = send(&app, malformed).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_background_retouch_requires_prompt() {
    let app = create_test_app(10);

    let response = send(
        &app,
        request(
            Method::POST,
            "/api/retouch",
            Some(ALICE),
            Some(json!({
                "sourceImageId": 1,
                "editType": "background",
                "intensity": 0.5,
                "preserveIdentity": true
            })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_retouch_flow_and_ownership() {
    let app = create_test_app(10);

    let created = json_body(
        send(&app, request(Method::POST, "/api/generate", Some(ALICE), Some(generation_body(4)))).await,
    )
    .await;
    let finished = wait_for_job(&app, created["jobId"].as_str().unwrap(), ALICE).await;
    let image_id = finished["job"]["images"][0]["id"].as_i64().unwrap();

    let retouch = json!({
        "sourceImageId": image_id,
        "editType": "retouch",
        "intensity": 0.4,
        "preserveIdentity": true
    });

    let foreign = send(&app, request(Method::POST, "/api/retouch", Some(BOB), Some(retouch.clone()))).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let response = send(&app, request(Method::POST, "/api/retouch", Some(ALICE), Some(retouch))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["parentImageId"], image_id);

    let retouched = wait_for_job(&app, body["jobId"].as_str().unwrap(), ALICE).await;
    assert_eq!(retouched["job"]["kind"], "retouch");
    assert_eq!(retouched["job"]["images"][0]["parentImageId"], image_id);

    let legacy = send(
        &app,
        request(
            Method::GET,
            &format!("/api/retouch?jobId={}", body["jobId"].as_str().unwrap()),
            Some(ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(legacy.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_job_status_errors() {
    let app = create_test_app(10);

    let missing = send(&app, request(Method::GET, "/api/jobs/status", Some(ALICE), None)).await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let malformed = send(&app, request(Method::GET, "/api/generate?jobId=abc", Some(ALICE), None)).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let unknown = send(
        &app,
        request(
            Method::GET,
            "/api/jobs/status?jobId=00000000-0000-4000-8000-000000000000",
            Some(ALICE),
            None,
        ),
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_job_is_hidden() {
    let app = create_test_app(10);

    let created = json_body(
        send(&app, request(Method::POST, "/api/generate", Some(ALICE), Some(generation_body(4)))).await,
    )
    .await;
    let uri = format!("/api/jobs/status?jobId={}", created["jobId"].as_str().unwrap());

    let response = send(&app, request(Method::GET, &uri, Some(BOB), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_image() {
    let app = create_test_app(10);

    let created = json_body(
        send(&app, request(Method::POST, "/api/generate", Some(ALICE), Some(generation_body(4)))).await,
    )
    .await;
    let finished = wait_for_job(&app, created["jobId"].as_str().unwrap(), ALICE).await;
    let image_id = finished["job"]["images"][0]["id"].as_i64().unwrap();
    let uri = format!("/api/images/{}/favorite", image_id);

    let response = send(&app, request(Method::PUT, &uri, Some(ALICE), Some(json!({ "favorited": true })))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["image"]["favorited"], true);

    let foreign = send(&app, request(Method::PUT, &uri, Some(BOB), Some(json!({ "favorited": false })))).await;
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);

    let bad_id = send(
        &app,
        request(Method::PUT, "/api/images/abc/favorite", Some(ALICE), Some(json!({ "favorited": true }))),
    )
    .await;
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_and_serve() {
    let app = create_test_app(10);

    let response = send(
        &app,
        request(
            Method::POST,
            "/api/upload",
            Some(ALICE),
            Some(json!({ "filename": "me.txt", "file": "SGVsbG8sIFdvcmxkIQ==" })),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let url = body["url"].as_str().unwrap();
    let pathname = body["pathname"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:8080/images/"));
    assert!(url.ends_with(pathname));

    let served = send(&app, request(Method::GET, &format!("/images/{}", pathname), None, None)).await;
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = to_bytes(served.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Hello, World!");

    let missing = send(
        &app,
        request(Method::POST, "/api/upload", Some(ALICE), Some(json!({ "filename": "me.jpg" }))),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = create_test_app(10);

    let response = send(&app, request(Method::POST, "/api/generate", None, Some(generation_body(4)))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, request(Method::GET, "/api/credits", Some("bogus"), None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_queue_stats() {
    let app = create_test_app(10);

    let response = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["adapter"], "demo");

    let response = send(&app, request(Method::GET, "/api/queue/stats", Some(ALICE), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["workers"], 4);
    assert_eq!(stats["capacity"], 256);
}
