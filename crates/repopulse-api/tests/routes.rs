use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use repopulse_api::{create_router, ApiState};
use repopulse_core::Settings;
use repopulse_engine::{Scheduler, Services};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn app(dir: &TempDir) -> (Router, Scheduler) {
    let settings = Settings {
        data_dir: dir.path().join("data"),
        config_dir: dir.path().join("config"),
        ..Settings::default()
    };
    let scheduler = Scheduler::new(settings.time_window().unwrap());
    let services = Services::from_settings(settings, scheduler.clone()).unwrap();
    (create_router(ApiState::new(&services)), scheduler)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_track_and_list() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/track-repo",
        Some(json!({"repo_full_name": "octocat/Hello-World"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::GET, "/api/tracked-repos?days=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["full_name"], "octocat/Hello-World");
    assert_eq!(body[0]["has_updates"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/untrack-repo",
        Some(json!({"repo_full_name": "octocat/Hello-World"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, Method::GET, "/api/tracked-repos", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_invalid_input_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/track-repo",
        Some(json!({"repo_full_name": "no-slash"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = call(&app, Method::GET, "/api/tracked-repos?days=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_search_query_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);

    let (status, body) = call(&app, Method::GET, "/api/search?q=%20%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Invalid search query"));
    assert!(!message.contains("repository"));
}

#[tokio::test]
async fn test_task_lifecycle() {
    let dir = TempDir::new().unwrap();
    let (app, scheduler) = app(&dir);

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/scheduled-tasks",
        Some(json!({
            "email": "dev@example.com",
            "repositories": ["octocat/Hello-World"],
            "frequency": "weekly",
            "weekday": "3",
            "executeTime": "09:30"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["weekday"], "3");
    assert_eq!(created["executeTime"], "09:30");
    assert_eq!(scheduler.registered().await.len(), 1);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/scheduled-tasks/{}", id),
        Some(json!({
            "email": "dev@example.com",
            "repositories": ["octocat/Hello-World"],
            "frequency": "daily"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["frequency"], "daily");
    assert_eq!(scheduler.registered().await.len(), 1);

    let (_, listed) = call(&app, Method::GET, "/api/scheduled-tasks", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, &format!("/api/scheduled-tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(scheduler.registered().await.is_empty());

    let (status, _) = call(&app, Method::DELETE, &format!("/api/scheduled-tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_task_rejected() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/scheduled-tasks",
        Some(json!({
            "email": "dev@example.com",
            "repositories": ["octocat/Hello-World"],
            "frequency": "monthly"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_summary_without_model_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app(&dir);

    let (status, _) = call(&app, Method::GET, "/api/summary", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
