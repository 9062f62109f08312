//! Integration tests for the webhook HTTP surface.

mod common;

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use common::{dispatcher, noop_notification, notification, rules, task};
use serde_json::json;
use tower::ServiceExt;
use triage_rs::server::router;
use triage_rs::store::{InMemoryIssueStore, Operation};

fn app(store: Arc<InMemoryIssueStore>) -> axum::Router {
    router(Arc::new(dispatcher(store, Arc::default(), &rules())), None)
}

async fn post(app: axum::Router, body: Vec<u8>) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn handled_notification_returns_ok() {
    let store = Arc::new(InMemoryIssueStore::new(vec![task("1", "x")]));
    let body = notification("jira:issue_updated", "1", json!({"status": {"name": "To Do"}}));

    let (status, text) = post(app(store), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");
}

#[tokio::test]
async fn noop_notification_returns_ok_with_message() {
    let body = noop_notification("jira:issue_updated", "1", json!({}));

    let (status, text) = post(app(Arc::default()), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "No changes detected, exiting.");
}

#[tokio::test]
async fn malformed_notification_returns_500() {
    let body = json!({"webhookEvent": "jira:issue_updated", "issue": {}})
        .to_string()
        .into_bytes();

    let (status, text) = post(app(Arc::default()), body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text, "Error occurred");
}

#[tokio::test]
async fn failed_notification_is_dumped_with_its_payload() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("last_error.txt");
    let app = router(
        Arc::new(dispatcher(Arc::default(), Arc::default(), &rules())),
        Some(dump.clone()),
    );
    let body = r#"{"webhookEvent":"jira:issue_updated","issue":{"fields":{"summary":"lost"}}}"#;

    let (status, _) = post(app.clone(), body.as_bytes().to_vec()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let content = std::fs::read_to_string(&dump).unwrap();
    assert!(content.starts_with("Error: malformed payload: issue.id is missing"));
    assert!(content.contains(body), "{content}");

    // Only the most recent failure is kept.
    post(app, b"not json".to_vec()).await;
    let content = std::fs::read_to_string(&dump).unwrap();
    assert!(content.ends_with("Webhook data: not json\n"));
    assert!(!content.contains("lost"));
}

#[tokio::test]
async fn successful_notification_leaves_no_dump() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("last_error.txt");
    let app = router(
        Arc::new(dispatcher(Arc::default(), Arc::default(), &rules())),
        Some(dump.clone()),
    );

    let (status, _) = post(app, noop_notification("jira:issue_updated", "1", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!dump.exists());
}

#[tokio::test]
async fn rule_failures_still_return_ok() {
    let store = Arc::new(InMemoryIssueStore::new(vec![task("1", "x")]));
    store.fail_on(Operation::Search);
    let body = notification("jira:issue_created", "1", json!({}));

    let (status, text) = post(app(store), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "OK");
}

#[tokio::test]
async fn health_endpoint_answers() {
    let response = app(Arc::default())
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
