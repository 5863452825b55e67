#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, unreachable_pub, clippy::print_stdout)]
use axum::http::StatusCode;
use serde_json::Value;
mod common;

#[tokio::test]
async fn test_livez() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(format!("{}/livez", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readyz_happy_path() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_readyz_reports_database_failure() {
    let app = common::TestApp::spawn().await;

    app.pool.close().await;

    let resp = app.client.get(format!("{}/readyz", app.mgmt_url)).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["database"], "error");
}

#[tokio::test]
async fn test_database_failure_is_opaque_to_clients() {
    let app = common::TestApp::spawn().await;

    app.pool.close().await;

    let resp = app.send_message("This will not be stored", false).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "An unexpected error occurred.");
}

#[tokio::test]
async fn test_root_reports_running_without_counts() {
    let app = common::TestApp::spawn().await;
    app.submit("Counting should not leak here", false).await;

    let resp = app.client.get(format!("{}/", app.server_url)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "running");
    assert_eq!(body["endpoints"]["send_message"], "/api/contact/send-message");
    assert!(body.get("total_messages").is_none());
    assert!(body.get("stats").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = common::TestApp::spawn().await;

    let resp = app.client.get(app.url("/does-not-exist")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
