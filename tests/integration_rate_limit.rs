#![allow(clippy::unwrap_used, clippy::panic, clippy::todo, clippy::missing_panics_doc, clippy::must_use_candidate, missing_debug_implementations, unreachable_pub, clippy::print_stdout)]
use axum::http::StatusCode;
use serde_json::json;
mod common;

#[tokio::test]
async fn test_submission_tier_limits_bursts() {
    let mut config = common::get_test_config(Some(common::ADMIN_PASSWORD));
    config.rate_limit.submit_per_second = 1;
    config.rate_limit.submit_burst = 3;
    let app = common::TestApp::spawn_with_config(config).await;

    for i in 1..=3 {
        let resp = app.send_message(&format!("Burst message number {i}"), false).await;
        assert_eq!(resp.status(), StatusCode::OK, "Request {i} should be within the burst");
    }

    let resp = app.send_message("One message too many", false).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key("retry-after"));

    // Reply checks share the stricter tier.
    let resp = app
        .client
        .post(app.url("/check-reply"))
        .json(&json!({ "key": "aaaaaaaaaaaaaaaa" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // Other endpoints keep their own budget.
    let resp = app.client.get(app.url("/public-messages")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(app.stats().await["total_messages"], 3);
}

#[tokio::test]
async fn test_rate_limit_isolation_by_forwarded_ip() {
    let mut config = common::get_test_config(Some(common::ADMIN_PASSWORD));
    config.rate_limit.per_second = 1;
    config.rate_limit.burst = 2;
    let app = common::TestApp::spawn_with_config(config).await;

    let user_a = "1.1.1.1";
    let user_b = "2.2.2.2";

    for i in 1..=2 {
        let resp = app.client.get(app.url("/public-messages")).header("X-Forwarded-For", user_a).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "Request {i} for User A should succeed");
    }

    let resp = app.client.get(app.url("/public-messages")).header("X-Forwarded-For", user_a).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS, "User A should now be blocked");

    let resp = app.client.get(app.url("/public-messages")).header("X-Forwarded-For", user_b).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK, "User B should be unaffected");
}
