#![allow(dead_code)]

use clap::Parser;
use contact_server::adapters::database::{self, DbPool};
use contact_server::api::{self, MgmtState};
use contact_server::config::{Cli, Config};
use contact_server::AppBuilder;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Once;
use tempfile::TempDir;

pub const ADMIN_PASSWORD: &str = "test-admin-secret";

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("contact_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Builds a test configuration on top of the CLI defaults, with rate limits
/// high enough not to interfere. `TestApp` points the database at a fresh file.
pub fn get_test_config(admin_password: Option<&str>) -> Config {
    // An explicit empty value overrides any CONTACT_ADMIN_PASSWORD in the environment.
    let args = [
        "contact-server",
        "--host",
        "127.0.0.1",
        "--admin-password",
        admin_password.unwrap_or_default(),
        "--rate-limit-per-second",
        "10000",
        "--rate-limit-burst",
        "10000",
        "--submit-rate-limit-per-second",
        "10000",
        "--submit-rate-limit-burst",
        "10000",
    ];

    Cli::try_parse_from(args).expect("test config should parse").config
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub pool: DbPool,
    pub config: Config,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config(Some(ADMIN_PASSWORD))).await
    }

    pub async fn spawn_without_admin() -> Self {
        Self::spawn_with_config(get_test_config(None)).await
    }

    pub async fn spawn_with_config(mut config: Config) -> Self {
        setup_tracing();

        let db_dir = tempfile::tempdir().expect("Failed to create temp dir");
        config.database.url = format!("sqlite://{}", db_dir.path().join("contact.db").display());

        let pool = database::init_pool(&config.database).await.expect("Failed to open test database");
        contact_server::run_migrations(&pool).await.expect("Failed to run migrations");

        let app = AppBuilder::new(config.clone()).with_database(pool.clone()).build().unwrap();
        let app_router = api::app_router(&config, app.services);
        let mgmt_router = api::mgmt_router(MgmtState { health_service: app.health_service });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_url = format!("http://{}", mgmt_listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self { server_url, mgmt_url, client: reqwest::Client::new(), pool, config, _db_dir: db_dir }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/contact{}", self.server_url, path)
    }

    pub async fn send_message(&self, message: &str, public: bool) -> reqwest::Response {
        self.client
            .post(self.url("/send-message"))
            .json(&json!({ "message": message, "public": public }))
            .send()
            .await
            .unwrap()
    }

    /// Submits a message that must be accepted and returns its key.
    pub async fn submit(&self, message: &str, public: bool) -> String {
        let resp = self.send_message(message, public).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "success");
        body["key"].as_str().expect("Missing key").to_string()
    }

    pub async fn check_reply(&self, key: &str) -> (reqwest::StatusCode, Value) {
        let resp = self.client.post(self.url("/check-reply")).json(&json!({ "key": key })).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    pub async fn public_messages(&self) -> Vec<Value> {
        let resp = self.client.get(self.url("/public-messages")).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "success");
        body["messages"].as_array().unwrap().clone()
    }

    pub async fn admin_reply(&self, key: &str, reply: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/admin/reply/{key}")))
            .bearer_auth(ADMIN_PASSWORD)
            .json(&json!({ "reply": reply }))
            .send()
            .await
            .unwrap()
    }

    pub async fn admin_get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(ADMIN_PASSWORD).send().await.unwrap()
    }

    pub async fn stats(&self) -> Value {
        let resp = self.admin_get("/admin/stats").await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        body["stats"].clone()
    }
}
