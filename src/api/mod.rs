use crate::api::rate_limit::log_rate_limit_events;
use crate::config::{Config, CorsConfig};
use crate::services::auth_service::AdminAuthenticator;
use crate::services::contact_service::ContactService;
use crate::services::health_service::HealthService;
use crate::services::rate_limit_service::RateLimitService;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, Request};
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod contact;
pub mod health;
pub mod middleware;
pub mod rate_limit;
pub mod schemas;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct AppState {
    pub contact_service: ContactService,
    pub admin_auth: AdminAuthenticator,
    pub rate_limit_service: RateLimitService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub contact_service: ContactService,
    pub admin_auth: AdminAuthenticator,
    pub rate_limit_service: RateLimitService,
}

/// Configures and returns the public API router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
pub fn app_router(config: &Config, services: ServiceContainer) -> Router {
    let std_interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let standard_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(std_interval_ns))
            .burst_size(config.rate_limit.burst.max(1))
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build standard rate limiter config"),
    );

    // Submission tier: anonymous writes and key guessing get the stricter budget
    let submit_interval_ns = 1_000_000_000 / config.rate_limit.submit_per_second.max(1);
    let submit_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(submit_interval_ns))
            .burst_size(config.rate_limit.submit_burst.max(1))
            .key_extractor(services.rate_limit_service.extractor.clone())
            .finish()
            .expect("Failed to build submission rate limiter config"),
    );

    let state = AppState {
        contact_service: services.contact_service,
        admin_auth: services.admin_auth,
        rate_limit_service: services.rate_limit_service,
    };

    let submit_routes = Router::new()
        .route("/send-message", post(contact::send_message))
        .route("/check-reply", post(contact::check_reply))
        .layer(GovernorLayer::new(submit_conf));

    let standard_routes = Router::new()
        .route("/public-messages", get(contact::public_messages))
        .route("/admin/messages", get(admin::list_messages))
        .route("/admin/messages/{key}", get(admin::get_message))
        .route("/admin/reply/{key}", post(admin::reply))
        .route("/admin/stats", get(admin::stats))
        .layer(GovernorLayer::new(standard_conf));

    let contact_routes = submit_routes
        .merge(standard_routes)
        .layer(from_fn_with_state(state.clone(), log_rate_limit_events));

    Router::new()
        .route("/", get(contact::root))
        .nest("/api/contact", contact_routes)
        .layer(cors_layer(&config.cors))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(HeaderName::from_static(REQUEST_ID_HEADER), MakeRequestUuid))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]).allow_headers(Any);

    if config.allowed_origins.iter().any(|origin| origin.trim() == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
