use crate::api::AppState;
use crate::api::middleware::{ApiJson, ApiQuery};
use crate::api::schemas::contact::{
    CheckReply, CheckReplyResponse, MessageList, PageQuery, PublicMessage, SendMessage, SendMessageResponse,
};
use crate::api::schemas::health::RootResponse;
use crate::error::Result;
use axum::{Json, extract::State, response::IntoResponse};
use std::collections::BTreeMap;

/// Accepts an anonymous message and hands back the key that unlocks its reply.
///
/// # Errors
/// Returns `AppError::Validation` if the message is empty or out of bounds.
/// Returns `AppError::BadRequest` if the body is not a valid request.
pub async fn send_message(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SendMessage>,
) -> Result<impl IntoResponse> {
    let message = state.contact_service.submit(&payload.message, payload.public).await?;
    Ok(Json(SendMessageResponse::sent(message.key.into_inner())))
}

/// Redeems a key. Unknown keys and missing replies are reported in the body with HTTP 200.
///
/// # Errors
/// Returns `AppError::BadRequest` if the body is not a valid request.
pub async fn check_reply(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CheckReply>,
) -> Result<impl IntoResponse> {
    let lookup = state.contact_service.check_reply(&payload.key).await?;
    Ok(Json(CheckReplyResponse::from(lookup)))
}

/// Lists messages their senders chose to make public.
///
/// # Errors
/// Returns `AppError::BadRequest` if the pagination parameters are malformed.
pub async fn public_messages(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<impl IntoResponse> {
    let page = state.contact_service.page(query.limit, query.offset);
    let messages = state.contact_service.public_messages(page).await?;
    Ok(Json(MessageList::<PublicMessage>::new(messages)))
}

/// Liveness check for the public listener.
pub async fn root() -> impl IntoResponse {
    let endpoints = BTreeMap::from([
        ("send_message", "/api/contact/send-message"),
        ("check_reply", "/api/contact/check-reply"),
        ("public_messages", "/api/contact/public-messages"),
        ("admin_messages", "/api/contact/admin/messages (requires auth)"),
        ("admin_reply", "/api/contact/admin/reply/{key} (requires auth)"),
        ("admin_stats", "/api/contact/admin/stats (requires auth)"),
    ]);

    Json(RootResponse {
        status: "running",
        message: "Anonymous Contact API is running",
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}
