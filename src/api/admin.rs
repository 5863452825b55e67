use crate::api::AppState;
use crate::api::middleware::{AdminUser, ApiQuery};
use crate::api::schemas::admin::{
    AdminListQuery, AdminMessage, AdminMessageResponse, ReplyQuery, ReplyRequest, ReplyResponse, StatsResponse,
};
use crate::api::schemas::contact::MessageList;
use crate::error::{AppError, Result};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};

/// Lists every message, public and private, with keys.
///
/// # Errors
/// Returns `AppError::AuthError` without a valid admin token.
pub async fn list_messages(
    _admin: AdminUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AdminListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.contact_service.page(query.limit, query.offset);
    let messages = state.contact_service.list_messages(query.filter(), page).await?;
    Ok(Json(MessageList::<AdminMessage>::new(messages)))
}

/// Shows a single message by key.
///
/// # Errors
/// Returns `AppError::AuthError` without a valid admin token.
/// Returns `AppError::NotFound` if the key is unknown.
pub async fn get_message(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    let message = state.contact_service.get_message(&key).await?;
    Ok(Json(AdminMessageResponse::from(message)))
}

/// Writes the reply to a message, overwriting any earlier one.
///
/// The text comes from `?reply_text=` when present, otherwise from a JSON `{"reply": ...}` body.
///
/// # Errors
/// Returns `AppError::AuthError` without a valid admin token.
/// Returns `AppError::BadRequest` if neither form carries the reply text.
/// Returns `AppError::Validation` if the reply text is empty or too long.
/// Returns `AppError::NotFound` if the key is unknown.
pub async fn reply(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    ApiQuery(query): ApiQuery<ReplyQuery>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let text = match query.reply_text {
        Some(text) => text,
        None => {
            let payload: ReplyRequest = serde_json::from_slice(&body)
                .map_err(|e| AppError::BadRequest(format!("Expected `reply_text` query parameter or JSON body: {e}")))?;
            payload.reply
        }
    };

    let reply = state.contact_service.reply(&key, &text).await?;
    Ok(Json(ReplyResponse::stored(reply.replied_at)))
}

/// Aggregate message counts.
///
/// # Errors
/// Returns `AppError::AuthError` without a valid admin token.
pub async fn stats(_admin: AdminUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let stats = state.contact_service.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}
