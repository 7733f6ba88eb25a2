use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use super::dto::{ChatExchangeDto, ChatHistoryQuery, SendMessageDto};
use super::model::ChatMessage;
use super::service::ChatService;
use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::CurrentUser;
use crate::shared::types::{ApiResponse, Meta};

/// Chat history, newest first
#[utoipa::path(
    get,
    path = "/api/chat/history",
    tag = "chat",
    params(ChatHistoryQuery),
    responses(
        (status = 200, description = "Chat messages", body = ApiResponse<Vec<ChatMessage>>),
        (status = 400, description = "Invalid limit")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_history(
    user: CurrentUser,
    State(service): State<Arc<ChatService>>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let messages = service.history(user.id, query.limit).await?;
    let meta = Meta::with_total(messages.len());
    Ok(Json(ApiResponse::success(Some(messages), None, Some(meta))))
}

/// Send a message and receive the assistant reply
#[utoipa::path(
    post,
    path = "/api/chat/message",
    tag = "chat",
    request_body = SendMessageDto,
    responses(
        (status = 200, description = "Stored message and reply", body = ApiResponse<ChatExchangeDto>),
        (status = 400, description = "Empty message")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_message(
    user: CurrentUser,
    State(service): State<Arc<ChatService>>,
    AppJson(dto): AppJson<SendMessageDto>,
) -> Result<Json<ApiResponse<ChatExchangeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let exchange = service.send(user.id, &dto.content).await?;
    Ok(Json(ApiResponse::success(Some(exchange), None, None)))
}

/// Clear the caller's chat history
#[utoipa::path(
    delete,
    path = "/api/chat/history",
    tag = "chat",
    responses(
        (status = 200, description = "Chat history cleared successfully")
    ),
    security(("bearer_auth" = []))
)]
pub async fn clear_history(
    user: CurrentUser,
    State(service): State<Arc<ChatService>>,
) -> Result<Json<ApiResponse<()>>> {
    service.clear(user.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Chat history cleared successfully".to_string()),
        None,
    )))
}
