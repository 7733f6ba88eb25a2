use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::model::ChatMessage;
use crate::shared::constants::{DEFAULT_CHAT_HISTORY_LIMIT, MAX_CHAT_HISTORY_LIMIT};

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct ChatHistoryQuery {
    /// Newest messages to return (default 50)
    #[validate(range(min = 1, max = MAX_CHAT_HISTORY_LIMIT, message = "limit must be between 1 and 500"))]
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_CHAT_HISTORY_LIMIT
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageDto {
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

/// A stored user message and the reply generated for it
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatExchangeDto {
    pub user_message: ChatMessage,
    pub ai_response: ChatMessage,
}
