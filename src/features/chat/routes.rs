use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handler::{clear_history, get_history, send_message};
use super::service::ChatService;

pub fn routes(chat_service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/api/chat/history", get(get_history).delete(clear_history))
        .route("/api/chat/message", post(send_message))
        .with_state(chat_service)
}
