use sqlx::{PgPool, Postgres, Transaction};

use super::dto::ChatExchangeDto;
use super::model::{ChatMessage, ChatRole};
use crate::core::error::{AppError, Result};

const CHAT_COLUMNS: &str = "id, user_id, role, content, created_at";

/// Prefix of the placeholder assistant reply
const ECHO_PREFIX: &str = "Echo: ";

/// Reply stored for a user message until a model backend is wired in
pub fn assistant_reply(content: &str) -> String {
    format!("{}{}", ECHO_PREFIX, content)
}

pub struct ChatService {
    pool: PgPool,
}

impl ChatService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest first
    pub async fn history(&self, user_id: i64, limit: i64) -> Result<Vec<ChatMessage>> {
        let sql = format!(
            "SELECT {CHAT_COLUMNS} FROM chat_messages \
             WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );

        let messages = sqlx::query_as::<_, ChatMessage>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(messages)
    }

    /// Stores the user message and its reply together
    pub async fn send(&self, user_id: i64, content: &str) -> Result<ChatExchangeDto> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Transaction(format!("begin failed: {}", e)))?;

        let user_message = Self::insert(&mut tx, user_id, ChatRole::User, content).await?;
        let ai_response =
            Self::insert(&mut tx, user_id, ChatRole::Assistant, &assistant_reply(content)).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Transaction(format!("commit failed: {}", e)))?;

        tracing::debug!("Chat exchange stored for user {}", user_id);

        Ok(ChatExchangeDto {
            user_message,
            ai_response,
        })
    }

    async fn insert(
        tx: &mut Transaction<'static, Postgres>,
        user_id: i64,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let sql = format!(
            "INSERT INTO chat_messages (user_id, role, content) VALUES ($1, $2, $3) \
             RETURNING {CHAT_COLUMNS}"
        );

        let message = sqlx::query_as::<_, ChatMessage>(&sql)
            .bind(user_id)
            .bind(role.as_str())
            .bind(content)
            .fetch_one(&mut **tx)
            .await?;

        Ok(message)
    }

    /// Soft-deletes the caller's history; returns how many messages were cleared
    pub async fn clear(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE chat_messages SET deleted_at = NOW() \
             WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "Cleared {} chat messages for user {}",
            result.rows_affected(),
            user_id
        );
        Ok(result.rows_affected())
    }
}
