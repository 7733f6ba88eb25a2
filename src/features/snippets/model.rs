use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Postgres, QueryBuilder};
use utoipa::ToSchema;

use super::dto::{SnippetFilter, SnippetPayload};
use crate::shared::crud::{FieldBinder, Resource};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct CodeSnippet {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub language: String,
    pub code: String,
    pub tags: String,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Snippets;

impl Resource for Snippets {
    type Entity = CodeSnippet;
    type Payload = SnippetPayload;
    type Filter = SnippetFilter;

    const TABLE: &'static str = "code_snippets";
    const NAME: &'static str = "Code snippet";
    const COLUMNS: &'static [&'static str] = &["title", "language", "code", "tags", "is_favorite"];
    const ORDER_BY: &'static str = "updated_at DESC, id DESC";

    fn bind_payload(payload: SnippetPayload, binder: &mut FieldBinder<'_>) {
        binder
            .bind(payload.title)
            .bind(payload.language.to_lowercase())
            .bind(payload.code)
            .bind(payload.tags)
            .bind(payload.is_favorite);
    }

    fn push_filter(filter: &SnippetFilter, query: &mut QueryBuilder<'static, Postgres>) {
        if let Some(language) = filter.language.as_deref().filter(|l| !l.is_empty()) {
            query.push(" AND language = ").push_bind(language.to_lowercase());
        }
    }
}
