use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::dto::NotePayload;
use crate::shared::crud::{FieldBinder, NoFilter, Resource};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Notes;

impl Resource for Notes {
    type Entity = Note;
    type Payload = NotePayload;
    type Filter = NoFilter;

    const TABLE: &'static str = "notes";
    const NAME: &'static str = "Note";
    const COLUMNS: &'static [&'static str] = &["title", "content", "tags", "is_pinned"];
    // Pinned notes first
    const ORDER_BY: &'static str = "is_pinned DESC, updated_at DESC, id DESC";

    fn bind_payload(payload: NotePayload, binder: &mut FieldBinder<'_>) {
        binder
            .bind(payload.title)
            .bind(payload.content)
            .bind(payload.tags)
            .bind(payload.is_pinned);
    }
}
