use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::dto::BookmarkPayload;
use crate::shared::crud::{FieldBinder, NoFilter, Resource};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: String,
    pub favicon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Bookmarks;

impl Resource for Bookmarks {
    type Entity = Bookmark;
    type Payload = BookmarkPayload;
    type Filter = NoFilter;

    const TABLE: &'static str = "bookmarks";
    const NAME: &'static str = "Bookmark";
    const COLUMNS: &'static [&'static str] = &["title", "url", "description", "tags", "favicon"];

    fn bind_payload(payload: BookmarkPayload, binder: &mut FieldBinder<'_>) {
        binder
            .bind(payload.title)
            .bind(payload.url)
            .bind(payload.description)
            .bind(payload.tags)
            .bind(payload.favicon);
    }
}
