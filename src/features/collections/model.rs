use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Postgres, QueryBuilder};
use utoipa::ToSchema;

use super::dto::{CollectionFilter, CollectionPayload};
use crate::shared::crud::{FieldBinder, Resource, Visibility};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Collection {
    pub id: i64,
    /// 0 for entries shared with everyone
    pub user_id: i64,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub collection_type: String,
    pub thumbnail: String,
    pub description: String,
    pub tags: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Collections;

impl Resource for Collections {
    type Entity = Collection;
    type Payload = CollectionPayload;
    type Filter = CollectionFilter;

    const TABLE: &'static str = "collections";
    const NAME: &'static str = "Collection";
    const COLUMNS: &'static [&'static str] =
        &["title", "url", "type", "thumbnail", "description", "tags"];
    const VISIBILITY: Visibility = Visibility::OwnerOrShared;

    fn bind_payload(payload: CollectionPayload, binder: &mut FieldBinder<'_>) {
        binder
            .bind(payload.title)
            .bind(payload.url)
            .bind(payload.collection_type)
            .bind(payload.thumbnail)
            .bind(payload.description)
            .bind(payload.tags);
    }

    fn push_filter(filter: &CollectionFilter, query: &mut QueryBuilder<'static, Postgres>) {
        if let Some(kind) = filter.collection_type.as_deref().filter(|t| !t.is_empty()) {
            query.push(" AND type = ").push_bind(kind.to_string());
        }
    }
}
