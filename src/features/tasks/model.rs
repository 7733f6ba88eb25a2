use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

use super::dto::TaskPayload;
use crate::shared::crud::{FieldBinder, NoFilter, Resource};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    /// pending, in_progress or completed
    pub status: String,
    /// low, medium or high
    pub priority: String,
    pub category: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Tasks;

impl Resource for Tasks {
    type Entity = Task;
    type Payload = TaskPayload;
    type Filter = NoFilter;

    const TABLE: &'static str = "tasks";
    const NAME: &'static str = "Task";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "status",
        "priority",
        "category",
        "due_date",
    ];
    const ORDER_BY: &'static str = "CASE priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END DESC, \
         created_at DESC, id DESC";

    fn bind_payload(payload: TaskPayload, binder: &mut FieldBinder<'_>) {
        binder
            .bind(payload.title)
            .bind(payload.description)
            .bind(payload.status.as_str())
            .bind(payload.priority.as_str())
            .bind(payload.category)
            .bind(payload.due_date);
    }
}
