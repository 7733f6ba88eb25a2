mod dto;
mod model;

pub use dto::{TaskPayload, TaskPriority, TaskStatus};
pub use model::{Task, Tasks};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

/// Served at `/api/tasks` and at the older `/api/todos` path
pub fn routes(pool: PgPool) -> Router {
    let repository = Arc::new(CrudRepository::<Tasks>::new(pool));
    crud_routes("/api/tasks", Arc::clone(&repository)).merge(crud_routes("/api/todos", repository))
}
