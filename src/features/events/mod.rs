mod dto;
mod model;

pub use dto::EventPayload;
pub use model::{Event, Events};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

pub fn routes(pool: PgPool) -> Router {
    crud_routes("/api/events", Arc::new(CrudRepository::<Events>::new(pool)))
}
