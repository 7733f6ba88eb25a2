mod dto;
mod model;

pub use dto::NotePayload;
pub use model::{Note, Notes};

use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;

use crate::shared::crud::{crud_routes, CrudRepository};

pub fn routes(pool: PgPool) -> Router {
    crud_routes("/api/notes", Arc::new(CrudRepository::<Notes>::new(pool)))
}
