//! Ownership-scoped CRUD shared by the simple resource features.

mod handlers;
pub(crate) mod repository;

pub use handlers::crud_routes;
pub use repository::{CrudRepository, FieldBinder, NoFilter, Resource, Visibility};
