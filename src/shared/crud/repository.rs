use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgPool, Postgres, QueryBuilder, Type};
use std::marker::PhantomData;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::shared::constants::SHARED_OWNER_ID;

/// Which rows an owner can see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only rows whose `user_id` is the caller
    Owner,
    /// The caller's rows plus rows owned by the shared owner `0`
    OwnerOrShared,
}

/// A table exposed through the generic CRUD routes.
///
/// Every table carries `id`, `user_id`, `created_at` and `updated_at`; soft
/// deletable tables also carry `deleted_at`.
pub trait Resource: Send + Sync + 'static {
    type Entity: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static;
    type Payload: DeserializeOwned + Validate + Send + 'static;
    type Filter: DeserializeOwned + Send + Sync + 'static;

    const TABLE: &'static str;
    /// Display name used in messages, e.g. "Note"
    const NAME: &'static str;
    /// Payload columns, in the order `bind_payload` binds them
    const COLUMNS: &'static [&'static str];
    const VISIBILITY: Visibility = Visibility::Owner;
    const ORDER_BY: &'static str = "created_at DESC, id DESC";
    const SOFT_DELETE: bool = true;

    fn bind_payload(payload: Self::Payload, binder: &mut FieldBinder<'_>);

    /// Appends ` AND ...` conditions for the list filter
    fn push_filter(_filter: &Self::Filter, _query: &mut QueryBuilder<'static, Postgres>) {}
}

/// List filter for resources that take no query parameters
#[derive(Debug, Default, Deserialize)]
pub struct NoFilter {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindMode {
    /// `$1, $2, ...` inside a VALUES list
    Insert,
    /// `col = $1, col = $2, ...` inside a SET clause
    Update,
}

/// Pushes payload values into an INSERT or UPDATE statement in column order
pub struct FieldBinder<'q> {
    query: &'q mut QueryBuilder<'static, Postgres>,
    columns: &'static [&'static str],
    mode: BindMode,
    bound: usize,
}

impl<'q> FieldBinder<'q> {
    fn new(
        query: &'q mut QueryBuilder<'static, Postgres>,
        columns: &'static [&'static str],
        mode: BindMode,
    ) -> Self {
        Self {
            query,
            columns,
            mode,
            bound: 0,
        }
    }

    pub fn bind<T>(&mut self, value: T) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres>,
    {
        debug_assert!(
            self.bound < self.columns.len(),
            "more values bound than columns declared"
        );

        if self.bound > 0 {
            self.query.push(", ");
        }
        if self.mode == BindMode::Update {
            if let Some(column) = self.columns.get(self.bound) {
                self.query.push(*column).push(" = ");
            }
        }
        self.query.push_bind(value);
        self.bound += 1;
        self
    }

    #[cfg(test)]
    pub(crate) fn bound(&self) -> usize {
        self.bound
    }
}

fn push_scope<R: Resource>(query: &mut QueryBuilder<'static, Postgres>, owner_id: i64) {
    match R::VISIBILITY {
        Visibility::Owner => {
            query.push("user_id = ").push_bind(owner_id);
        }
        Visibility::OwnerOrShared => {
            query
                .push("(user_id = ")
                .push_bind(owner_id)
                .push(" OR user_id = ")
                .push_bind(SHARED_OWNER_ID)
                .push(")");
        }
    }
    if R::SOFT_DELETE {
        query.push(" AND deleted_at IS NULL");
    }
}

pub(crate) fn select_all_query<R: Resource>(
    owner_id: i64,
    filter: &R::Filter,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT * FROM {} WHERE ", R::TABLE));
    push_scope::<R>(&mut query, owner_id);
    R::push_filter(filter, &mut query);
    query.push(" ORDER BY ").push(R::ORDER_BY);
    query
}

pub(crate) fn select_one_query<R: Resource>(
    id: i64,
    owner_id: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT * FROM {} WHERE id = ", R::TABLE));
    query.push_bind(id).push(" AND ");
    push_scope::<R>(&mut query, owner_id);
    query
}

pub(crate) fn insert_query<R: Resource>(
    owner_id: i64,
    payload: R::Payload,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "INSERT INTO {} (user_id, {}) VALUES (",
        R::TABLE,
        R::COLUMNS.join(", ")
    ));
    query.push_bind(owner_id).push(", ");
    R::bind_payload(
        payload,
        &mut FieldBinder::new(&mut query, R::COLUMNS, BindMode::Insert),
    );
    query.push(") RETURNING *");
    query
}

pub(crate) fn update_query<R: Resource>(
    id: i64,
    owner_id: i64,
    payload: R::Payload,
) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("UPDATE {} SET ", R::TABLE));
    R::bind_payload(
        payload,
        &mut FieldBinder::new(&mut query, R::COLUMNS, BindMode::Update),
    );
    query.push(", updated_at = NOW() WHERE id = ");
    query.push_bind(id).push(" AND ");
    push_scope::<R>(&mut query, owner_id);
    query.push(" RETURNING *");
    query
}

pub(crate) fn delete_query<R: Resource>(id: i64, owner_id: i64) -> QueryBuilder<'static, Postgres> {
    let mut query = if R::SOFT_DELETE {
        QueryBuilder::new(format!(
            "UPDATE {} SET deleted_at = NOW(), updated_at = NOW() WHERE id = ",
            R::TABLE
        ))
    } else {
        QueryBuilder::new(format!("DELETE FROM {} WHERE id = ", R::TABLE))
    };
    query.push_bind(id).push(" AND ");
    push_scope::<R>(&mut query, owner_id);
    query
}

/// Ownership-scoped CRUD over one [`Resource`] table
pub struct CrudRepository<R: Resource> {
    pool: PgPool,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> CrudRepository<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _resource: PhantomData,
        }
    }

    fn not_found() -> AppError {
        AppError::NotFound(format!("{} not found", R::NAME))
    }

    fn validate(payload: &R::Payload) -> Result<()> {
        payload
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))
    }

    pub async fn get_all(&self, owner_id: i64, filter: &R::Filter) -> Result<Vec<R::Entity>> {
        let mut query = select_all_query::<R>(owner_id, filter);
        let rows = query
            .build_query_as::<R::Entity>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64, owner_id: i64) -> Result<R::Entity> {
        let mut query = select_one_query::<R>(id, owner_id);
        query
            .build_query_as::<R::Entity>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(Self::not_found)
    }

    pub async fn create(&self, owner_id: i64, payload: R::Payload) -> Result<R::Entity> {
        Self::validate(&payload)?;

        let mut query = insert_query::<R>(owner_id, payload);
        let row = query
            .build_query_as::<R::Entity>()
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("{} created for user {}", R::NAME, owner_id);
        Ok(row)
    }

    pub async fn update(&self, id: i64, owner_id: i64, payload: R::Payload) -> Result<R::Entity> {
        Self::validate(&payload)?;

        let mut query = update_query::<R>(id, owner_id, payload);
        query
            .build_query_as::<R::Entity>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(Self::not_found)
    }

    pub async fn delete(&self, id: i64, owner_id: i64) -> Result<()> {
        let mut query = delete_query::<R>(id, owner_id);
        let result = query.build().execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found());
        }

        tracing::debug!("{} {} deleted by user {}", R::NAME, id, owner_id);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug, Serialize, sqlx::FromRow)]
    pub struct Widget {
        pub id: i64,
        pub name: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    pub struct WidgetPayload {
        #[validate(length(min = 1, message = "name is required"))]
        pub name: String,
        pub size: i32,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct WidgetFilter {
        pub name: Option<String>,
    }

    pub struct Widgets;

    impl Resource for Widgets {
        type Entity = Widget;
        type Payload = WidgetPayload;
        type Filter = WidgetFilter;

        const TABLE: &'static str = "widgets";
        const NAME: &'static str = "Widget";
        const COLUMNS: &'static [&'static str] = &["name", "size"];

        fn bind_payload(payload: WidgetPayload, binder: &mut FieldBinder<'_>) {
            binder.bind(payload.name).bind(payload.size);
        }

        fn push_filter(filter: &WidgetFilter, query: &mut QueryBuilder<'static, Postgres>) {
            if let Some(name) = &filter.name {
                query.push(" AND name = ").push_bind(name.clone());
            }
        }
    }

    struct SharedWidgets;

    impl Resource for SharedWidgets {
        type Entity = Widget;
        type Payload = WidgetPayload;
        type Filter = WidgetFilter;

        const TABLE: &'static str = "shared_widgets";
        const NAME: &'static str = "Widget";
        const COLUMNS: &'static [&'static str] = &["name", "size"];
        const VISIBILITY: Visibility = Visibility::OwnerOrShared;
        const SOFT_DELETE: bool = false;

        fn bind_payload(payload: WidgetPayload, binder: &mut FieldBinder<'_>) {
            Widgets::bind_payload(payload, binder);
        }
    }

    fn payload() -> WidgetPayload {
        WidgetPayload {
            name: "gear".to_string(),
            size: 3,
        }
    }

    #[test]
    fn test_select_all_scopes_by_owner() {
        let query = select_all_query::<Widgets>(5, &WidgetFilter::default());
        assert_eq!(
            query.sql(),
            "SELECT * FROM widgets WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC"
        );
    }

    #[test]
    fn test_select_all_appends_filter() {
        let filter = WidgetFilter {
            name: Some("gear".to_string()),
        };
        let query = select_all_query::<Widgets>(5, &filter);
        assert_eq!(
            query.sql(),
            "SELECT * FROM widgets WHERE user_id = $1 AND deleted_at IS NULL \
             AND name = $2 ORDER BY created_at DESC, id DESC"
        );
    }

    #[test]
    fn test_shared_visibility_includes_owner_zero() {
        let query = select_one_query::<SharedWidgets>(7, 5);
        assert_eq!(
            query.sql(),
            "SELECT * FROM shared_widgets WHERE id = $1 AND (user_id = $2 OR user_id = $3)"
        );
    }

    #[test]
    fn test_insert_binds_columns_in_order() {
        let query = insert_query::<Widgets>(5, payload());
        assert_eq!(
            query.sql(),
            "INSERT INTO widgets (user_id, name, size) VALUES ($1, $2, $3) RETURNING *"
        );
    }

    #[test]
    fn test_update_sets_columns_and_timestamp() {
        let query = update_query::<Widgets>(7, 5, payload());
        assert_eq!(
            query.sql(),
            "UPDATE widgets SET name = $1, size = $2, updated_at = NOW() \
             WHERE id = $3 AND user_id = $4 AND deleted_at IS NULL RETURNING *"
        );
    }

    #[test]
    fn test_delete_is_soft_when_supported() {
        assert_eq!(
            delete_query::<Widgets>(7, 5).sql(),
            "UPDATE widgets SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        );
        assert_eq!(
            delete_query::<SharedWidgets>(7, 5).sql(),
            "DELETE FROM shared_widgets WHERE id = $1 AND (user_id = $2 OR user_id = $3)"
        );
    }

    /// Binds `payload` the way an INSERT does and reports how many values went in
    pub fn bound_count<R: Resource>(payload: R::Payload) -> usize {
        let mut query = QueryBuilder::new("");
        let mut binder = FieldBinder::new(&mut query, R::COLUMNS, BindMode::Insert);
        R::bind_payload(payload, &mut binder);
        binder.bound()
    }

    #[test]
    fn test_bound_count_matches_columns() {
        assert_eq!(bound_count::<Widgets>(payload()), Widgets::COLUMNS.len());
    }
}
