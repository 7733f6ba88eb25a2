use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, Postgres, QueryBuilder};
use utoipa::ToSchema;

use super::dto::{EventFilter, EventPayload};
use crate::shared::crud::{FieldBinder, Resource};

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Event {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    #[schema(value_type = String, example = "2025-03-14")]
    pub date: NaiveDate,
    pub start_time: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub description: String,
    pub remind: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct Events;

impl Resource for Events {
    type Entity = Event;
    type Payload = EventPayload;
    type Filter = EventFilter;

    const TABLE: &'static str = "events";
    const NAME: &'static str = "Event";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "date",
        "start_time",
        "type",
        "description",
        "remind",
    ];
    const ORDER_BY: &'static str = "date ASC, start_time ASC, id ASC";

    fn bind_payload(payload: EventPayload, binder: &mut FieldBinder<'_>) {
        binder
            .bind(payload.title)
            .bind(payload.date)
            .bind(payload.start_time)
            .bind(payload.event_type)
            .bind(payload.description)
            .bind(payload.remind);
    }

    fn push_filter(filter: &EventFilter, query: &mut QueryBuilder<'static, Postgres>) {
        if let Some(start) = filter.start_date {
            query.push(" AND date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND date <= ").push_bind(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::crud::repository::select_all_query;
    use crate::shared::crud::repository::tests::bound_count;
    use validator::Validate;

    fn payload(start_time: &str) -> EventPayload {
        serde_json::from_value(serde_json::json!({
            "title": "Standup",
            "date": "2025-03-14",
            "start_time": start_time,
            "type": "work",
        }))
        .unwrap()
    }

    #[test]
    fn test_start_time_format() {
        assert!(payload("09:30").validate().is_ok());
        assert!(payload("").validate().is_ok());
        assert!(payload("9:30").validate().is_err());
        assert!(payload("24:00").validate().is_err());
    }

    #[test]
    fn test_type_field_maps_to_event_type() {
        let event = payload("09:30");
        assert_eq!(event.event_type, "work");
        assert_eq!(bound_count::<Events>(event), Events::COLUMNS.len());
    }

    #[test]
    fn test_date_range_filter() {
        let filter = EventFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: None,
        };
        let query = select_all_query::<Events>(1, &filter);
        assert_eq!(
            query.sql(),
            "SELECT * FROM events WHERE user_id = $1 AND deleted_at IS NULL \
             AND date >= $2 ORDER BY date ASC, start_time ASC, id ASC"
        );

        let both = EventFilter {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31),
        };
        assert!(select_all_query::<Events>(1, &both)
            .sql()
            .contains("AND date >= $2 AND date <= $3"));
    }
}
