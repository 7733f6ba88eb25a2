use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::shared::validation::CLOCK_TIME_REGEX;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EventPayload {
    #[validate(length(min = 1, max = 255, message = "title must be 1-255 characters"))]
    pub title: String,
    #[schema(value_type = String, example = "2025-03-14")]
    pub date: NaiveDate,
    /// "HH:MM", empty for all-day events
    #[serde(default)]
    #[validate(regex(path = *CLOCK_TIME_REGEX, message = "start_time must be HH:MM"))]
    pub start_time: String,
    #[serde(default, rename = "type")]
    #[validate(length(max = 50, message = "type must be at most 50 characters"))]
    pub event_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remind: bool,
}

/// Inclusive date range; either bound may be omitted
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
