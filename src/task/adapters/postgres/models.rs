//! Diesel row models for task and offer persistence.

use super::schema::{offers, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: uuid::Uuid,
    pub poster_id: String,
    pub poster_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub zip_code: String,
    pub area_description: String,
    pub full_address: String,
    pub price_cents: i64,
    pub photo_required: bool,
    pub confirmation_code: String,
    pub status: String,
    pub helper_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub checkout: Option<Value>,
    pub state: Value,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert and compare-and-set update model for task records.
///
/// `None` values are written as `NULL` so a cleared helper binding does not
/// linger on update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskWriteRow {
    pub id: uuid::Uuid,
    pub poster_id: String,
    pub poster_name: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub zip_code: String,
    pub area_description: String,
    pub full_address: String,
    pub price_cents: i64,
    pub photo_required: bool,
    pub confirmation_code: String,
    pub status: String,
    pub helper_id: Option<String>,
    pub checkout_session_id: Option<String>,
    pub checkout: Option<Value>,
    pub state: Value,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query result row for offer records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = offers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OfferRow {
    pub id: uuid::Uuid,
    pub task_id: uuid::Uuid,
    pub helper_id: String,
    pub helper_name: String,
    pub note: String,
    pub proposed_price_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert model for offer records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = offers)]
pub struct NewOfferRow {
    pub id: uuid::Uuid,
    pub task_id: uuid::Uuid,
    pub helper_id: String,
    pub helper_name: String,
    pub note: String,
    pub proposed_price_cents: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
