//! Common area domain model.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shared amenity that residents can reserve, e.g. a grill or an
/// event hall.
///
/// The opening/closing window is informational: it is returned by the
/// availability query for slot display but the scheduler does not
/// reject reservations outside it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub capacity: u32,
    pub hourly_rate: Decimal,
    pub is_available: bool,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArea {
    pub name: String,
    pub description: Option<String>,
    pub capacity: u32,
    pub hourly_rate: Decimal,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArea {
    pub name: Option<String>,
    pub description: Option<String>,
    pub capacity: Option<u32>,
    pub hourly_rate: Option<Decimal>,
    pub is_available: Option<bool>,
    pub opens_at: Option<NaiveTime>,
    pub closes_at: Option<NaiveTime>,
}
