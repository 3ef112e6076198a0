//! Residential unit domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Occupancy status of a unit.
///
/// Transitions go through [`Vacant`](OccupancyStatus::Vacant): there is
/// no direct `OwnerOccupied ↔ Rented` edge. The status must agree with
/// the unit's set of active residents at all times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyStatus {
    OwnerOccupied,
    Rented,
    Vacant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: Uuid,
    /// Unique human-facing unit number, e.g. `"101"` or `"B-7"`.
    pub unit_number: String,
    pub owner_id: Uuid,
    pub occupancy_status: OccupancyStatus,
    pub floor: Option<i32>,
    pub area_m2: Option<Decimal>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUnit {
    pub unit_number: String,
    pub owner_id: Uuid,
    pub floor: Option<i32>,
    pub area_m2: Option<Decimal>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUnit {
    pub owner_id: Option<Uuid>,
    pub floor: Option<i32>,
    pub area_m2: Option<Decimal>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub description: Option<String>,
}
