//! Reservation domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reservation lifecycle.
///
/// `Pending → Confirmed → Completed`, with `Pending | Confirmed →
/// Cancelled`. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::Completed
        )
    }

    /// States that occupy the area's calendar for conflict purposes.
    pub fn blocks_calendar(self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub area_id: Uuid,
    pub requester_id: Uuid,
    pub starts_at: DateTime<Utc>,
    /// Exclusive end instant; `[starts_at, ends_at)` is the occupied
    /// interval, so a reservation ending exactly when another starts
    /// does not conflict.
    pub ends_at: DateTime<Utc>,
    pub status: ReservationStatus,
    /// Always derived from the area's hourly rate and the interval,
    /// never supplied by the caller.
    pub total_cost: Decimal,
    /// Payment confirmation is orthogonal to the status machine.
    pub payment_confirmed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReservation {
    pub area_id: Uuid,
    pub requester_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Interval/area change on an existing reservation. `None` fields keep
/// their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reschedule {
    pub area_id: Option<Uuid>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}
