//! Resident domain model — the link between a principal and a unit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::unit::OccupancyStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidencyType {
    /// The unit's owner living in their own unit. Only valid when the
    /// resident's principal equals the unit's owner.
    OwnerResident,
    Tenant,
    Family,
    Authorized,
}

/// Residency rows are never hard-deleted: ending a residency flips
/// `active` and stamps `moved_out`, preserving the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resident {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub unit_id: Uuid,
    pub residency_type: ResidencyType,
    /// At most one active primary resident exists per unit.
    pub is_primary: bool,
    pub moved_in: NaiveDate,
    pub moved_out: Option<NaiveDate>,
    pub active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResident {
    pub principal_id: Uuid,
    pub unit_id: Uuid,
    pub residency_type: ResidencyType,
    pub is_primary: bool,
    pub moved_in: NaiveDate,
    pub notes: Option<String>,
}

/// Outcome of ending a single residency.
///
/// The unit-status cascade is NOT applied here — a separate rule
/// inspects this event and decides whether the unit goes vacant.
#[derive(Debug, Clone)]
pub struct ResidencyEnded {
    pub resident: Resident,
    pub unit_id: Uuid,
    /// Unit status at the time the residency ended.
    pub unit_status: OccupancyStatus,
    /// Residents still active on the unit after this one ended.
    pub remaining_active: u64,
}
