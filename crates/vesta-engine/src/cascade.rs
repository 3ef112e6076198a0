//! Vacancy cascade rule.
//!
//! Ending a residency never flips the unit status by itself. The
//! repository returns a [`ResidencyEnded`] event and this rule decides
//! whether the unit should go vacant; the occupancy service then
//! applies the decision through a guarded compare-and-set. Keeping the
//! decision pure makes it testable without a store.

use vesta_core::models::resident::{ResidencyEnded, ResidencyType};
use vesta_core::models::unit::OccupancyStatus;

/// Decide whether the unit should cascade to `Vacant`.
///
/// Returns the status the unit is expected to still hold (the
/// compare-and-set guard), or `None` when no cascade applies. The
/// cascade fires only when the ended resident was the primary tenant
/// and nobody else remains active on the unit.
pub fn after_residency_end(event: &ResidencyEnded) -> Option<OccupancyStatus> {
    let ended = &event.resident;
    if ended.is_primary
        && ended.residency_type == ResidencyType::Tenant
        && event.remaining_active == 0
        && event.unit_status == OccupancyStatus::Rented
    {
        Some(OccupancyStatus::Rented)
    } else {
        None
    }
}
