//! Reservation scheduler.
//!
//! Booking of shared areas: conflict detection over half-open time
//! intervals, the `Pending → Confirmed → Completed` /
//! `→ Cancelled` status machine, and cost computation.
//!
//! Overlap semantics: two reservations conflict iff
//! `existing.starts_at < new.ends_at && existing.ends_at >
//! new.starts_at`, considering only `Pending` and `Confirmed` rows.
//! Back-to-back bookings (one ending exactly when the next starts) do
//! not conflict.
//!
//! The area's opening/closing window is not enforced here — it is
//! informational, surfaced by the availability query for slot display.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;
use vesta_core::error::{VestaError, VestaResult};
use vesta_core::models::area::Area;
use vesta_core::models::principal::Principal;
use vesta_core::models::reservation::{CreateReservation, Reschedule, Reservation};
use vesta_core::policy::{self, Action, ResourceClass, Scope};
use vesta_core::repository::{AreaRepository, ReservationRepository};

/// Cost of occupying an area for `[starts_at, ends_at)` at the given
/// hourly rate. Fractional hours are exact: 2.5 h at 10.00 is 25.00.
///
/// Every mutation path that touches the interval or the area calls
/// this; cost is never a stored side effect of generic persistence.
pub fn compute_cost(
    hourly_rate: Decimal,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> Decimal {
    let seconds = (ends_at - starts_at).num_seconds();
    hourly_rate * Decimal::from(seconds) / Decimal::from(3600)
}

fn check_range(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> VestaResult<()> {
    if starts_at >= ends_at {
        return Err(VestaError::InvalidRange {
            message: "reservation must start before it ends".into(),
        });
    }
    Ok(())
}

/// Reservation service.
pub struct ReservationService<A: AreaRepository, R: ReservationRepository> {
    areas: A,
    reservations: R,
}

impl<A: AreaRepository, R: ReservationRepository> ReservationService<A, R> {
    pub fn new(areas: A, reservations: R) -> Self {
        Self { areas, reservations }
    }

    /// Create a reservation in `Pending` state.
    ///
    /// Fails with `InvalidRange` when the interval is empty or
    /// inverted, `Unavailable` when the area is disabled, and
    /// `Conflict` when the slot overlaps an existing booking. The
    /// overlap check runs again inside the insert transaction, so a
    /// concurrent booking of the same slot cannot slip through.
    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateReservation,
    ) -> VestaResult<Reservation> {
        policy::require(principal, Action::Create, ResourceClass::Reservations)?;

        // Own-scoped callers book for themselves only.
        let scope = policy::capability(principal.role, ResourceClass::Reservations, Action::Create);
        if scope == Some(Scope::Own) && input.requester_id != principal.id {
            return Err(VestaError::forbidden(
                "reservations can only be created for the requesting principal",
            ));
        }

        check_range(input.starts_at, input.ends_at)?;

        let area = self.areas.get_by_id(input.area_id).await?;
        if !area.is_available {
            return Err(VestaError::Unavailable {
                entity: format!("area {}", area.name),
            });
        }

        let total_cost = compute_cost(area.hourly_rate, input.starts_at, input.ends_at);
        let reservation = self.reservations.create_checked(input, total_cost).await?;
        info!(
            reservation = %reservation.id,
            area = %area.name,
            "reservation created"
        );
        Ok(reservation)
    }

    /// `Pending → Confirmed`. Admin only.
    pub async fn confirm(&self, principal: &Principal, id: Uuid) -> VestaResult<Reservation> {
        policy::require(principal, Action::Update, ResourceClass::Reservations)?;
        self.reservations.confirm(id).await
    }

    /// `Pending | Confirmed → Cancelled`. The requester may withdraw
    /// their own reservation; admins may cancel any.
    pub async fn cancel(&self, principal: &Principal, id: Uuid) -> VestaResult<Reservation> {
        let existing = self.reservations.get_by_id(id).await?;
        policy::require_object(principal, Action::Update, &existing)?;
        self.reservations.cancel(id).await
    }

    /// `Confirmed → Completed`. Admin only.
    pub async fn complete(&self, principal: &Principal, id: Uuid) -> VestaResult<Reservation> {
        policy::require(principal, Action::Update, ResourceClass::Reservations)?;
        self.reservations.complete(id).await
    }

    /// Confirm payment. Orthogonal to the status machine: a
    /// `Confirmed` reservation can have payment unconfirmed and vice
    /// versa.
    pub async fn confirm_payment(
        &self,
        principal: &Principal,
        id: Uuid,
    ) -> VestaResult<Reservation> {
        policy::require(principal, Action::Update, ResourceClass::Finance)?;
        self.reservations.confirm_payment(id).await
    }

    /// Change the interval and/or area of an open reservation.
    ///
    /// Recomputes the cost and re-runs the overlap check excluding the
    /// reservation's own row.
    pub async fn reschedule(
        &self,
        principal: &Principal,
        id: Uuid,
        changes: Reschedule,
    ) -> VestaResult<Reservation> {
        let existing = self.reservations.get_by_id(id).await?;
        policy::require_object(principal, Action::Update, &existing)?;

        if existing.status.is_terminal() {
            return Err(VestaError::invalid_transition(
                "closed reservations cannot be rescheduled",
            ));
        }

        let area_id = changes.area_id.unwrap_or(existing.area_id);
        let starts_at = changes.starts_at.unwrap_or(existing.starts_at);
        let ends_at = changes.ends_at.unwrap_or(existing.ends_at);

        check_range(starts_at, ends_at)?;

        let area = self.areas.get_by_id(area_id).await?;
        if !area.is_available {
            return Err(VestaError::Unavailable {
                entity: format!("area {}", area.name),
            });
        }

        let total_cost = compute_cost(area.hourly_rate, starts_at, ends_at);
        self.reservations
            .reschedule_checked(id, area_id, starts_at, ends_at, total_cost)
            .await
    }

    /// Calendar-blocking reservations overlapping `[starts_at,
    /// ends_at)` on an area, ordered by start. Feeds the
    /// check-availability view together with the area's opening hours.
    pub async fn list_conflicts(
        &self,
        principal: &Principal,
        area_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> VestaResult<(Area, Vec<Reservation>)> {
        policy::require(principal, Action::Read, ResourceClass::Reservations)?;
        check_range(starts_at, ends_at)?;

        let area = self.areas.get_by_id(area_id).await?;
        let conflicts = self
            .reservations
            .list_overlapping(area_id, starts_at, ends_at)
            .await?;
        Ok((area, conflicts))
    }

    /// The caller's own reservations, newest first.
    pub async fn my_reservations(&self, principal: &Principal) -> VestaResult<Vec<Reservation>> {
        policy::require(principal, Action::Read, ResourceClass::Reservations)?;
        self.reservations.list_for_requester(principal.id).await
    }

    /// Flip an area's availability. Admin or maintenance.
    pub async fn set_area_availability(
        &self,
        principal: &Principal,
        area_id: Uuid,
        is_available: bool,
    ) -> VestaResult<Area> {
        policy::require(principal, Action::Update, ResourceClass::Areas)?;
        self.areas
            .update(
                area_id,
                vesta_core::models::area::UpdateArea {
                    is_available: Some(is_available),
                    ..Default::default()
                },
            )
            .await
    }

    /// Whether the caller may see every reservation or only their own.
    pub fn reservation_visibility(&self, principal: &Principal) -> policy::Visibility {
        policy::visibility(Some(principal), ResourceClass::Reservations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, min, 0).unwrap()
    }

    #[test]
    fn cost_of_fractional_hours_is_exact() {
        // 14:00–16:30 at 10.00/h → 25.00
        let cost = compute_cost(Decimal::from(10), at(14, 0), at(16, 30));
        assert_eq!(cost, Decimal::new(2500, 2));
    }

    #[test]
    fn cost_of_whole_hours() {
        let cost = compute_cost(Decimal::new(1550, 2), at(10, 0), at(12, 0));
        assert_eq!(cost, Decimal::from(31));
    }

    #[test]
    fn empty_interval_is_rejected() {
        assert!(matches!(
            check_range(at(10, 0), at(10, 0)),
            Err(VestaError::InvalidRange { .. })
        ));
        assert!(matches!(
            check_range(at(11, 0), at(10, 0)),
            Err(VestaError::InvalidRange { .. })
        ));
        assert!(check_range(at(10, 0), at(10, 1)).is_ok());
    }
}
