//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Operations that implement a
//! state-machine transition (occupancy changes, reservation
//! transitions) are contractually atomic: the implementation must run
//! the precondition check and the writes in one store transaction so
//! that two concurrent writers cannot both pass the check.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::VestaResult;
use crate::models::{
    announcement::{Announcement, CreateAnnouncement},
    area::{Area, CreateArea, UpdateArea},
    fee::{CreateFee, CreatePayment, Fee, Payment},
    notification::{CreateNotification, Notification},
    principal::{Principal, Role},
    reservation::{CreateReservation, Reservation},
    resident::{CreateResident, Resident, ResidencyEnded},
    security::{
        AccessLog, Camera, CreateAccessLog, CreateCamera, CreateSecurityIncident,
        SecurityIncident,
    },
    unit::{CreateUnit, OccupancyStatus, Unit, UpdateUnit},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Principals (read-only mirror of the authentication collaborator)
// ---------------------------------------------------------------------------

pub trait PrincipalRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Principal>> + Send;
    fn list_active(&self) -> impl Future<Output = VestaResult<Vec<Principal>>> + Send;
    fn list_by_role(&self, role: Role) -> impl Future<Output = VestaResult<Vec<Principal>>> + Send;
}

// ---------------------------------------------------------------------------
// Units & residents
// ---------------------------------------------------------------------------

pub trait UnitRepository: Send + Sync {
    fn create(&self, input: CreateUnit) -> impl Future<Output = VestaResult<Unit>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Unit>> + Send;
    fn get_by_number(&self, unit_number: &str)
    -> impl Future<Output = VestaResult<Unit>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUnit,
    ) -> impl Future<Output = VestaResult<Unit>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VestaResult<PaginatedResult<Unit>>> + Send;
    fn list_owned_by(&self, owner_id: Uuid)
    -> impl Future<Output = VestaResult<Vec<Unit>>> + Send;

    /// Soft-delete. Fails with `Conflict` while active residents exist.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = VestaResult<()>> + Send;

    /// Move the unit's owner in as the primary resident.
    ///
    /// Atomic: fails with `Conflict` when any active resident exists;
    /// otherwise creates the owner-resident row and sets the unit
    /// `OwnerOccupied` in one transaction.
    fn register_owner(
        &self,
        unit_id: Uuid,
        move_in: NaiveDate,
    ) -> impl Future<Output = VestaResult<(Unit, Resident)>> + Send;

    /// Hand the unit to a tenant.
    ///
    /// Atomic: fails with `Conflict` when the unit is already
    /// `Rented`; otherwise deactivates every active resident, creates
    /// the tenant row, and sets the unit `Rented` in one transaction.
    fn rent(
        &self,
        unit_id: Uuid,
        tenant_id: Uuid,
        move_in: NaiveDate,
        notes: Option<String>,
    ) -> impl Future<Output = VestaResult<(Unit, Resident)>> + Send;

    /// End the current tenancy.
    ///
    /// Atomic: fails with `Conflict` unless the unit is `Rented`;
    /// otherwise deactivates every active resident with `end_date` and
    /// sets the unit `Vacant`. Returns the unit and the number of
    /// residents deactivated.
    fn terminate_tenancy(
        &self,
        unit_id: Uuid,
        end_date: NaiveDate,
    ) -> impl Future<Output = VestaResult<(Unit, u64)>> + Send;

    /// Apply the vacancy cascade: set the unit `Vacant` when its
    /// status still equals `expected` and no active resident remains.
    ///
    /// Guarded compare-and-set in one transaction; returns whether the
    /// write happened. A `false` return means the unit had already
    /// moved on (new tenancy, surviving resident) and nothing changed.
    fn vacate_if_empty(
        &self,
        unit_id: Uuid,
        expected: OccupancyStatus,
    ) -> impl Future<Output = VestaResult<bool>> + Send;
}

pub trait ResidentRepository: Send + Sync {
    /// Add a resident to a unit (family member, authorized person, or
    /// an extra primary claim).
    ///
    /// Atomic invariant checks: fails with `Conflict` when
    /// `is_primary` is set and the unit already has an active primary
    /// resident, or when the type is `OwnerResident` and the principal
    /// is not the unit's owner.
    fn add(&self, input: CreateResident) -> impl Future<Output = VestaResult<Resident>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Resident>> + Send;
    fn list_for_unit(
        &self,
        unit_id: Uuid,
        active_only: bool,
    ) -> impl Future<Output = VestaResult<Vec<Resident>>> + Send;
    fn list_for_principal(
        &self,
        principal_id: Uuid,
    ) -> impl Future<Output = VestaResult<Vec<Resident>>> + Send;

    /// End one residency.
    ///
    /// Atomic: fails with `Conflict` when the row is already inactive;
    /// otherwise deactivates it with `end_date`. Returns the
    /// [`ResidencyEnded`] event carrying the remaining-active count —
    /// the unit-status cascade is applied separately by the caller.
    fn end_residency(
        &self,
        resident_id: Uuid,
        end_date: NaiveDate,
    ) -> impl Future<Output = VestaResult<ResidencyEnded>> + Send;
}

// ---------------------------------------------------------------------------
// Areas & reservations
// ---------------------------------------------------------------------------

pub trait AreaRepository: Send + Sync {
    fn create(&self, input: CreateArea) -> impl Future<Output = VestaResult<Area>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Area>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateArea,
    ) -> impl Future<Output = VestaResult<Area>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = VestaResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VestaResult<PaginatedResult<Area>>> + Send;
    fn list_available(&self) -> impl Future<Output = VestaResult<Vec<Area>>> + Send;
}

pub trait ReservationRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Reservation>> + Send;
    fn list_for_requester(
        &self,
        requester_id: Uuid,
    ) -> impl Future<Output = VestaResult<Vec<Reservation>>> + Send;
    fn list_for_area(
        &self,
        area_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = VestaResult<PaginatedResult<Reservation>>> + Send;

    /// Calendar-blocking reservations overlapping `[starts_at,
    /// ends_at)` on the area, ordered by start instant.
    fn list_overlapping(
        &self,
        area_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> impl Future<Output = VestaResult<Vec<Reservation>>> + Send;

    /// Insert a reservation with `total_cost` as computed by the
    /// caller.
    ///
    /// Atomic: re-checks area availability (`Unavailable`) and the
    /// half-open overlap invariant (`Conflict`) inside the insert
    /// transaction.
    fn create_checked(
        &self,
        input: CreateReservation,
        total_cost: Decimal,
    ) -> impl Future<Output = VestaResult<Reservation>> + Send;

    /// `Pending → Confirmed`; `InvalidTransition` otherwise.
    fn confirm(&self, id: Uuid) -> impl Future<Output = VestaResult<Reservation>> + Send;

    /// `Pending | Confirmed → Cancelled`; `InvalidTransition` from
    /// terminal states.
    fn cancel(&self, id: Uuid) -> impl Future<Output = VestaResult<Reservation>> + Send;

    /// `Confirmed → Completed`; `InvalidTransition` otherwise.
    fn complete(&self, id: Uuid) -> impl Future<Output = VestaResult<Reservation>> + Send;

    /// Flip the payment flag. No status-transition side effect.
    fn confirm_payment(&self, id: Uuid)
    -> impl Future<Output = VestaResult<Reservation>> + Send;

    /// Move a reservation to a new interval/area with the recomputed
    /// cost.
    ///
    /// Atomic: re-runs the overlap check excluding the reservation's
    /// own row; fails with `InvalidTransition` on terminal rows.
    fn reschedule_checked(
        &self,
        id: Uuid,
        area_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        total_cost: Decimal,
    ) -> impl Future<Output = VestaResult<Reservation>> + Send;
}

// ---------------------------------------------------------------------------
// Communication
// ---------------------------------------------------------------------------

pub trait AnnouncementRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAnnouncement,
    ) -> impl Future<Output = VestaResult<Announcement>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Announcement>> + Send;
    fn list_published(&self) -> impl Future<Output = VestaResult<Vec<Announcement>>> + Send;

    /// Fails with `Conflict` when already published.
    fn publish(&self, id: Uuid) -> impl Future<Output = VestaResult<Announcement>> + Send;

    /// Fails with `Conflict` when not currently published.
    fn unpublish(&self, id: Uuid) -> impl Future<Output = VestaResult<Announcement>> + Send;
}

pub trait NotificationRepository: Send + Sync {
    /// Insert one row per target. Deliberately not atomic with any
    /// triggering action: partial fan-out is acceptable.
    fn create_many(
        &self,
        inputs: Vec<CreateNotification>,
    ) -> impl Future<Output = VestaResult<u64>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Notification>> + Send;
    fn list_for_principal(
        &self,
        principal_id: Uuid,
        unread_only: bool,
    ) -> impl Future<Output = VestaResult<Vec<Notification>>> + Send;
    fn mark_read(&self, id: Uuid) -> impl Future<Output = VestaResult<Notification>> + Send;
    /// Returns the number of notifications flipped to read.
    fn mark_all_read(
        &self,
        principal_id: Uuid,
    ) -> impl Future<Output = VestaResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Finance
// ---------------------------------------------------------------------------

pub trait FeeRepository: Send + Sync {
    fn create(&self, input: CreateFee) -> impl Future<Output = VestaResult<Fee>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Fee>> + Send;
    fn list_for_unit(&self, unit_id: Uuid) -> impl Future<Output = VestaResult<Vec<Fee>>> + Send;

    /// Record a payment against a fee and mark the fee `Paid`.
    ///
    /// Atomic: fails with `Conflict` when the fee is already `Paid`.
    fn record_payment(
        &self,
        input: CreatePayment,
    ) -> impl Future<Output = VestaResult<(Fee, Payment)>> + Send;

    /// Fails with `Conflict` when the payment is already verified.
    fn verify_payment(
        &self,
        payment_id: Uuid,
        verifier_id: Uuid,
    ) -> impl Future<Output = VestaResult<Payment>> + Send;

    fn list_payments(
        &self,
        fee_id: Uuid,
    ) -> impl Future<Output = VestaResult<Vec<Payment>>> + Send;

    /// Roll `Pending` fees past their due date to `Overdue`; returns
    /// the number updated.
    fn refresh_overdue(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = VestaResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Security records
// ---------------------------------------------------------------------------

pub trait CameraRepository: Send + Sync {
    fn create(&self, input: CreateCamera) -> impl Future<Output = VestaResult<Camera>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestaResult<Camera>> + Send;
    fn list_active(&self) -> impl Future<Output = VestaResult<Vec<Camera>>> + Send;
    fn set_active(
        &self,
        id: Uuid,
        is_active: bool,
    ) -> impl Future<Output = VestaResult<Camera>> + Send;
}

pub trait AccessLogRepository: Send + Sync {
    /// Append a new access entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAccessLog,
    ) -> impl Future<Output = VestaResult<AccessLog>> + Send;
    fn list_recent(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VestaResult<PaginatedResult<AccessLog>>> + Send;
    fn list_for_principal(
        &self,
        principal_id: Uuid,
    ) -> impl Future<Output = VestaResult<Vec<AccessLog>>> + Send;
}

pub trait SecurityIncidentRepository: Send + Sync {
    fn create(
        &self,
        input: CreateSecurityIncident,
    ) -> impl Future<Output = VestaResult<SecurityIncident>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = VestaResult<SecurityIncident>> + Send;
    fn list_open(&self) -> impl Future<Output = VestaResult<Vec<SecurityIncident>>> + Send;

    /// Fails with `Conflict` when already resolved.
    fn resolve(
        &self,
        id: Uuid,
        resolver_id: Uuid,
        notes: Option<String>,
    ) -> impl Future<Output = VestaResult<SecurityIncident>> + Send;
}
