//! Occupancy state machine.
//!
//! Governs a unit's occupancy status and its set of active residents:
//! `Vacant → {OwnerOccupied, Rented}`, `OwnerOccupied → Vacant`,
//! `Rented → Vacant`. There is no direct `OwnerOccupied ↔ Rented`
//! edge — terminating a tenancy always lands on `Vacant`, and moving
//! the owner in afterwards is a second explicit action.
//!
//! The service checks policy, then delegates to the repository, whose
//! transitions run the precondition check and the writes in a single
//! store transaction.

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::principal::Principal;
use vesta_core::models::resident::{CreateResident, Resident, ResidencyEnded};
use vesta_core::models::unit::Unit;
use vesta_core::policy::{self, Action, ResourceClass};
use vesta_core::repository::{ResidentRepository, UnitRepository};

use crate::cascade;

/// Occupancy service.
///
/// Generic over repository implementations so the state machine has no
/// dependency on the database crate.
pub struct OccupancyService<U: UnitRepository, R: ResidentRepository> {
    units: U,
    residents: R,
}

impl<U: UnitRepository, R: ResidentRepository> OccupancyService<U, R> {
    pub fn new(units: U, residents: R) -> Self {
        Self { units, residents }
    }

    /// Move the unit's owner in as its primary resident.
    ///
    /// Fails with `Conflict` when the unit already has an active
    /// resident. On success the unit is `OwnerOccupied`.
    pub async fn register_owner_as_resident(
        &self,
        principal: &Principal,
        unit_id: Uuid,
        move_in: NaiveDate,
    ) -> VestaResult<(Unit, Resident)> {
        policy::require(principal, Action::Update, ResourceClass::Units)?;

        let (unit, resident) = self.units.register_owner(unit_id, move_in).await?;
        info!(unit = %unit.unit_number, "owner registered as resident");
        Ok((unit, resident))
    }

    /// Hand the unit to a tenant.
    ///
    /// Fails with `Conflict` when the unit is already `Rented` — the
    /// current tenancy must be terminated first. Any other active
    /// residents (owner, family) are deactivated as part of the same
    /// transaction.
    pub async fn rent_unit(
        &self,
        principal: &Principal,
        unit_id: Uuid,
        tenant_id: Uuid,
        move_in: NaiveDate,
        notes: Option<String>,
    ) -> VestaResult<(Unit, Resident)> {
        policy::require(principal, Action::Update, ResourceClass::Units)?;

        let (unit, resident) = self.units.rent(unit_id, tenant_id, move_in, notes).await?;
        info!(unit = %unit.unit_number, tenant = %tenant_id, "unit rented");
        Ok((unit, resident))
    }

    /// End the current tenancy, deactivating every active resident.
    ///
    /// Fails with `Conflict` unless the unit is `Rented`. Returns the
    /// vacated unit and the number of residents deactivated.
    pub async fn terminate_tenancy(
        &self,
        principal: &Principal,
        unit_id: Uuid,
        end_date: NaiveDate,
    ) -> VestaResult<(Unit, u64)> {
        policy::require(principal, Action::Update, ResourceClass::Units)?;

        let (unit, deactivated) = self.units.terminate_tenancy(unit_id, end_date).await?;
        info!(
            unit = %unit.unit_number,
            deactivated,
            "tenancy terminated"
        );
        Ok((unit, deactivated))
    }

    /// Add a resident to a unit (family member, authorized person).
    ///
    /// Fails with `Conflict` when a second primary resident is
    /// claimed, or when an owner-resident row names anyone but the
    /// unit's owner.
    pub async fn add_resident(
        &self,
        principal: &Principal,
        input: CreateResident,
    ) -> VestaResult<Resident> {
        policy::require(principal, Action::Create, ResourceClass::Residents)?;
        self.residents.add(input).await
    }

    /// End a single residency.
    ///
    /// Fails with `Conflict` when the residency is already inactive.
    /// When the ended resident was the sole active primary tenant, the
    /// vacancy cascade sets the unit `Vacant` (see [`cascade`]).
    pub async fn end_residency(
        &self,
        principal: &Principal,
        resident_id: Uuid,
        end_date: NaiveDate,
    ) -> VestaResult<ResidencyEnded> {
        policy::require(principal, Action::Update, ResourceClass::Residents)?;

        let event = self.residents.end_residency(resident_id, end_date).await?;

        if let Some(expected) = cascade::after_residency_end(&event) {
            let applied = self.units.vacate_if_empty(event.unit_id, expected).await?;
            if applied {
                info!(unit_id = %event.unit_id, "unit cascaded to vacant");
            }
        }

        Ok(event)
    }

    /// Active residents of a unit, primary first.
    pub async fn active_residents(
        &self,
        principal: &Principal,
        unit_id: Uuid,
    ) -> VestaResult<Vec<Resident>> {
        policy::require(principal, Action::Read, ResourceClass::Residents)?;
        self.residents.list_for_unit(unit_id, true).await
    }
}
