//! Role-based policy engine.
//!
//! Pure decision functions: no I/O, no shared state, safe to call from
//! any number of concurrent callers. The capability table is a fixed
//! compile-time mapping from role to `(resource class, action, scope)`
//! capabilities; it is never mutated at runtime.
//!
//! Two granularities:
//! - [`authorize`] answers "may this role perform this action on this
//!   class of resource at all" and is consulted before any handler
//!   runs.
//! - [`authorize_object`] answers "may this caller touch this specific
//!   resource" via the resource's [`OwnershipRef`]; admins pass, every
//!   other caller must own the object.
//!
//! A deny is a normal return value, never an error. The
//! [`require`]/[`require_object`] helpers map denials onto the error
//! taxonomy for service-layer use.

use uuid::Uuid;

use crate::error::{VestaError, VestaResult};
use crate::models::announcement::Announcement;
use crate::models::notification::Notification;
use crate::models::principal::{Principal, Role};
use crate::models::reservation::Reservation;
use crate::models::resident::Resident;
use crate::models::unit::Unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceClass {
    Principals,
    Units,
    Residents,
    Areas,
    Reservations,
    Finance,
    Security,
    Announcements,
    Notifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

/// How far a granted capability reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any instance of the resource class.
    Any,
    /// Only instances the caller owns.
    Own,
}

/// What a listing endpoint should show the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    All,
    OwnOnly,
    Denied,
}

/// The fixed role capability table.
///
/// Returns the scope at which `role` may perform `action` on `class`,
/// or `None` when the capability is absent entirely.
pub fn capability(role: Role, class: ResourceClass, action: Action) -> Option<Scope> {
    use Action::{Create, Read, Update};
    use ResourceClass as C;
    use Scope::{Any, Own};

    match role {
        Role::Admin => Some(Any),

        Role::Security => match (class, action) {
            (C::Principals | C::Units | C::Residents, Read) => Some(Any),
            (C::Areas | C::Reservations, Read) => Some(Any),
            (C::Security, _) => Some(Any),
            (C::Announcements, Create | Read) => Some(Any),
            // Security staff raise alerts addressed to anyone but only
            // manage their own inbox.
            (C::Notifications, Create) => Some(Any),
            (C::Notifications, Read | Update) => Some(Own),
            _ => None,
        },

        Role::Maintenance => match (class, action) {
            (C::Principals | C::Units | C::Residents, Read) => Some(Any),
            (C::Areas, Read) => Some(Any),
            // Availability toggling while an area is serviced.
            (C::Areas, Update) => Some(Any),
            (C::Reservations, Read) => Some(Any),
            (C::Announcements, Read) => Some(Any),
            (C::Notifications, Read | Update) => Some(Own),
            _ => None,
        },

        Role::Resident => match (class, action) {
            (C::Principals, Read | Update) => Some(Own),
            (C::Units | C::Residents, Read) => Some(Own),
            (C::Areas, Read) => Some(Any),
            (C::Reservations, Read) => Some(Any),
            (C::Reservations, Create) => Some(Own),
            (C::Finance, Read) => Some(Own),
            (C::Announcements, Read) => Some(Any),
            (C::Notifications, Read | Update) => Some(Own),
            _ => None,
        },
    }
}

/// Coarse check: may this caller perform `action` on `class` at all?
///
/// `None` (no authenticated principal) and inactive principals are
/// always denied.
pub fn authorize(principal: Option<&Principal>, action: Action, class: ResourceClass) -> bool {
    match principal {
        Some(p) if p.active => capability(p.role, class, action).is_some(),
        _ => false,
    }
}

/// A resource that can name its owning principal.
///
/// Every ownership-checked resource type states its owner explicitly;
/// the fine-grained check calls this uniformly instead of probing for
/// field names.
pub trait OwnershipRef {
    fn owner_ref(&self) -> Option<Uuid>;
}

impl OwnershipRef for Unit {
    fn owner_ref(&self) -> Option<Uuid> {
        Some(self.owner_id)
    }
}

impl OwnershipRef for Reservation {
    fn owner_ref(&self) -> Option<Uuid> {
        Some(self.requester_id)
    }
}

impl OwnershipRef for Resident {
    fn owner_ref(&self) -> Option<Uuid> {
        Some(self.principal_id)
    }
}

impl OwnershipRef for Notification {
    fn owner_ref(&self) -> Option<Uuid> {
        Some(self.principal_id)
    }
}

impl OwnershipRef for Announcement {
    fn owner_ref(&self) -> Option<Uuid> {
        Some(self.author_id)
    }
}

// Self-or-admin: a principal owns itself.
impl OwnershipRef for Principal {
    fn owner_ref(&self) -> Option<Uuid> {
        Some(self.id)
    }
}

/// Fine-grained check: may this caller touch this specific resource?
///
/// Admins always may; anyone else must be the resource's owner. The
/// `action` is part of the contract but does not change the decision —
/// object-level reach is ownership, the coarse table governs verbs.
pub fn authorize_object(
    principal: Option<&Principal>,
    _action: Action,
    resource: &dyn OwnershipRef,
) -> bool {
    let Some(p) = principal else { return false };
    if !p.active {
        return false;
    }
    if p.role == Role::Admin {
        return true;
    }
    resource.owner_ref() == Some(p.id)
}

/// Visibility predicate for list-scoped reads of `class`.
pub fn visibility(principal: Option<&Principal>, class: ResourceClass) -> Visibility {
    let Some(p) = principal else {
        return Visibility::Denied;
    };
    if !p.active {
        return Visibility::Denied;
    }
    match capability(p.role, class, Action::Read) {
        Some(Scope::Any) => Visibility::All,
        Some(Scope::Own) => Visibility::OwnOnly,
        None => Visibility::Denied,
    }
}

/// [`authorize`] mapped onto the error taxonomy.
pub fn require(principal: &Principal, action: Action, class: ResourceClass) -> VestaResult<()> {
    if !principal.active {
        return Err(VestaError::Unauthorized);
    }
    if capability(principal.role, class, action).is_some() {
        Ok(())
    } else {
        Err(VestaError::forbidden(format!(
            "role {:?} may not {:?} {:?}",
            principal.role, action, class
        )))
    }
}

/// [`authorize_object`] mapped onto the error taxonomy.
pub fn require_object(
    principal: &Principal,
    action: Action,
    resource: &dyn OwnershipRef,
) -> VestaResult<()> {
    if !principal.active {
        return Err(VestaError::Unauthorized);
    }
    if authorize_object(Some(principal), action, resource) {
        Ok(())
    } else {
        Err(VestaError::forbidden(format!(
            "{:?} {} does not own the target resource",
            principal.role, principal.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            username: format!("{role:?}").to_lowercase(),
            role,
            active: true,
        }
    }

    fn unit(owner_id: Uuid) -> Unit {
        Unit {
            id: Uuid::new_v4(),
            unit_number: "101".into(),
            owner_id,
            occupancy_status: crate::models::unit::OccupancyStatus::Vacant,
            floor: Some(1),
            area_m2: Some(Decimal::from(80)),
            bedrooms: Some(2),
            bathrooms: Some(1),
            description: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_admin_deletes_units() {
        for role in [Role::Resident, Role::Security, Role::Maintenance] {
            let p = principal(role);
            assert!(
                !authorize(Some(&p), Action::Delete, ResourceClass::Units),
                "{role:?} must not delete units"
            );
        }
        let admin = principal(Role::Admin);
        assert!(authorize(Some(&admin), Action::Delete, ResourceClass::Units));
    }

    #[test]
    fn owner_may_update_own_unit_object() {
        let owner = principal(Role::Resident);
        let stranger = principal(Role::Resident);
        let u = unit(owner.id);

        assert!(authorize_object(Some(&owner), Action::Update, &u));
        assert!(!authorize_object(Some(&stranger), Action::Update, &u));
    }

    #[test]
    fn admin_passes_every_object_check() {
        let admin = principal(Role::Admin);
        let u = unit(Uuid::new_v4());
        assert!(authorize_object(Some(&admin), Action::Delete, &u));
    }

    #[test]
    fn missing_or_inactive_principal_is_denied() {
        assert!(!authorize(None, Action::Read, ResourceClass::Areas));

        let mut p = principal(Role::Admin);
        p.active = false;
        assert!(!authorize(Some(&p), Action::Read, ResourceClass::Areas));
        assert!(!authorize_object(Some(&p), Action::Read, &unit(p.id)));
        assert_eq!(
            visibility(Some(&p), ResourceClass::Units),
            Visibility::Denied
        );
    }

    #[test]
    fn security_has_no_finance_access() {
        let p = principal(Role::Security);
        for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
            assert!(!authorize(Some(&p), action, ResourceClass::Finance));
        }
    }

    #[test]
    fn maintenance_may_update_areas_but_not_reservations() {
        let p = principal(Role::Maintenance);
        assert!(authorize(Some(&p), Action::Update, ResourceClass::Areas));
        assert!(!authorize(
            Some(&p),
            Action::Update,
            ResourceClass::Reservations
        ));
    }

    #[test]
    fn resident_creates_reservations_at_own_scope() {
        assert_eq!(
            capability(Role::Resident, ResourceClass::Reservations, Action::Create),
            Some(Scope::Own)
        );
        assert_eq!(
            capability(Role::Security, ResourceClass::Reservations, Action::Create),
            None
        );
    }

    #[test]
    fn visibility_rows() {
        let resident = principal(Role::Resident);
        assert_eq!(
            visibility(Some(&resident), ResourceClass::Units),
            Visibility::OwnOnly
        );
        assert_eq!(
            visibility(Some(&resident), ResourceClass::Reservations),
            Visibility::All
        );
        assert_eq!(
            visibility(Some(&resident), ResourceClass::Security),
            Visibility::Denied
        );

        let security = principal(Role::Security);
        assert_eq!(
            visibility(Some(&security), ResourceClass::Units),
            Visibility::All
        );
    }

    #[test]
    fn require_maps_denials_to_taxonomy() {
        let resident = principal(Role::Resident);
        let err = require(&resident, Action::Delete, ResourceClass::Units).unwrap_err();
        assert!(matches!(err, VestaError::Forbidden { .. }));

        let mut inactive = principal(Role::Admin);
        inactive.active = false;
        let err = require(&inactive, Action::Read, ResourceClass::Units).unwrap_err();
        assert!(matches!(err, VestaError::Unauthorized));
    }
}
