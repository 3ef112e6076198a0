//! Notification fan-out.
//!
//! Only the decision of *whom* to notify lives here; delivery is an
//! external transport. Fan-out creates one notification row per
//! target and is deliberately not atomic with whatever triggered it —
//! partial delivery is acceptable and not rolled back.

use tracing::info;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::notification::{
    Audience, CreateNotification, Notification, NotificationKind,
};
use vesta_core::models::principal::Principal;
use vesta_core::policy::{self, Action, ResourceClass};
use vesta_core::repository::{NotificationRepository, PrincipalRepository};

/// Resolve an audience to concrete recipient ids.
///
/// Pure filter over the known principals: inactive principals are
/// never targeted, and explicit id lists are intersected with the
/// active set rather than trusted blindly.
pub fn resolve_audience(audience: &Audience, principals: &[Principal]) -> Vec<Uuid> {
    match audience {
        Audience::Principals(ids) => principals
            .iter()
            .filter(|p| p.active && ids.contains(&p.id))
            .map(|p| p.id)
            .collect(),
        Audience::Role(role) => principals
            .iter()
            .filter(|p| p.active && p.role == *role)
            .map(|p| p.id)
            .collect(),
        Audience::AllActive => principals
            .iter()
            .filter(|p| p.active)
            .map(|p| p.id)
            .collect(),
    }
}

/// Notification service.
pub struct NotificationService<N: NotificationRepository, P: PrincipalRepository> {
    notifications: N,
    principals: P,
}

impl<N: NotificationRepository, P: PrincipalRepository> NotificationService<N, P> {
    pub fn new(notifications: N, principals: P) -> Self {
        Self {
            notifications,
            principals,
        }
    }

    /// Fan a notification out to an audience. Returns the number of
    /// rows created, which may be less than the audience size when
    /// individual inserts fail.
    pub async fn send_bulk(
        &self,
        principal: &Principal,
        audience: Audience,
        title: String,
        message: String,
        kind: NotificationKind,
        related_announcement_id: Option<Uuid>,
    ) -> VestaResult<u64> {
        policy::require(principal, Action::Create, ResourceClass::Notifications)?;

        let known = self.principals.list_active().await?;
        let targets = resolve_audience(&audience, &known);

        let inputs = targets
            .into_iter()
            .map(|principal_id| CreateNotification {
                principal_id,
                title: title.clone(),
                message: message.clone(),
                kind,
                related_announcement_id,
            })
            .collect::<Vec<_>>();

        let requested = inputs.len() as u64;
        let created = self.notifications.create_many(inputs).await?;
        info!(requested, created, "bulk notification fan-out");
        Ok(created)
    }

    /// Mark one notification read. Only its recipient (or an admin)
    /// may do so; repeated calls are harmless.
    pub async fn mark_read(&self, principal: &Principal, id: Uuid) -> VestaResult<Notification> {
        let notification = self.notifications.get_by_id(id).await?;
        policy::require_object(principal, Action::Update, &notification)?;
        self.notifications.mark_read(id).await
    }

    /// Mark the caller's whole inbox read; returns the count flipped.
    pub async fn mark_all_read(&self, principal: &Principal) -> VestaResult<u64> {
        policy::require(principal, Action::Update, ResourceClass::Notifications)?;
        self.notifications.mark_all_read(principal.id).await
    }

    /// The caller's notifications, optionally unread only.
    pub async fn my_notifications(
        &self,
        principal: &Principal,
        unread_only: bool,
    ) -> VestaResult<Vec<Notification>> {
        policy::require(principal, Action::Read, ResourceClass::Notifications)?;
        self.notifications
            .list_for_principal(principal.id, unread_only)
            .await
    }
}
