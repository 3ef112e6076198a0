//! Announcement publishing.

use tracing::info;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::announcement::{Announcement, CreateAnnouncement};
use vesta_core::models::principal::Principal;
use vesta_core::policy::{self, Action, ResourceClass};
use vesta_core::repository::AnnouncementRepository;

/// Announcement service. Creation and publication are gated to roles
/// holding `Create` on announcements (admin and security).
pub struct AnnouncementService<A: AnnouncementRepository> {
    announcements: A,
}

impl<A: AnnouncementRepository> AnnouncementService<A> {
    pub fn new(announcements: A) -> Self {
        Self { announcements }
    }

    /// Create an unpublished draft. The author is always the caller.
    pub async fn create(
        &self,
        principal: &Principal,
        input: CreateAnnouncement,
    ) -> VestaResult<Announcement> {
        policy::require(principal, Action::Create, ResourceClass::Announcements)?;

        let input = CreateAnnouncement {
            author_id: principal.id,
            ..input
        };
        self.announcements.create(input).await
    }

    /// Publish a draft. Fails with `Conflict` when already published.
    pub async fn publish(&self, principal: &Principal, id: Uuid) -> VestaResult<Announcement> {
        policy::require(principal, Action::Create, ResourceClass::Announcements)?;

        let announcement = self.announcements.publish(id).await?;
        info!(announcement = %announcement.id, title = %announcement.title, "announcement published");
        Ok(announcement)
    }

    /// Take a published announcement down. Fails with `Conflict` when
    /// it is not currently published.
    pub async fn unpublish(&self, principal: &Principal, id: Uuid) -> VestaResult<Announcement> {
        policy::require(principal, Action::Create, ResourceClass::Announcements)?;
        self.announcements.unpublish(id).await
    }

    /// Published announcements, pinned first.
    pub async fn published(&self, principal: &Principal) -> VestaResult<Vec<Announcement>> {
        policy::require(principal, Action::Read, ResourceClass::Announcements)?;
        self.announcements.list_published().await
    }
}
