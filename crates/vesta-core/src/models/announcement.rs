//! Announcement domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementCategory {
    General,
    Maintenance,
    Security,
    Finance,
    Event,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    pub author_id: Uuid,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Pinned announcements sort to the top of listings.
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnnouncement {
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    pub author_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_pinned: bool,
}
