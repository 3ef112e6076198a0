//! Notification domain model and audience selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::principal::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Info,
    Warning,
    Alert,
    Success,
    SecurityIncident,
    UnauthorizedAccess,
    UnknownPerson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub principal_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub related_announcement_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub principal_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub related_announcement_id: Option<Uuid>,
}

/// Whom a bulk notification targets. Resolution to concrete recipient
/// ids is a pure decision; the delivery transport is external.
#[derive(Debug, Clone)]
pub enum Audience {
    /// Explicit recipient list.
    Principals(Vec<Uuid>),
    /// Every active principal holding the role.
    Role(Role),
    /// Every active principal.
    AllActive,
}
