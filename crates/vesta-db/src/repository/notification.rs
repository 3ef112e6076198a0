//! SurrealDB implementation of [`NotificationRepository`].
//!
//! Bulk fan-out inserts one row per target without a wrapping
//! transaction: a failed insert is logged and skipped, the rest of
//! the batch still lands.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::notification::{CreateNotification, Notification, NotificationKind};
use vesta_core::repository::NotificationRepository;

use crate::error::DbError;
use crate::repository::{parse_uuid, parse_uuid_opt};

#[derive(Debug, SurrealValue)]
struct NotificationRow {
    record_id: String,
    principal_id: String,
    title: String,
    message: String,
    kind: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    related_announcement_id: Option<String>,
    created_at: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<NotificationKind, DbError> {
    match s {
        "Info" => Ok(NotificationKind::Info),
        "Warning" => Ok(NotificationKind::Warning),
        "Alert" => Ok(NotificationKind::Alert),
        "Success" => Ok(NotificationKind::Success),
        "SecurityIncident" => Ok(NotificationKind::SecurityIncident),
        "UnauthorizedAccess" => Ok(NotificationKind::UnauthorizedAccess),
        "UnknownPerson" => Ok(NotificationKind::UnknownPerson),
        other => Err(DbError::Decode(format!(
            "unknown notification kind: {other}"
        ))),
    }
}

fn kind_to_str(k: NotificationKind) -> &'static str {
    match k {
        NotificationKind::Info => "Info",
        NotificationKind::Warning => "Warning",
        NotificationKind::Alert => "Alert",
        NotificationKind::Success => "Success",
        NotificationKind::SecurityIncident => "SecurityIncident",
        NotificationKind::UnauthorizedAccess => "UnauthorizedAccess",
        NotificationKind::UnknownPerson => "UnknownPerson",
    }
}

impl NotificationRow {
    fn try_into_notification(self) -> Result<Notification, DbError> {
        Ok(Notification {
            id: parse_uuid("notification.record_id", &self.record_id)?,
            principal_id: parse_uuid("notification.principal_id", &self.principal_id)?,
            title: self.title,
            message: self.message,
            kind: parse_kind(&self.kind)?,
            is_read: self.is_read,
            read_at: self.read_at,
            related_announcement_id: parse_uuid_opt(
                "notification.related_announcement_id",
                self.related_announcement_id.as_deref(),
            )?,
            created_at: self.created_at,
        })
    }
}

const NOTIFICATION_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Notification repository.
#[derive(Clone)]
pub struct SurrealNotificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Notification, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {NOTIFICATION_PROJECTION} \
                 FROM type::record('notification', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<NotificationRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "notification".into(),
            id: id_str,
        })?;
        row.try_into_notification()
    }

    async fn insert_one(&self, input: CreateNotification) -> Result<(), DbError> {
        let result = self
            .db
            .query(
                "CREATE notification SET \
                 principal_id = $principal_id, title = $title, \
                 message = $message, kind = $kind, is_read = false, \
                 related_announcement_id = $related_announcement_id",
            )
            .bind(("principal_id", input.principal_id.to_string()))
            .bind(("title", input.title))
            .bind(("message", input.message))
            .bind(("kind", kind_to_str(input.kind)))
            .bind((
                "related_announcement_id",
                input.related_announcement_id.map(|id| id.to_string()),
            ))
            .await?;
        result.check().map_err(DbError::from_query)?;
        Ok(())
    }
}

impl<C: Connection> NotificationRepository for SurrealNotificationRepository<C> {
    async fn create_many(&self, inputs: Vec<CreateNotification>) -> VestaResult<u64> {
        let mut created = 0u64;
        for input in inputs {
            let target = input.principal_id;
            match self.insert_one(input).await {
                Ok(()) => created += 1,
                Err(e) => {
                    warn!(principal_id = %target, error = %e, "notification insert failed");
                }
            }
        }
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Notification> {
        Ok(self.fetch(id).await?)
    }

    async fn list_for_principal(
        &self,
        principal_id: Uuid,
        unread_only: bool,
    ) -> VestaResult<Vec<Notification>> {
        let filter = if unread_only {
            "AND is_read = false"
        } else {
            ""
        };
        let mut result = self
            .db
            .query(format!(
                "SELECT {NOTIFICATION_PROJECTION} FROM notification \
                 WHERE principal_id = $principal_id {filter} \
                 ORDER BY created_at DESC"
            ))
            .bind(("principal_id", principal_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(NotificationRow::try_into_notification)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn mark_read(&self, id: Uuid) -> VestaResult<Notification> {
        let result = self
            .db
            .query(
                "UPDATE type::record('notification', $id) SET \
                 is_read = true, read_at = time::now() \
                 WHERE is_read = false",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        // Idempotent: re-reading an already-read notification is fine.
        Ok(self.fetch(id).await?)
    }

    async fn mark_all_read(&self, principal_id: Uuid) -> VestaResult<u64> {
        #[derive(Debug, SurrealValue)]
        struct IdRow {
            #[allow(dead_code)]
            record_id: String,
        }

        let mut result = self
            .db
            .query(
                "UPDATE notification SET is_read = true, \
                 read_at = time::now() \
                 WHERE principal_id = $principal_id AND is_read = false \
                 RETURN meta::id(id) AS record_id",
            )
            .bind(("principal_id", principal_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
