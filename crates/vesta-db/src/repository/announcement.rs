//! SurrealDB implementation of [`AnnouncementRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::announcement::{Announcement, AnnouncementCategory, CreateAnnouncement};
use vesta_core::repository::AnnouncementRepository;

use crate::error::DbError;
use crate::repository::parse_uuid;

#[derive(Debug, SurrealValue)]
struct AnnouncementRow {
    record_id: String,
    title: String,
    content: String,
    category: String,
    author_id: String,
    is_published: bool,
    published_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    is_pinned: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_category(s: &str) -> Result<AnnouncementCategory, DbError> {
    match s {
        "General" => Ok(AnnouncementCategory::General),
        "Maintenance" => Ok(AnnouncementCategory::Maintenance),
        "Security" => Ok(AnnouncementCategory::Security),
        "Finance" => Ok(AnnouncementCategory::Finance),
        "Event" => Ok(AnnouncementCategory::Event),
        "Urgent" => Ok(AnnouncementCategory::Urgent),
        other => Err(DbError::Decode(format!(
            "unknown announcement category: {other}"
        ))),
    }
}

fn category_to_str(c: AnnouncementCategory) -> &'static str {
    match c {
        AnnouncementCategory::General => "General",
        AnnouncementCategory::Maintenance => "Maintenance",
        AnnouncementCategory::Security => "Security",
        AnnouncementCategory::Finance => "Finance",
        AnnouncementCategory::Event => "Event",
        AnnouncementCategory::Urgent => "Urgent",
    }
}

impl AnnouncementRow {
    fn try_into_announcement(self) -> Result<Announcement, DbError> {
        Ok(Announcement {
            id: parse_uuid("announcement.record_id", &self.record_id)?,
            title: self.title,
            content: self.content,
            category: parse_category(&self.category)?,
            author_id: parse_uuid("announcement.author_id", &self.author_id)?,
            is_published: self.is_published,
            published_at: self.published_at,
            expires_at: self.expires_at,
            is_pinned: self.is_pinned,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ANNOUNCEMENT_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Announcement repository.
#[derive(Clone)]
pub struct SurrealAnnouncementRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAnnouncementRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Announcement, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {ANNOUNCEMENT_PROJECTION} \
                 FROM type::record('announcement', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<AnnouncementRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "announcement".into(),
            id: id_str,
        })?;
        row.try_into_announcement()
    }
}

impl<C: Connection> AnnouncementRepository for SurrealAnnouncementRepository<C> {
    async fn create(&self, input: CreateAnnouncement) -> VestaResult<Announcement> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('announcement', $id) SET \
                 title = $title, content = $content, \
                 category = $category, author_id = $author_id, \
                 is_published = false, expires_at = $expires_at, \
                 is_pinned = $is_pinned",
            )
            .bind(("id", id.to_string()))
            .bind(("title", input.title))
            .bind(("content", input.content))
            .bind(("category", category_to_str(input.category)))
            .bind(("author_id", input.author_id.to_string()))
            .bind(("expires_at", input.expires_at))
            .bind(("is_pinned", input.is_pinned))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Announcement> {
        Ok(self.fetch(id).await?)
    }

    async fn list_published(&self) -> VestaResult<Vec<Announcement>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {ANNOUNCEMENT_PROJECTION} FROM announcement \
                 WHERE is_published = true \
                 ORDER BY is_pinned DESC, created_at DESC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnnouncementRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(AnnouncementRow::try_into_announcement)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn publish(&self, id: Uuid) -> VestaResult<Announcement> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $a = (SELECT * FROM ONLY type::record('announcement', $id)); \
                 IF $a = NONE { THROW 'not_found: announcement' }; \
                 IF $a.is_published = true { \
                     THROW 'conflict: announcement is already published' \
                 }; \
                 UPDATE type::record('announcement', $id) SET \
                     is_published = true, published_at = time::now(), \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn unpublish(&self, id: Uuid) -> VestaResult<Announcement> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $a = (SELECT * FROM ONLY type::record('announcement', $id)); \
                 IF $a = NONE { THROW 'not_found: announcement' }; \
                 IF $a.is_published = false { \
                     THROW 'conflict: announcement is not published' \
                 }; \
                 UPDATE type::record('announcement', $id) SET \
                     is_published = false, published_at = NONE, \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }
}
