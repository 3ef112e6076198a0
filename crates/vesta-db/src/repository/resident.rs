//! SurrealDB implementation of [`ResidentRepository`].
//!
//! Resident rows are never deleted; ending a residency flips the
//! `active` flag and stamps the move-out date inside a transaction so
//! the already-inactive check cannot race a concurrent end.

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::resident::{CreateResident, Resident, ResidencyEnded, ResidencyType};
use vesta_core::repository::ResidentRepository;

use crate::error::DbError;
use crate::repository::unit::parse_occupancy;
use crate::repository::{CountRow, date_to_string, parse_date, parse_date_opt, parse_uuid};

#[derive(Debug, SurrealValue)]
pub(crate) struct ResidentRow {
    record_id: String,
    principal_id: String,
    unit_id: String,
    residency_type: String,
    is_primary: bool,
    moved_in: String,
    moved_out: Option<String>,
    active: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn residency_type_to_str(t: ResidencyType) -> &'static str {
    match t {
        ResidencyType::OwnerResident => "OwnerResident",
        ResidencyType::Tenant => "Tenant",
        ResidencyType::Family => "Family",
        ResidencyType::Authorized => "Authorized",
    }
}

fn parse_residency_type(s: &str) -> Result<ResidencyType, DbError> {
    match s {
        "OwnerResident" => Ok(ResidencyType::OwnerResident),
        "Tenant" => Ok(ResidencyType::Tenant),
        "Family" => Ok(ResidencyType::Family),
        "Authorized" => Ok(ResidencyType::Authorized),
        other => Err(DbError::Decode(format!("unknown residency type: {other}"))),
    }
}

impl ResidentRow {
    fn try_into_resident(self) -> Result<Resident, DbError> {
        Ok(Resident {
            id: parse_uuid("resident.record_id", &self.record_id)?,
            principal_id: parse_uuid("resident.principal_id", &self.principal_id)?,
            unit_id: parse_uuid("resident.unit_id", &self.unit_id)?,
            residency_type: parse_residency_type(&self.residency_type)?,
            is_primary: self.is_primary,
            moved_in: parse_date("resident.moved_in", &self.moved_in)?,
            moved_out: parse_date_opt("resident.moved_out", self.moved_out.as_deref())?,
            active: self.active,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const RESIDENT_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// Fetch one resident row by id. Shared with the unit repository,
/// whose occupancy transitions create resident rows.
pub(crate) async fn fetch_resident<C: Connection>(
    db: &Surreal<C>,
    id: Uuid,
) -> Result<Resident, DbError> {
    let id_str = id.to_string();
    let mut result = db
        .query(format!(
            "SELECT {RESIDENT_PROJECTION} FROM type::record('resident', $id)"
        ))
        .bind(("id", id_str.clone()))
        .await?;

    let rows: Vec<ResidentRow> = result.take(0)?;
    let row = rows.into_iter().next().ok_or(DbError::NotFound {
        entity: "resident".into(),
        id: id_str,
    })?;
    row.try_into_resident()
}

/// SurrealDB implementation of the Resident repository.
#[derive(Clone)]
pub struct SurrealResidentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealResidentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ResidentRepository for SurrealResidentRepository<C> {
    async fn add(&self, input: CreateResident) -> VestaResult<Resident> {
        let id = Uuid::new_v4();

        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $unit = (SELECT * FROM ONLY type::record('unit', $unit_id)); \
                 IF $unit = NONE { THROW 'not_found: unit' }; \
                 IF $residency_type = 'OwnerResident' \
                     AND $unit.owner_id != $principal_id { \
                     THROW 'conflict: only the unit owner can be an \
owner-resident' \
                 }; \
                 IF $is_primary = true { \
                     LET $primaries = count((SELECT id FROM resident \
                         WHERE unit_id = $unit_id AND active = true \
                         AND is_primary = true)); \
                     IF $primaries > 0 { \
                         THROW 'conflict: unit already has a primary \
resident' \
                     }; \
                 }; \
                 CREATE type::record('resident', $id) SET \
                     principal_id = $principal_id, unit_id = $unit_id, \
                     residency_type = $residency_type, \
                     is_primary = $is_primary, moved_in = $moved_in, \
                     notes = $notes, active = true; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("principal_id", input.principal_id.to_string()))
            .bind(("residency_type", residency_type_to_str(input.residency_type)))
            .bind(("is_primary", input.is_primary))
            .bind(("moved_in", date_to_string(input.moved_in)))
            .bind(("notes", input.notes));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        Ok(fetch_resident(&self.db, id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Resident> {
        Ok(fetch_resident(&self.db, id).await?)
    }

    async fn list_for_unit(&self, unit_id: Uuid, active_only: bool) -> VestaResult<Vec<Resident>> {
        let filter = if active_only {
            "AND active = true"
        } else {
            ""
        };
        let mut result = self
            .db
            .query(format!(
                "SELECT {RESIDENT_PROJECTION} FROM resident \
                 WHERE unit_id = $unit_id {filter} \
                 ORDER BY is_primary DESC, created_at DESC"
            ))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResidentRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(ResidentRow::try_into_resident)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_for_principal(&self, principal_id: Uuid) -> VestaResult<Vec<Resident>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {RESIDENT_PROJECTION} FROM resident \
                 WHERE principal_id = $principal_id \
                 ORDER BY created_at DESC"
            ))
            .bind(("principal_id", principal_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ResidentRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(ResidentRow::try_into_resident)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn end_residency(
        &self,
        resident_id: Uuid,
        end_date: NaiveDate,
    ) -> VestaResult<ResidencyEnded> {
        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $res = (SELECT * FROM ONLY type::record('resident', $id)); \
                 IF $res = NONE { THROW 'not_found: resident' }; \
                 IF $res.active = false { \
                     THROW 'conflict: residency already ended' \
                 }; \
                 UPDATE type::record('resident', $id) SET \
                     active = false, moved_out = $end_date, \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", resident_id.to_string()))
            .bind(("end_date", date_to_string(end_date)));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        let resident = fetch_resident(&self.db, resident_id).await?;
        let unit_id = resident.unit_id;

        // Post-transition snapshot for the cascade decision. The
        // cascade applier re-validates before writing, so a stale
        // count here cannot corrupt the unit status.
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resident \
                 WHERE unit_id = $unit_id AND active = true GROUP ALL; \
                 SELECT occupancy_status FROM type::record('unit', $unit_id);",
            )
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let remaining_active = count_rows.first().map(|r| r.total).unwrap_or(0);

        #[derive(Debug, SurrealValue)]
        struct StatusRow {
            occupancy_status: String,
        }
        let status_rows: Vec<StatusRow> = result.take(1).map_err(DbError::from)?;
        let status_row = status_rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "unit".into(),
            id: unit_id.to_string(),
        })?;
        let unit_status = parse_occupancy(&status_row.occupancy_status)?;

        Ok(ResidencyEnded {
            resident,
            unit_id,
            unit_status,
            remaining_active,
        })
    }
}
