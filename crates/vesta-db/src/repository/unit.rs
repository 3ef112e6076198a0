//! SurrealDB implementation of [`UnitRepository`].
//!
//! The occupancy transitions (`register_owner`, `rent`,
//! `terminate_tenancy`, `vacate_if_empty`) run as single
//! `BEGIN TRANSACTION … COMMIT` queries: the status check-and-act and
//! the resident writes commit together, so two concurrent writers
//! cannot both pass a precondition before either commits. Violated
//! preconditions abort the transaction with a sentinel `THROW` that
//! the error layer translates back into the domain taxonomy.

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::resident::Resident;
use vesta_core::models::unit::{CreateUnit, OccupancyStatus, Unit, UpdateUnit};
use vesta_core::repository::{PaginatedResult, Pagination, UnitRepository};

use crate::error::DbError;
use crate::repository::resident::fetch_resident;
use crate::repository::{CountRow, date_to_string, parse_decimal, parse_uuid};

#[derive(Debug, SurrealValue)]
pub(crate) struct UnitRow {
    record_id: String,
    unit_number: String,
    owner_id: String,
    occupancy_status: String,
    floor: Option<i32>,
    area_m2: Option<String>,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_occupancy(s: &str) -> Result<OccupancyStatus, DbError> {
    match s {
        "OwnerOccupied" => Ok(OccupancyStatus::OwnerOccupied),
        "Rented" => Ok(OccupancyStatus::Rented),
        "Vacant" => Ok(OccupancyStatus::Vacant),
        other => Err(DbError::Decode(format!("unknown occupancy status: {other}"))),
    }
}

pub(crate) fn occupancy_to_str(s: OccupancyStatus) -> &'static str {
    match s {
        OccupancyStatus::OwnerOccupied => "OwnerOccupied",
        OccupancyStatus::Rented => "Rented",
        OccupancyStatus::Vacant => "Vacant",
    }
}

impl UnitRow {
    fn try_into_unit(self) -> Result<Unit, DbError> {
        Ok(Unit {
            id: parse_uuid("unit.record_id", &self.record_id)?,
            unit_number: self.unit_number,
            owner_id: parse_uuid("unit.owner_id", &self.owner_id)?,
            occupancy_status: parse_occupancy(&self.occupancy_status)?,
            floor: self.floor,
            area_m2: self
                .area_m2
                .as_deref()
                .map(|s| parse_decimal("unit.area_m2", s))
                .transpose()?,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            description: self.description,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const UNIT_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Unit repository.
#[derive(Clone)]
pub struct SurrealUnitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUnitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Unit, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {UNIT_PROJECTION} FROM type::record('unit', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<UnitRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "unit".into(),
            id: id_str,
        })?;
        row.try_into_unit()
    }
}

impl<C: Connection> UnitRepository for SurrealUnitRepository<C> {
    async fn create(&self, input: CreateUnit) -> VestaResult<Unit> {
        let id = Uuid::new_v4();

        let query = self
            .db
            .query(
                "CREATE type::record('unit', $id) SET \
                 unit_number = $unit_number, owner_id = $owner_id, \
                 occupancy_status = 'Vacant', floor = $floor, \
                 area_m2 = $area_m2, bedrooms = $bedrooms, \
                 bathrooms = $bathrooms, description = $description, \
                 active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("unit_number", input.unit_number))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("floor", input.floor))
            .bind(("area_m2", input.area_m2.map(|d| d.to_string())))
            .bind(("bedrooms", input.bedrooms))
            .bind(("bathrooms", input.bathrooms))
            .bind(("description", input.description));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Unit> {
        Ok(self.fetch(id).await?)
    }

    async fn get_by_number(&self, unit_number: &str) -> VestaResult<Unit> {
        let unit_number = unit_number.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {UNIT_PROJECTION} FROM unit \
                 WHERE unit_number = $unit_number"
            ))
            .bind(("unit_number", unit_number.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "unit".into(),
            id: unit_number,
        })?;
        Ok(row.try_into_unit()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUnit) -> VestaResult<Unit> {
        let mut sets = Vec::new();
        if input.owner_id.is_some() {
            sets.push("owner_id = $owner_id");
        }
        if input.floor.is_some() {
            sets.push("floor = $floor");
        }
        if input.area_m2.is_some() {
            sets.push("area_m2 = $area_m2");
        }
        if input.bedrooms.is_some() {
            sets.push("bedrooms = $bedrooms");
        }
        if input.bathrooms.is_some() {
            sets.push("bathrooms = $bathrooms");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('unit', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(owner_id) = input.owner_id {
            builder = builder.bind(("owner_id", owner_id.to_string()));
        }
        if let Some(floor) = input.floor {
            builder = builder.bind(("floor", floor));
        }
        if let Some(area_m2) = input.area_m2 {
            builder = builder.bind(("area_m2", area_m2.to_string()));
        }
        if let Some(bedrooms) = input.bedrooms {
            builder = builder.bind(("bedrooms", bedrooms));
        }
        if let Some(bathrooms) = input.bathrooms {
            builder = builder.bind(("bathrooms", bathrooms));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn list(&self, pagination: Pagination) -> VestaResult<PaginatedResult<Unit>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM unit GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT {UNIT_PROJECTION} FROM unit \
                 ORDER BY unit_number ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(UnitRow::try_into_unit)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_owned_by(&self, owner_id: Uuid) -> VestaResult<Vec<Unit>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {UNIT_PROJECTION} FROM unit \
                 WHERE owner_id = $owner_id ORDER BY unit_number ASC"
            ))
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(UnitRow::try_into_unit)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn deactivate(&self, id: Uuid) -> VestaResult<()> {
        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $unit = (SELECT * FROM ONLY type::record('unit', $id)); \
                 IF $unit = NONE { THROW 'not_found: unit' }; \
                 LET $n = count((SELECT id FROM resident \
                     WHERE unit_id = $id AND active = true)); \
                 IF $n > 0 { \
                     THROW 'conflict: unit still has active residents' \
                 }; \
                 UPDATE type::record('unit', $id) SET \
                     active = false, updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;
        Ok(())
    }

    async fn register_owner(
        &self,
        unit_id: Uuid,
        move_in: NaiveDate,
    ) -> VestaResult<(Unit, Resident)> {
        let resident_id = Uuid::new_v4();

        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $unit = (SELECT * FROM ONLY type::record('unit', $unit_id)); \
                 IF $unit = NONE { THROW 'not_found: unit' }; \
                 LET $n = count((SELECT id FROM resident \
                     WHERE unit_id = $unit_id AND active = true)); \
                 IF $n > 0 { \
                     THROW 'conflict: unit already has an active resident' \
                 }; \
                 CREATE type::record('resident', $resident_id) SET \
                     principal_id = $unit.owner_id, unit_id = $unit_id, \
                     residency_type = 'OwnerResident', is_primary = true, \
                     moved_in = $move_in, active = true; \
                 UPDATE type::record('unit', $unit_id) SET \
                     occupancy_status = 'OwnerOccupied', \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("resident_id", resident_id.to_string()))
            .bind(("move_in", date_to_string(move_in)));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        let unit = self.fetch(unit_id).await?;
        let resident = fetch_resident(&self.db, resident_id).await?;
        Ok((unit, resident))
    }

    async fn rent(
        &self,
        unit_id: Uuid,
        tenant_id: Uuid,
        move_in: NaiveDate,
        notes: Option<String>,
    ) -> VestaResult<(Unit, Resident)> {
        let resident_id = Uuid::new_v4();

        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $unit = (SELECT * FROM ONLY type::record('unit', $unit_id)); \
                 IF $unit = NONE { THROW 'not_found: unit' }; \
                 IF $unit.occupancy_status = 'Rented' { \
                     THROW 'conflict: unit is already rented; terminate \
the current tenancy first' \
                 }; \
                 UPDATE resident SET active = false, moved_out = $move_in, \
                     updated_at = time::now() \
                     WHERE unit_id = $unit_id AND active = true; \
                 CREATE type::record('resident', $resident_id) SET \
                     principal_id = $tenant_id, unit_id = $unit_id, \
                     residency_type = 'Tenant', is_primary = true, \
                     moved_in = $move_in, notes = $notes, active = true; \
                 UPDATE type::record('unit', $unit_id) SET \
                     occupancy_status = 'Rented', updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("resident_id", resident_id.to_string()))
            .bind(("move_in", date_to_string(move_in)))
            .bind(("notes", notes));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        let unit = self.fetch(unit_id).await?;
        let resident = fetch_resident(&self.db, resident_id).await?;
        Ok((unit, resident))
    }

    async fn terminate_tenancy(
        &self,
        unit_id: Uuid,
        end_date: NaiveDate,
    ) -> VestaResult<(Unit, u64)> {
        // Informational count; the transaction below deactivates
        // whatever is active at commit time.
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM resident \
                 WHERE unit_id = $unit_id AND active = true GROUP ALL",
            )
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let active = count_rows.first().map(|r| r.total).unwrap_or(0);

        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $unit = (SELECT * FROM ONLY type::record('unit', $unit_id)); \
                 IF $unit = NONE { THROW 'not_found: unit' }; \
                 IF $unit.occupancy_status != 'Rented' { \
                     THROW 'conflict: unit is not rented' \
                 }; \
                 UPDATE resident SET active = false, moved_out = $end_date, \
                     updated_at = time::now() \
                     WHERE unit_id = $unit_id AND active = true; \
                 UPDATE type::record('unit', $unit_id) SET \
                     occupancy_status = 'Vacant', updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("end_date", date_to_string(end_date)));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        let unit = self.fetch(unit_id).await?;
        Ok((unit, active))
    }

    async fn vacate_if_empty(
        &self,
        unit_id: Uuid,
        expected: OccupancyStatus,
    ) -> VestaResult<bool> {
        let query = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $unit = (SELECT * FROM ONLY type::record('unit', $unit_id)); \
                 IF $unit = NONE { THROW 'not_found: unit' }; \
                 LET $n = count((SELECT id FROM resident \
                     WHERE unit_id = $unit_id AND active = true)); \
                 IF $unit.occupancy_status = $expected AND $n = 0 { \
                     UPDATE type::record('unit', $unit_id) SET \
                         occupancy_status = 'Vacant', \
                         updated_at = time::now(); \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("expected", occupancy_to_str(expected)));

        let result = query.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        let unit = self.fetch(unit_id).await?;
        Ok(unit.occupancy_status == OccupancyStatus::Vacant
            && expected != OccupancyStatus::Vacant)
    }
}
