//! SurrealDB implementation of [`AreaRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::area::{Area, CreateArea, UpdateArea};
use vesta_core::repository::{AreaRepository, PaginatedResult, Pagination};

use crate::error::DbError;
use crate::repository::{CountRow, parse_decimal, parse_time, parse_uuid, time_to_string};

#[derive(Debug, SurrealValue)]
struct AreaRow {
    record_id: String,
    name: String,
    description: Option<String>,
    capacity: u32,
    hourly_rate: String,
    is_available: bool,
    opens_at: String,
    closes_at: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AreaRow {
    fn try_into_area(self) -> Result<Area, DbError> {
        Ok(Area {
            id: parse_uuid("area.record_id", &self.record_id)?,
            name: self.name,
            description: self.description,
            capacity: self.capacity,
            hourly_rate: parse_decimal("area.hourly_rate", &self.hourly_rate)?,
            is_available: self.is_available,
            opens_at: parse_time("area.opens_at", &self.opens_at)?,
            closes_at: parse_time("area.closes_at", &self.closes_at)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const AREA_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Area repository.
#[derive(Clone)]
pub struct SurrealAreaRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAreaRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Area, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {AREA_PROJECTION} FROM type::record('area', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<AreaRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "area".into(),
            id: id_str,
        })?;
        row.try_into_area()
    }
}

impl<C: Connection> AreaRepository for SurrealAreaRepository<C> {
    async fn create(&self, input: CreateArea) -> VestaResult<Area> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('area', $id) SET \
                 name = $name, description = $description, \
                 capacity = $capacity, hourly_rate = $hourly_rate, \
                 is_available = true, opens_at = $opens_at, \
                 closes_at = $closes_at",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("capacity", input.capacity))
            .bind(("hourly_rate", input.hourly_rate.to_string()))
            .bind(("opens_at", time_to_string(input.opens_at)))
            .bind(("closes_at", time_to_string(input.closes_at)))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Area> {
        Ok(self.fetch(id).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateArea) -> VestaResult<Area> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.capacity.is_some() {
            sets.push("capacity = $capacity");
        }
        if input.hourly_rate.is_some() {
            sets.push("hourly_rate = $hourly_rate");
        }
        if input.is_available.is_some() {
            sets.push("is_available = $is_available");
        }
        if input.opens_at.is_some() {
            sets.push("opens_at = $opens_at");
        }
        if input.closes_at.is_some() {
            sets.push("closes_at = $closes_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('area', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(capacity) = input.capacity {
            builder = builder.bind(("capacity", capacity));
        }
        if let Some(hourly_rate) = input.hourly_rate {
            builder = builder.bind(("hourly_rate", hourly_rate.to_string()));
        }
        if let Some(is_available) = input.is_available {
            builder = builder.bind(("is_available", is_available));
        }
        if let Some(opens_at) = input.opens_at {
            builder = builder.bind(("opens_at", time_to_string(opens_at)));
        }
        if let Some(closes_at) = input.closes_at {
            builder = builder.bind(("closes_at", time_to_string(closes_at)));
        }

        let result = builder.await.map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn delete(&self, id: Uuid) -> VestaResult<()> {
        self.db
            .query("DELETE type::record('area', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> VestaResult<PaginatedResult<Area>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM area GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT {AREA_PROJECTION} FROM area \
                 ORDER BY name ASC LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AreaRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AreaRow::try_into_area)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_available(&self) -> VestaResult<Vec<Area>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {AREA_PROJECTION} FROM area \
                 WHERE is_available = true ORDER BY name ASC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AreaRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(AreaRow::try_into_area)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
