//! SurrealDB implementation of [`ReservationRepository`].
//!
//! `create_checked` and `reschedule_checked` run the half-open overlap
//! query inside the same transaction as the write, so two concurrent
//! bookings of the same slot cannot both pass the check. Status
//! transitions are guarded the same way.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::reservation::{CreateReservation, Reservation, ReservationStatus};
use vesta_core::repository::{PaginatedResult, Pagination, ReservationRepository};

use crate::error::DbError;
use crate::repository::{CountRow, parse_decimal, parse_uuid};

#[derive(Debug, SurrealValue)]
struct ReservationRow {
    record_id: String,
    area_id: String,
    requester_id: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: String,
    total_cost: String,
    payment_confirmed: bool,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<ReservationStatus, DbError> {
    match s {
        "Pending" => Ok(ReservationStatus::Pending),
        "Confirmed" => Ok(ReservationStatus::Confirmed),
        "Cancelled" => Ok(ReservationStatus::Cancelled),
        "Completed" => Ok(ReservationStatus::Completed),
        other => Err(DbError::Decode(format!(
            "unknown reservation status: {other}"
        ))),
    }
}

impl ReservationRow {
    fn try_into_reservation(self) -> Result<Reservation, DbError> {
        Ok(Reservation {
            id: parse_uuid("reservation.record_id", &self.record_id)?,
            area_id: parse_uuid("reservation.area_id", &self.area_id)?,
            requester_id: parse_uuid("reservation.requester_id", &self.requester_id)?,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            status: parse_status(&self.status)?,
            total_cost: parse_decimal("reservation.total_cost", &self.total_cost)?,
            payment_confirmed: self.payment_confirmed,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const RESERVATION_PROJECTION: &str = "meta::id(id) AS record_id, *";

/// SurrealDB implementation of the Reservation repository.
#[derive(Clone)]
pub struct SurrealReservationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealReservationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Reservation, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {RESERVATION_PROJECTION} \
                 FROM type::record('reservation', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<ReservationRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "reservation".into(),
            id: id_str,
        })?;
        row.try_into_reservation()
    }

    /// Guarded status transition: `guard` is a SurrealQL clause over
    /// `$r` that THROWs when the precondition fails.
    async fn transition(&self, id: Uuid, guard: &str, to: &str) -> Result<Reservation, DbError> {
        let query = format!(
            "BEGIN TRANSACTION; \
             LET $r = (SELECT * FROM ONLY type::record('reservation', $id)); \
             IF $r = NONE {{ THROW 'not_found: reservation' }}; \
             {guard}; \
             UPDATE type::record('reservation', $id) SET \
                 status = '{to}', updated_at = time::now(); \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .await?;
        result.check().map_err(DbError::from_query)?;

        self.fetch(id).await
    }
}

impl<C: Connection> ReservationRepository for SurrealReservationRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> VestaResult<Reservation> {
        Ok(self.fetch(id).await?)
    }

    async fn list_for_requester(&self, requester_id: Uuid) -> VestaResult<Vec<Reservation>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {RESERVATION_PROJECTION} FROM reservation \
                 WHERE requester_id = $requester_id \
                 ORDER BY starts_at DESC"
            ))
            .bind(("requester_id", requester_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(ReservationRow::try_into_reservation)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn list_for_area(
        &self,
        area_id: Uuid,
        pagination: Pagination,
    ) -> VestaResult<PaginatedResult<Reservation>> {
        let area_id_str = area_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM reservation \
                 WHERE area_id = $area_id GROUP ALL",
            )
            .bind(("area_id", area_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT {RESERVATION_PROJECTION} FROM reservation \
                 WHERE area_id = $area_id \
                 ORDER BY starts_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("area_id", area_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(ReservationRow::try_into_reservation)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_overlapping(
        &self,
        area_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> VestaResult<Vec<Reservation>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {RESERVATION_PROJECTION} FROM reservation \
                 WHERE area_id = $area_id \
                 AND status IN ['Pending', 'Confirmed'] \
                 AND starts_at < $ends_at AND ends_at > $starts_at \
                 ORDER BY starts_at ASC"
            ))
            .bind(("area_id", area_id.to_string()))
            .bind(("starts_at", starts_at))
            .bind(("ends_at", ends_at))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ReservationRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(ReservationRow::try_into_reservation)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn create_checked(
        &self,
        input: CreateReservation,
        total_cost: Decimal,
    ) -> VestaResult<Reservation> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $area = (SELECT * FROM ONLY type::record('area', $area_id)); \
                 IF $area = NONE { THROW 'not_found: area' }; \
                 IF $area.is_available = false { THROW 'unavailable: area' }; \
                 LET $clash = count((SELECT id FROM reservation \
                     WHERE area_id = $area_id \
                     AND status IN ['Pending', 'Confirmed'] \
                     AND starts_at < $ends_at AND ends_at > $starts_at)); \
                 IF $clash > 0 { \
                     THROW 'conflict: the area is already reserved in that \
interval' \
                 }; \
                 CREATE type::record('reservation', $id) SET \
                     area_id = $area_id, requester_id = $requester_id, \
                     starts_at = $starts_at, ends_at = $ends_at, \
                     status = 'Pending', total_cost = $total_cost, \
                     payment_confirmed = false, notes = $notes; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("area_id", input.area_id.to_string()))
            .bind(("requester_id", input.requester_id.to_string()))
            .bind(("starts_at", input.starts_at))
            .bind(("ends_at", input.ends_at))
            .bind(("total_cost", total_cost.to_string()))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn confirm(&self, id: Uuid) -> VestaResult<Reservation> {
        Ok(self
            .transition(
                id,
                "IF $r.status != 'Pending' { \
                     THROW 'invalid_transition: only pending reservations \
can be confirmed' \
                 }",
                "Confirmed",
            )
            .await?)
    }

    async fn cancel(&self, id: Uuid) -> VestaResult<Reservation> {
        Ok(self
            .transition(
                id,
                "IF $r.status IN ['Cancelled', 'Completed'] { \
                     THROW 'invalid_transition: reservation is already \
closed' \
                 }",
                "Cancelled",
            )
            .await?)
    }

    async fn complete(&self, id: Uuid) -> VestaResult<Reservation> {
        Ok(self
            .transition(
                id,
                "IF $r.status != 'Confirmed' { \
                     THROW 'invalid_transition: only confirmed reservations \
can be completed' \
                 }",
                "Completed",
            )
            .await?)
    }

    async fn confirm_payment(&self, id: Uuid) -> VestaResult<Reservation> {
        let result = self
            .db
            .query(
                "UPDATE type::record('reservation', $id) SET \
                 payment_confirmed = true, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        Ok(self.fetch(id).await?)
    }

    async fn reschedule_checked(
        &self,
        id: Uuid,
        area_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        total_cost: Decimal,
    ) -> VestaResult<Reservation> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $r = (SELECT * FROM ONLY type::record('reservation', $id)); \
                 IF $r = NONE { THROW 'not_found: reservation' }; \
                 IF $r.status IN ['Cancelled', 'Completed'] { \
                     THROW 'invalid_transition: closed reservations cannot \
be rescheduled' \
                 }; \
                 LET $area = (SELECT * FROM ONLY type::record('area', $area_id)); \
                 IF $area = NONE { THROW 'not_found: area' }; \
                 IF $area.is_available = false { THROW 'unavailable: area' }; \
                 LET $clash = count((SELECT id FROM reservation \
                     WHERE area_id = $area_id \
                     AND meta::id(id) != $id \
                     AND status IN ['Pending', 'Confirmed'] \
                     AND starts_at < $ends_at AND ends_at > $starts_at)); \
                 IF $clash > 0 { \
                     THROW 'conflict: the area is already reserved in that \
interval' \
                 }; \
                 UPDATE type::record('reservation', $id) SET \
                     area_id = $area_id, starts_at = $starts_at, \
                     ends_at = $ends_at, total_cost = $total_cost, \
                     updated_at = time::now(); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("area_id", area_id.to_string()))
            .bind(("starts_at", starts_at))
            .bind(("ends_at", ends_at))
            .bind(("total_cost", total_cost.to_string()))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }
}
