//! SurrealDB repository implementations.

mod announcement;
mod area;
mod fee;
mod notification;
mod principal;
mod reservation;
mod resident;
mod security;
mod unit;

pub use announcement::SurrealAnnouncementRepository;
pub use area::SurrealAreaRepository;
pub use fee::SurrealFeeRepository;
pub use notification::SurrealNotificationRepository;
pub use principal::SurrealPrincipalRepository;
pub use reservation::SurrealReservationRepository;
pub use resident::SurrealResidentRepository;
pub use security::{
    SurrealAccessLogRepository, SurrealCameraRepository, SurrealSecurityIncidentRepository,
};
pub use unit::SurrealUnitRepository;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Stored date format (`YYYY-MM-DD`); sorts lexicographically.
const DATE_FMT: &str = "%Y-%m-%d";
/// Stored time-of-day format (`HH:MM`).
const TIME_FMT: &str = "%H:%M";

pub(crate) fn parse_uuid(field: &str, s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::Decode(format!("invalid UUID in {field}: {e}")))
}

pub(crate) fn parse_uuid_opt(field: &str, s: Option<&str>) -> Result<Option<Uuid>, DbError> {
    s.map(|s| parse_uuid(field, s)).transpose()
}

pub(crate) fn parse_date(field: &str, s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| DbError::Decode(format!("invalid date in {field}: {e}")))
}

pub(crate) fn parse_date_opt(field: &str, s: Option<&str>) -> Result<Option<NaiveDate>, DbError> {
    s.map(|s| parse_date(field, s)).transpose()
}

pub(crate) fn date_to_string(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub(crate) fn parse_time(field: &str, s: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|e| DbError::Decode(format!("invalid time in {field}: {e}")))
}

pub(crate) fn time_to_string(t: NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

pub(crate) fn parse_decimal(field: &str, s: &str) -> Result<Decimal, DbError> {
    s.parse::<Decimal>()
        .map_err(|e| DbError::Decode(format!("invalid amount in {field}: {e}")))
}

#[derive(Debug, surrealdb_types::SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
