//! SurrealDB implementations of the security repositories: cameras,
//! the append-only access log, and incidents.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vesta_core::error::VestaResult;
use vesta_core::models::security::{
    AccessLog, AccessType, Camera, CameraType, CreateAccessLog, CreateCamera,
    CreateSecurityIncident, DetectionMethod, IncidentSeverity, IncidentType, SecurityIncident,
};
use vesta_core::repository::{
    AccessLogRepository, CameraRepository, PaginatedResult, Pagination,
    SecurityIncidentRepository,
};

use crate::error::DbError;
use crate::repository::{CountRow, parse_uuid, parse_uuid_opt};

const PROJECTION: &str = "meta::id(id) AS record_id, *";

// ---------------------------------------------------------------------------
// Cameras
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct CameraRow {
    record_id: String,
    name: String,
    location: String,
    camera_type: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_camera_type(s: &str) -> Result<CameraType, DbError> {
    match s {
        "Entrance" => Ok(CameraType::Entrance),
        "Exit" => Ok(CameraType::Exit),
        "Parking" => Ok(CameraType::Parking),
        "CommonArea" => Ok(CameraType::CommonArea),
        "Restricted" => Ok(CameraType::Restricted),
        other => Err(DbError::Decode(format!("unknown camera type: {other}"))),
    }
}

fn camera_type_to_str(t: CameraType) -> &'static str {
    match t {
        CameraType::Entrance => "Entrance",
        CameraType::Exit => "Exit",
        CameraType::Parking => "Parking",
        CameraType::CommonArea => "CommonArea",
        CameraType::Restricted => "Restricted",
    }
}

impl CameraRow {
    fn try_into_camera(self) -> Result<Camera, DbError> {
        Ok(Camera {
            id: parse_uuid("camera.record_id", &self.record_id)?,
            name: self.name,
            location: self.location,
            camera_type: parse_camera_type(&self.camera_type)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Camera repository.
#[derive(Clone)]
pub struct SurrealCameraRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCameraRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<Camera, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM type::record('camera', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<CameraRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "camera".into(),
            id: id_str,
        })?;
        row.try_into_camera()
    }
}

impl<C: Connection> CameraRepository for SurrealCameraRepository<C> {
    async fn create(&self, input: CreateCamera) -> VestaResult<Camera> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('camera', $id) SET \
                 name = $name, location = $location, \
                 camera_type = $camera_type, is_active = true",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("location", input.location))
            .bind(("camera_type", camera_type_to_str(input.camera_type)))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<Camera> {
        Ok(self.fetch(id).await?)
    }

    async fn list_active(&self) -> VestaResult<Vec<Camera>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM camera \
                 WHERE is_active = true ORDER BY name ASC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CameraRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(CameraRow::try_into_camera)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> VestaResult<Camera> {
        let result = self
            .db
            .query(
                "UPDATE type::record('camera', $id) SET \
                 is_active = $is_active, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("is_active", is_active))
            .await
            .map_err(DbError::from)?;
        result.check().map_err(DbError::from_query)?;

        Ok(self.fetch(id).await?)
    }
}

// ---------------------------------------------------------------------------
// Access log (append-only)
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct AccessLogRow {
    record_id: String,
    camera_id: Option<String>,
    access_type: String,
    detection_method: String,
    plate_detected: Option<String>,
    is_resident: bool,
    principal_id: Option<String>,
    visitor_name: Option<String>,
    notes: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_access_type(s: &str) -> Result<AccessType, DbError> {
    match s {
        "Entry" => Ok(AccessType::Entry),
        "Exit" => Ok(AccessType::Exit),
        other => Err(DbError::Decode(format!("unknown access type: {other}"))),
    }
}

fn access_type_to_str(t: AccessType) -> &'static str {
    match t {
        AccessType::Entry => "Entry",
        AccessType::Exit => "Exit",
    }
}

fn parse_detection(s: &str) -> Result<DetectionMethod, DbError> {
    match s {
        "Facial" => Ok(DetectionMethod::Facial),
        "Manual" => Ok(DetectionMethod::Manual),
        "Card" => Ok(DetectionMethod::Card),
        "Plate" => Ok(DetectionMethod::Plate),
        other => Err(DbError::Decode(format!(
            "unknown detection method: {other}"
        ))),
    }
}

fn detection_to_str(d: DetectionMethod) -> &'static str {
    match d {
        DetectionMethod::Facial => "Facial",
        DetectionMethod::Manual => "Manual",
        DetectionMethod::Card => "Card",
        DetectionMethod::Plate => "Plate",
    }
}

impl AccessLogRow {
    fn try_into_log(self) -> Result<AccessLog, DbError> {
        Ok(AccessLog {
            id: parse_uuid("access_log.record_id", &self.record_id)?,
            camera_id: parse_uuid_opt("access_log.camera_id", self.camera_id.as_deref())?,
            access_type: parse_access_type(&self.access_type)?,
            detection_method: parse_detection(&self.detection_method)?,
            plate_detected: self.plate_detected,
            is_resident: self.is_resident,
            principal_id: parse_uuid_opt("access_log.principal_id", self.principal_id.as_deref())?,
            visitor_name: self.visitor_name,
            notes: self.notes,
            timestamp: self.timestamp,
        })
    }
}

/// SurrealDB implementation of the AccessLog repository.
#[derive(Clone)]
pub struct SurrealAccessLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccessLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AccessLogRepository for SurrealAccessLogRepository<C> {
    async fn append(&self, input: CreateAccessLog) -> VestaResult<AccessLog> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('access_log', $id) SET \
                 camera_id = $camera_id, access_type = $access_type, \
                 detection_method = $detection_method, \
                 plate_detected = $plate_detected, \
                 is_resident = $is_resident, \
                 principal_id = $principal_id, \
                 visitor_name = $visitor_name, notes = $notes",
            )
            .bind(("id", id.to_string()))
            .bind(("camera_id", input.camera_id.map(|c| c.to_string())))
            .bind(("access_type", access_type_to_str(input.access_type)))
            .bind((
                "detection_method",
                detection_to_str(input.detection_method),
            ))
            .bind(("plate_detected", input.plate_detected))
            .bind(("is_resident", input.is_resident))
            .bind(("principal_id", input.principal_id.map(|p| p.to_string())))
            .bind(("visitor_name", input.visitor_name))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;

        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM type::record('access_log', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessLogRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "access_log".into(),
            id: id_str,
        })?;
        Ok(row.try_into_log()?)
    }

    async fn list_recent(&self, pagination: Pagination) -> VestaResult<PaginatedResult<AccessLog>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM access_log GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM access_log \
                 ORDER BY timestamp DESC LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessLogRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(AccessLogRow::try_into_log)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_for_principal(&self, principal_id: Uuid) -> VestaResult<Vec<AccessLog>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM access_log \
                 WHERE principal_id = $principal_id \
                 ORDER BY timestamp DESC"
            ))
            .bind(("principal_id", principal_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessLogRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(AccessLogRow::try_into_log)
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}

// ---------------------------------------------------------------------------
// Incidents
// ---------------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct IncidentRow {
    record_id: String,
    camera_id: Option<String>,
    incident_type: String,
    description: String,
    severity: String,
    resolved: bool,
    resolved_by: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    resolution_notes: Option<String>,
    timestamp: DateTime<Utc>,
}

fn parse_incident_type(s: &str) -> Result<IncidentType, DbError> {
    match s {
        "UnauthorizedAccess" => Ok(IncidentType::UnauthorizedAccess),
        "UnknownPerson" => Ok(IncidentType::UnknownPerson),
        "SuspiciousBehavior" => Ok(IncidentType::SuspiciousBehavior),
        "WrongParking" => Ok(IncidentType::WrongParking),
        "Other" => Ok(IncidentType::Other),
        other => Err(DbError::Decode(format!("unknown incident type: {other}"))),
    }
}

fn incident_type_to_str(t: IncidentType) -> &'static str {
    match t {
        IncidentType::UnauthorizedAccess => "UnauthorizedAccess",
        IncidentType::UnknownPerson => "UnknownPerson",
        IncidentType::SuspiciousBehavior => "SuspiciousBehavior",
        IncidentType::WrongParking => "WrongParking",
        IncidentType::Other => "Other",
    }
}

fn parse_severity(s: &str) -> Result<IncidentSeverity, DbError> {
    match s {
        "Low" => Ok(IncidentSeverity::Low),
        "Medium" => Ok(IncidentSeverity::Medium),
        "High" => Ok(IncidentSeverity::High),
        "Critical" => Ok(IncidentSeverity::Critical),
        other => Err(DbError::Decode(format!("unknown severity: {other}"))),
    }
}

fn severity_to_str(s: IncidentSeverity) -> &'static str {
    match s {
        IncidentSeverity::Low => "Low",
        IncidentSeverity::Medium => "Medium",
        IncidentSeverity::High => "High",
        IncidentSeverity::Critical => "Critical",
    }
}

impl IncidentRow {
    fn try_into_incident(self) -> Result<SecurityIncident, DbError> {
        Ok(SecurityIncident {
            id: parse_uuid("security_incident.record_id", &self.record_id)?,
            camera_id: parse_uuid_opt("security_incident.camera_id", self.camera_id.as_deref())?,
            incident_type: parse_incident_type(&self.incident_type)?,
            description: self.description,
            severity: parse_severity(&self.severity)?,
            resolved: self.resolved,
            resolved_by: parse_uuid_opt(
                "security_incident.resolved_by",
                self.resolved_by.as_deref(),
            )?,
            resolved_at: self.resolved_at,
            resolution_notes: self.resolution_notes,
            timestamp: self.timestamp,
        })
    }
}

/// SurrealDB implementation of the SecurityIncident repository.
#[derive(Clone)]
pub struct SurrealSecurityIncidentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSecurityIncidentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid) -> Result<SecurityIncident, DbError> {
        let id_str = id.to_string();
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM type::record('security_incident', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<IncidentRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or(DbError::NotFound {
            entity: "security_incident".into(),
            id: id_str,
        })?;
        row.try_into_incident()
    }
}

impl<C: Connection> SecurityIncidentRepository for SurrealSecurityIncidentRepository<C> {
    async fn create(&self, input: CreateSecurityIncident) -> VestaResult<SecurityIncident> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(
                "CREATE type::record('security_incident', $id) SET \
                 camera_id = $camera_id, incident_type = $incident_type, \
                 description = $description, severity = $severity, \
                 resolved = false",
            )
            .bind(("id", id.to_string()))
            .bind(("camera_id", input.camera_id.map(|c| c.to_string())))
            .bind(("incident_type", incident_type_to_str(input.incident_type)))
            .bind(("description", input.description))
            .bind(("severity", severity_to_str(input.severity)))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestaResult<SecurityIncident> {
        Ok(self.fetch(id).await?)
    }

    async fn list_open(&self) -> VestaResult<Vec<SecurityIncident>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {PROJECTION} FROM security_incident \
                 WHERE resolved = false ORDER BY timestamp DESC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<IncidentRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(IncidentRow::try_into_incident)
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn resolve(
        &self,
        id: Uuid,
        resolver_id: Uuid,
        notes: Option<String>,
    ) -> VestaResult<SecurityIncident> {
        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 LET $i = (SELECT * FROM ONLY type::record('security_incident', $id)); \
                 IF $i = NONE { THROW 'not_found: security_incident' }; \
                 IF $i.resolved = true { \
                     THROW 'conflict: incident is already resolved' \
                 }; \
                 UPDATE type::record('security_incident', $id) SET \
                     resolved = true, resolved_by = $resolver_id, \
                     resolved_at = time::now(), \
                     resolution_notes = $notes; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .bind(("resolver_id", resolver_id.to_string()))
            .bind(("notes", notes))
            .await
            .map_err(DbError::from)?;

        result.check().map_err(DbError::from_query)?;
        Ok(self.fetch(id).await?)
    }
}
