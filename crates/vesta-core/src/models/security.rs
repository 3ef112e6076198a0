//! Security domain models: cameras, access logs, incidents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraType {
    Entrance,
    Exit,
    Parking,
    CommonArea,
    Restricted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub camera_type: CameraType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCamera {
    pub name: String,
    pub location: String,
    pub camera_type: CameraType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    Entry,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    Facial,
    Manual,
    Card,
    Plate,
}

/// One gate event. Append-only: entries are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLog {
    pub id: Uuid,
    pub camera_id: Option<Uuid>,
    pub access_type: AccessType,
    pub detection_method: DetectionMethod,
    pub plate_detected: Option<String>,
    pub is_resident: bool,
    pub principal_id: Option<Uuid>,
    pub visitor_name: Option<String>,
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccessLog {
    pub camera_id: Option<Uuid>,
    pub access_type: AccessType,
    pub detection_method: DetectionMethod,
    pub plate_detected: Option<String>,
    pub is_resident: bool,
    pub principal_id: Option<Uuid>,
    pub visitor_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncidentType {
    UnauthorizedAccess,
    UnknownPerson,
    SuspiciousBehavior,
    WrongParking,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityIncident {
    pub id: Uuid,
    pub camera_id: Option<Uuid>,
    pub incident_type: IncidentType,
    pub description: String,
    pub severity: IncidentSeverity,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecurityIncident {
    pub camera_id: Option<Uuid>,
    pub incident_type: IncidentType,
    pub description: String,
    pub severity: IncidentSeverity,
}
