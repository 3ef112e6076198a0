//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs, dates, and money amounts are stored as strings (amounts in
//! decimal notation, dates as `YYYY-MM-DD`). Enums are stored as
//! strings with ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Principals (mirrored from the authentication collaborator; read-only
-- to the application)
-- =======================================================================
DEFINE TABLE principal SCHEMAFULL;
DEFINE FIELD username ON TABLE principal TYPE string;
DEFINE FIELD role ON TABLE principal TYPE string \
    ASSERT $value IN ['Admin', 'Resident', 'Security', 'Maintenance'];
DEFINE FIELD active ON TABLE principal TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE principal TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_principal_username ON TABLE principal \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Residential units
-- =======================================================================
DEFINE TABLE unit SCHEMAFULL;
DEFINE FIELD unit_number ON TABLE unit TYPE string;
DEFINE FIELD owner_id ON TABLE unit TYPE string;
DEFINE FIELD occupancy_status ON TABLE unit TYPE string \
    ASSERT $value IN ['OwnerOccupied', 'Rented', 'Vacant'];
DEFINE FIELD floor ON TABLE unit TYPE option<int>;
DEFINE FIELD area_m2 ON TABLE unit TYPE option<string>;
DEFINE FIELD bedrooms ON TABLE unit TYPE option<int>;
DEFINE FIELD bathrooms ON TABLE unit TYPE option<int>;
DEFINE FIELD description ON TABLE unit TYPE option<string>;
DEFINE FIELD active ON TABLE unit TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE unit TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE unit TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_unit_number ON TABLE unit COLUMNS unit_number UNIQUE;

-- =======================================================================
-- Residents (principal ↔ unit link; logically deleted only)
-- =======================================================================
DEFINE TABLE resident SCHEMAFULL;
DEFINE FIELD principal_id ON TABLE resident TYPE string;
DEFINE FIELD unit_id ON TABLE resident TYPE string;
DEFINE FIELD residency_type ON TABLE resident TYPE string \
    ASSERT $value IN ['OwnerResident', 'Tenant', 'Family', \
    'Authorized'];
DEFINE FIELD is_primary ON TABLE resident TYPE bool DEFAULT false;
DEFINE FIELD moved_in ON TABLE resident TYPE string;
DEFINE FIELD moved_out ON TABLE resident TYPE option<string>;
DEFINE FIELD active ON TABLE resident TYPE bool DEFAULT true;
DEFINE FIELD notes ON TABLE resident TYPE option<string>;
DEFINE FIELD created_at ON TABLE resident TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE resident TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_resident_unit_active ON TABLE resident \
    COLUMNS unit_id, active;
DEFINE INDEX idx_resident_principal ON TABLE resident \
    COLUMNS principal_id;

-- =======================================================================
-- Common areas
-- =======================================================================
DEFINE TABLE area SCHEMAFULL;
DEFINE FIELD name ON TABLE area TYPE string;
DEFINE FIELD description ON TABLE area TYPE option<string>;
DEFINE FIELD capacity ON TABLE area TYPE int;
DEFINE FIELD hourly_rate ON TABLE area TYPE string;
DEFINE FIELD is_available ON TABLE area TYPE bool DEFAULT true;
DEFINE FIELD opens_at ON TABLE area TYPE string;
DEFINE FIELD closes_at ON TABLE area TYPE string;
DEFINE FIELD created_at ON TABLE area TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE area TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_area_name ON TABLE area COLUMNS name UNIQUE;

-- =======================================================================
-- Reservations
-- =======================================================================
DEFINE TABLE reservation SCHEMAFULL;
DEFINE FIELD area_id ON TABLE reservation TYPE string;
DEFINE FIELD requester_id ON TABLE reservation TYPE string;
DEFINE FIELD starts_at ON TABLE reservation TYPE datetime;
DEFINE FIELD ends_at ON TABLE reservation TYPE datetime;
DEFINE FIELD status ON TABLE reservation TYPE string \
    ASSERT $value IN ['Pending', 'Confirmed', 'Cancelled', \
    'Completed'];
DEFINE FIELD total_cost ON TABLE reservation TYPE string;
DEFINE FIELD payment_confirmed ON TABLE reservation TYPE bool \
    DEFAULT false;
DEFINE FIELD notes ON TABLE reservation TYPE option<string>;
DEFINE FIELD created_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_reservation_area_status ON TABLE reservation \
    COLUMNS area_id, status;
DEFINE INDEX idx_reservation_requester ON TABLE reservation \
    COLUMNS requester_id;

-- =======================================================================
-- Announcements
-- =======================================================================
DEFINE TABLE announcement SCHEMAFULL;
DEFINE FIELD title ON TABLE announcement TYPE string;
DEFINE FIELD content ON TABLE announcement TYPE string;
DEFINE FIELD category ON TABLE announcement TYPE string \
    ASSERT $value IN ['General', 'Maintenance', 'Security', \
    'Finance', 'Event', 'Urgent'];
DEFINE FIELD author_id ON TABLE announcement TYPE string;
DEFINE FIELD is_published ON TABLE announcement TYPE bool \
    DEFAULT false;
DEFINE FIELD published_at ON TABLE announcement \
    TYPE option<datetime>;
DEFINE FIELD expires_at ON TABLE announcement TYPE option<datetime>;
DEFINE FIELD is_pinned ON TABLE announcement TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE announcement TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE announcement TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Notifications
-- =======================================================================
DEFINE TABLE notification SCHEMAFULL;
DEFINE FIELD principal_id ON TABLE notification TYPE string;
DEFINE FIELD title ON TABLE notification TYPE string;
DEFINE FIELD message ON TABLE notification TYPE string;
DEFINE FIELD kind ON TABLE notification TYPE string \
    ASSERT $value IN ['Info', 'Warning', 'Alert', 'Success', \
    'SecurityIncident', 'UnauthorizedAccess', 'UnknownPerson'];
DEFINE FIELD is_read ON TABLE notification TYPE bool DEFAULT false;
DEFINE FIELD read_at ON TABLE notification TYPE option<datetime>;
DEFINE FIELD related_announcement_id ON TABLE notification \
    TYPE option<string>;
DEFINE FIELD created_at ON TABLE notification TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_notification_principal_read ON TABLE notification \
    COLUMNS principal_id, is_read;

-- =======================================================================
-- Fees & payments
-- =======================================================================
DEFINE TABLE fee SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE fee TYPE string;
DEFINE FIELD title ON TABLE fee TYPE string;
DEFINE FIELD description ON TABLE fee TYPE option<string>;
DEFINE FIELD amount ON TABLE fee TYPE string;
DEFINE FIELD due_date ON TABLE fee TYPE string;
DEFINE FIELD status ON TABLE fee TYPE string \
    ASSERT $value IN ['Pending', 'Paid', 'Overdue'];
DEFINE FIELD created_at ON TABLE fee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE fee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_fee_unit_status ON TABLE fee \
    COLUMNS unit_id, status;

DEFINE TABLE payment SCHEMAFULL;
DEFINE FIELD fee_id ON TABLE payment TYPE string;
DEFINE FIELD amount ON TABLE payment TYPE string;
DEFINE FIELD method ON TABLE payment TYPE string \
    ASSERT $value IN ['Cash', 'Transfer', 'Card', 'Check'];
DEFINE FIELD verified ON TABLE payment TYPE bool DEFAULT false;
DEFINE FIELD verified_by ON TABLE payment TYPE option<string>;
DEFINE FIELD notes ON TABLE payment TYPE option<string>;
DEFINE FIELD paid_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_payment_fee ON TABLE payment COLUMNS fee_id;

-- =======================================================================
-- Security: cameras, access log (append-only), incidents
-- =======================================================================
DEFINE TABLE camera SCHEMAFULL;
DEFINE FIELD name ON TABLE camera TYPE string;
DEFINE FIELD location ON TABLE camera TYPE string;
DEFINE FIELD camera_type ON TABLE camera TYPE string \
    ASSERT $value IN ['Entrance', 'Exit', 'Parking', 'CommonArea', \
    'Restricted'];
DEFINE FIELD is_active ON TABLE camera TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE camera TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE camera TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE access_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD camera_id ON TABLE access_log TYPE option<string>;
DEFINE FIELD access_type ON TABLE access_log TYPE string \
    ASSERT $value IN ['Entry', 'Exit'];
DEFINE FIELD detection_method ON TABLE access_log TYPE string \
    ASSERT $value IN ['Facial', 'Manual', 'Card', 'Plate'];
DEFINE FIELD plate_detected ON TABLE access_log TYPE option<string>;
DEFINE FIELD is_resident ON TABLE access_log TYPE bool DEFAULT false;
DEFINE FIELD principal_id ON TABLE access_log TYPE option<string>;
DEFINE FIELD visitor_name ON TABLE access_log TYPE option<string>;
DEFINE FIELD notes ON TABLE access_log TYPE option<string>;
DEFINE FIELD timestamp ON TABLE access_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_log_time ON TABLE access_log \
    COLUMNS timestamp;
DEFINE INDEX idx_access_log_principal ON TABLE access_log \
    COLUMNS principal_id;

DEFINE TABLE security_incident SCHEMAFULL;
DEFINE FIELD camera_id ON TABLE security_incident \
    TYPE option<string>;
DEFINE FIELD incident_type ON TABLE security_incident TYPE string \
    ASSERT $value IN ['UnauthorizedAccess', 'UnknownPerson', \
    'SuspiciousBehavior', 'WrongParking', 'Other'];
DEFINE FIELD description ON TABLE security_incident TYPE string;
DEFINE FIELD severity ON TABLE security_incident TYPE string \
    ASSERT $value IN ['Low', 'Medium', 'High', 'Critical'];
DEFINE FIELD resolved ON TABLE security_incident TYPE bool \
    DEFAULT false;
DEFINE FIELD resolved_by ON TABLE security_incident \
    TYPE option<string>;
DEFINE FIELD resolved_at ON TABLE security_incident \
    TYPE option<datetime>;
DEFINE FIELD resolution_notes ON TABLE security_incident \
    TYPE option<string>;
DEFINE FIELD timestamp ON TABLE security_incident TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_incident_resolved ON TABLE security_incident \
    COLUMNS resolved;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
