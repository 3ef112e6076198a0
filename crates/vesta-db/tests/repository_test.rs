//! Repository-level tests against in-memory SurrealDB: uniqueness
//! constraints, the append-only access log, and incident resolution.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vesta_core::error::VestaError;
use vesta_core::models::security::{
    AccessType, CameraType, CreateAccessLog, CreateCamera, CreateSecurityIncident,
    DetectionMethod, IncidentSeverity, IncidentType,
};
use vesta_core::models::unit::CreateUnit;
use vesta_core::repository::{
    AccessLogRepository, CameraRepository, Pagination, PrincipalRepository,
    SecurityIncidentRepository, UnitRepository,
};
use vesta_db::repository::{
    SurrealAccessLogRepository, SurrealCameraRepository, SurrealPrincipalRepository,
    SurrealSecurityIncidentRepository, SurrealUnitRepository,
};

type Db = surrealdb::engine::local::Db;

async fn fresh_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vesta_db::run_migrations(&db).await.unwrap();
    db
}

fn new_unit(number: &str) -> CreateUnit {
    CreateUnit {
        unit_number: number.into(),
        owner_id: Uuid::new_v4(),
        floor: None,
        area_m2: None,
        bedrooms: None,
        bathrooms: None,
        description: None,
    }
}

#[tokio::test]
async fn duplicate_unit_numbers_conflict() {
    let db = fresh_db().await;
    let repo = SurrealUnitRepository::new(db);

    repo.create(new_unit("101")).await.unwrap();
    let err = repo.create(new_unit("101")).await.unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn unit_lookup_by_number_and_owner() {
    let db = fresh_db().await;
    let repo = SurrealUnitRepository::new(db);

    let created = repo.create(new_unit("B-7")).await.unwrap();
    let fetched = repo.get_by_number("B-7").await.unwrap();
    assert_eq!(fetched.id, created.id);

    let owned = repo.list_owned_by(created.owner_id).await.unwrap();
    assert_eq!(owned.len(), 1);

    let err = repo.get_by_number("Z-99").await.unwrap_err();
    assert!(matches!(err, VestaError::NotFound { .. }));
}

#[tokio::test]
async fn unit_listing_paginates() {
    let db = fresh_db().await;
    let repo = SurrealUnitRepository::new(db);

    for n in ["101", "102", "103"] {
        repo.create(new_unit(n)).await.unwrap();
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].unit_number, "101");

    let rest = repo
        .list(Pagination {
            offset: 2,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].unit_number, "103");
}

#[tokio::test]
async fn principal_repository_reads_mirrored_rows() {
    let db = fresh_db().await;
    let id = Uuid::new_v4();
    db.query(
        "CREATE type::record('principal', $id) SET \
         username = 'alice', role = 'Resident', active = true",
    )
    .bind(("id", id.to_string()))
    .await
    .unwrap()
    .check()
    .unwrap();

    let repo = SurrealPrincipalRepository::new(db);
    let p = repo.get_by_id(id).await.unwrap();
    assert_eq!(p.username, "alice");
    assert!(p.active);

    let active = repo.list_active().await.unwrap();
    assert_eq!(active.len(), 1);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, VestaError::NotFound { .. }));
}

#[tokio::test]
async fn access_log_appends_and_lists_newest_first() {
    let db = fresh_db().await;
    let cameras = SurrealCameraRepository::new(db.clone());
    let logs = SurrealAccessLogRepository::new(db);

    let camera = cameras
        .create(CreateCamera {
            name: "Gate".into(),
            location: "Main entrance".into(),
            camera_type: CameraType::Entrance,
        })
        .await
        .unwrap();

    let resident_id = Uuid::new_v4();
    logs.append(CreateAccessLog {
        camera_id: Some(camera.id),
        access_type: AccessType::Entry,
        detection_method: DetectionMethod::Plate,
        plate_detected: Some("ABC-123".into()),
        is_resident: true,
        principal_id: Some(resident_id),
        visitor_name: None,
        notes: None,
    })
    .await
    .unwrap();
    logs.append(CreateAccessLog {
        camera_id: Some(camera.id),
        access_type: AccessType::Exit,
        detection_method: DetectionMethod::Manual,
        plate_detected: None,
        is_resident: false,
        principal_id: None,
        visitor_name: Some("Courier".into()),
        notes: None,
    })
    .await
    .unwrap();

    let page = logs.list_recent(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);

    let mine = logs.list_for_principal(resident_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].plate_detected.as_deref(), Some("ABC-123"));
}

#[tokio::test]
async fn camera_availability_toggles() {
    let db = fresh_db().await;
    let cameras = SurrealCameraRepository::new(db);

    let camera = cameras
        .create(CreateCamera {
            name: "Pool".into(),
            location: "Pool deck".into(),
            camera_type: CameraType::CommonArea,
        })
        .await
        .unwrap();
    assert!(camera.is_active);
    assert_eq!(cameras.list_active().await.unwrap().len(), 1);

    let off = cameras.set_active(camera.id, false).await.unwrap();
    assert!(!off.is_active);
    assert!(cameras.list_active().await.unwrap().is_empty());
}

#[tokio::test]
async fn incident_resolution_is_single_shot() {
    let db = fresh_db().await;
    let incidents = SurrealSecurityIncidentRepository::new(db);

    let incident = incidents
        .create(CreateSecurityIncident {
            camera_id: None,
            incident_type: IncidentType::UnknownPerson,
            description: "Unknown person in the parking garage".into(),
            severity: IncidentSeverity::High,
        })
        .await
        .unwrap();
    assert!(!incident.resolved);
    assert_eq!(incidents.list_open().await.unwrap().len(), 1);

    let resolver = Uuid::new_v4();
    let resolved = incidents
        .resolve(incident.id, resolver, Some("Visitor of unit 204".into()))
        .await
        .unwrap();
    assert!(resolved.resolved);
    assert_eq!(resolved.resolved_by, Some(resolver));
    assert!(resolved.resolved_at.is_some());
    assert!(incidents.list_open().await.unwrap().is_empty());

    let err = incidents
        .resolve(incident.id, resolver, None)
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn active_residents_block_unit_deactivation() {
    let db = fresh_db().await;
    let repo = SurrealUnitRepository::new(db);

    let unit = repo.create(new_unit("101")).await.unwrap();
    repo.register_owner(unit.id, chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .await
        .unwrap();

    let err = repo.deactivate(unit.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");
}
