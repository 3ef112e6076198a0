//! Integration tests for the reservation scheduler using in-memory
//! SurrealDB.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vesta_core::error::VestaError;
use vesta_core::models::area::CreateArea;
use vesta_core::models::principal::{Principal, Role};
use vesta_core::models::reservation::{CreateReservation, Reschedule, ReservationStatus};
use vesta_core::repository::AreaRepository;
use vesta_db::repository::{SurrealAreaRepository, SurrealReservationRepository};
use vesta_engine::ReservationService;

type Db = surrealdb::engine::local::Db;

fn principal(role: Role, name: &str) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        username: name.into(),
        role,
        active: true,
    }
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, hour, min, 0).unwrap()
}

fn booking(area_id: Uuid, requester: &Principal, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateReservation {
    CreateReservation {
        area_id,
        requester_id: requester.id,
        starts_at: start,
        ends_at: end,
        notes: None,
    }
}

/// Spin up in-memory DB, run migrations, create the "Grill" area at
/// 10.00/hour.
async fn setup() -> (
    ReservationService<SurrealAreaRepository<Db>, SurrealReservationRepository<Db>>,
    Uuid,      // area id
    Principal, // admin
    Principal, // resident alice
    Principal, // resident bob
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vesta_db::run_migrations(&db).await.unwrap();

    let area_repo = SurrealAreaRepository::new(db.clone());
    let area = area_repo
        .create(CreateArea {
            name: "Grill".into(),
            description: None,
            capacity: 12,
            hourly_rate: Decimal::from(10),
            opens_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    let svc = ReservationService::new(
        SurrealAreaRepository::new(db.clone()),
        SurrealReservationRepository::new(db.clone()),
    );

    (
        svc,
        area.id,
        principal(Role::Admin, "admin"),
        principal(Role::Resident, "alice"),
        principal(Role::Resident, "bob"),
    )
}

#[tokio::test]
async fn back_to_back_reservations_do_not_conflict() {
    let (svc, area_id, _, alice, bob) = setup().await;

    svc.create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    // Starts exactly when the first ends: half-open intervals.
    svc.create(&bob, booking(area_id, &bob, at(11, 0), at(12, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn overlapping_reservation_conflicts() {
    let (svc, area_id, _, alice, bob) = setup().await;

    svc.create(&alice, booking(area_id, &alice, at(10, 0), at(11, 30)))
        .await
        .unwrap();

    let err = svc
        .create(&bob, booking(area_id, &bob, at(11, 0), at(12, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn confirmed_reservation_still_blocks_slot() {
    let (svc, area_id, admin, alice, bob) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 30)))
        .await
        .unwrap();
    svc.confirm(&admin, r.id).await.unwrap();

    let err = svc
        .create(&bob, booking(area_id, &bob, at(11, 0), at(12, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }));
}

#[tokio::test]
async fn fractional_hours_cost_is_exact() {
    let (svc, area_id, _, alice, _) = setup().await;

    // 14:00–16:30 at 10.00/hour → 25.00 with no rounding loss.
    let r = svc
        .create(&alice, booking(area_id, &alice, at(14, 0), at(16, 30)))
        .await
        .unwrap();
    assert_eq!(r.total_cost, Decimal::new(2500, 2));
    assert_eq!(r.status, ReservationStatus::Pending);
    assert!(!r.payment_confirmed);
}

#[tokio::test]
async fn invalid_range_is_rejected() {
    let (svc, area_id, _, alice, _) = setup().await;

    let err = svc
        .create(&alice, booking(area_id, &alice, at(11, 0), at(11, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::InvalidRange { .. }));

    let err = svc
        .create(&alice, booking(area_id, &alice, at(12, 0), at(11, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::InvalidRange { .. }));
}

#[tokio::test]
async fn disabled_area_is_unavailable() {
    let (svc, area_id, admin, alice, _) = setup().await;

    svc.set_area_availability(&admin, area_id, false)
        .await
        .unwrap();

    let err = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Unavailable { .. }), "got {err:?}");
}

#[tokio::test]
async fn maintenance_can_toggle_area_availability() {
    let (svc, area_id, _, alice, _) = setup().await;
    let worker = principal(Role::Maintenance, "worker");

    let area = svc
        .set_area_availability(&worker, area_id, false)
        .await
        .unwrap();
    assert!(!area.is_available);

    let err = svc
        .set_area_availability(&alice, area_id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));
}

#[tokio::test]
async fn cancel_is_terminal() {
    let (svc, area_id, _, alice, _) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();

    let cancelled = svc.cancel(&alice, r.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    // Second cancel fails; the first one's effect is unchanged.
    let err = svc.cancel(&alice, r.id).await.unwrap_err();
    assert!(
        matches!(err, VestaError::InvalidTransition { .. }),
        "got {err:?}"
    );
    let again = svc.my_reservations(&alice).await.unwrap();
    assert_eq!(again[0].status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn status_machine_happy_path() {
    let (svc, area_id, admin, alice, _) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();

    let confirmed = svc.confirm(&admin, r.id).await.unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    // Confirming twice is an invalid transition.
    let err = svc.confirm(&admin, r.id).await.unwrap_err();
    assert!(matches!(err, VestaError::InvalidTransition { .. }));

    let completed = svc.complete(&admin, r.id).await.unwrap();
    assert_eq!(completed.status, ReservationStatus::Completed);

    // Completed is terminal: no cancel, no reopen.
    let err = svc.cancel(&admin, r.id).await.unwrap_err();
    assert!(matches!(err, VestaError::InvalidTransition { .. }));
}

#[tokio::test]
async fn payment_confirmation_is_orthogonal_to_status() {
    let (svc, area_id, admin, alice, _) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();

    let paid = svc.confirm_payment(&admin, r.id).await.unwrap();
    assert!(paid.payment_confirmed);
    assert_eq!(paid.status, ReservationStatus::Pending);

    // And a confirmed reservation can still be unpaid.
    let r2 = svc
        .create(&alice, booking(area_id, &alice, at(12, 0), at(13, 0)))
        .await
        .unwrap();
    let confirmed = svc.confirm(&admin, r2.id).await.unwrap();
    assert!(!confirmed.payment_confirmed);
}

#[tokio::test]
async fn resident_books_for_self_only() {
    let (svc, area_id, _, alice, bob) = setup().await;

    let err = svc
        .create(&alice, booking(area_id, &bob, at(10, 0), at(11, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }), "got {err:?}");
}

#[tokio::test]
async fn admin_books_on_behalf_of_residents() {
    let (svc, area_id, admin, alice, _) = setup().await;

    let r = svc
        .create(&admin, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    assert_eq!(r.requester_id, alice.id);
}

#[tokio::test]
async fn only_admin_confirms() {
    let (svc, area_id, _, alice, _) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();

    let err = svc.confirm(&alice, r.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));

    let guard = principal(Role::Security, "guard");
    let err = svc.confirm(&guard, r.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));
}

#[tokio::test]
async fn strangers_cannot_cancel_others_reservations() {
    let (svc, area_id, admin, alice, bob) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();

    let err = svc.cancel(&bob, r.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));

    // Admin may.
    let cancelled = svc.cancel(&admin, r.id).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
}

#[tokio::test]
async fn cancelled_reservation_frees_the_slot() {
    let (svc, area_id, _, alice, bob) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    svc.cancel(&alice, r.id).await.unwrap();

    // Same interval is bookable again.
    svc.create(&bob, booking(area_id, &bob, at(10, 0), at(11, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn reschedule_excludes_own_interval_and_recomputes_cost() {
    let (svc, area_id, _, alice, _) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    assert_eq!(r.total_cost, Decimal::from(10));

    // Sliding within the original slot would self-conflict if the
    // check did not exclude the reservation's own row.
    let moved = svc
        .reschedule(
            &alice,
            r.id,
            Reschedule {
                starts_at: Some(at(10, 30)),
                ends_at: Some(at(12, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.starts_at, at(10, 30));
    assert_eq!(moved.ends_at, at(12, 0));
    assert_eq!(moved.total_cost, Decimal::from(15));
}

#[tokio::test]
async fn reschedule_onto_busy_slot_conflicts() {
    let (svc, area_id, _, alice, bob) = setup().await;

    svc.create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    let r = svc
        .create(&bob, booking(area_id, &bob, at(12, 0), at(13, 0)))
        .await
        .unwrap();

    let err = svc
        .reschedule(
            &bob,
            r.id,
            Reschedule {
                starts_at: Some(at(10, 30)),
                ends_at: Some(at(11, 30)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn reschedule_of_closed_reservation_is_rejected() {
    let (svc, area_id, _, alice, _) = setup().await;

    let r = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    svc.cancel(&alice, r.id).await.unwrap();

    let err = svc
        .reschedule(
            &alice,
            r.id,
            Reschedule {
                starts_at: Some(at(14, 0)),
                ends_at: Some(at(15, 0)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::InvalidTransition { .. }));
}

#[tokio::test]
async fn list_conflicts_returns_overlaps_in_order() {
    let (svc, area_id, _, alice, bob) = setup().await;

    let r1 = svc
        .create(&alice, booking(area_id, &alice, at(10, 0), at(11, 0)))
        .await
        .unwrap();
    let r2 = svc
        .create(&bob, booking(area_id, &bob, at(12, 0), at(13, 0)))
        .await
        .unwrap();
    // A cancelled booking no longer blocks the calendar.
    let r3 = svc
        .create(&alice, booking(area_id, &alice, at(14, 0), at(15, 0)))
        .await
        .unwrap();
    svc.cancel(&alice, r3.id).await.unwrap();

    let (area, conflicts) = svc
        .list_conflicts(&alice, area_id, at(9, 0), at(16, 0))
        .await
        .unwrap();
    assert_eq!(area.id, area_id);
    assert_eq!(
        conflicts.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![r1.id, r2.id]
    );

    let (_, none) = svc
        .list_conflicts(&alice, area_id, at(16, 0), at(18, 0))
        .await
        .unwrap();
    assert!(none.is_empty());
}
