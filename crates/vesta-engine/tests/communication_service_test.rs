//! Integration tests for announcements, notification fan-out, and the
//! finance flows using in-memory SurrealDB.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vesta_core::error::VestaError;
use vesta_core::models::announcement::{AnnouncementCategory, CreateAnnouncement};
use vesta_core::models::fee::{CreateFee, CreatePayment, FeeStatus, PaymentMethod};
use vesta_core::models::notification::{Audience, NotificationKind};
use vesta_core::models::principal::{Principal, Role};
use vesta_core::models::unit::CreateUnit;
use vesta_core::repository::UnitRepository;
use vesta_db::repository::{
    SurrealAnnouncementRepository, SurrealFeeRepository, SurrealNotificationRepository,
    SurrealPrincipalRepository, SurrealUnitRepository,
};
use vesta_engine::{AnnouncementService, FinanceService, NotificationService};

type Db = surrealdb::engine::local::Db;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn fresh_db() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vesta_db::run_migrations(&db).await.unwrap();
    db
}

/// Mirror a principal into the store the way the authentication
/// collaborator would.
async fn seed_principal(db: &Surreal<Db>, role: Role, name: &str, active: bool) -> Principal {
    let id = Uuid::new_v4();
    let role_str = match role {
        Role::Admin => "Admin",
        Role::Resident => "Resident",
        Role::Security => "Security",
        Role::Maintenance => "Maintenance",
    };
    db.query(
        "CREATE type::record('principal', $id) SET \
         username = $username, role = $role, active = $active",
    )
    .bind(("id", id.to_string()))
    .bind(("username", name.to_string()))
    .bind(("role", role_str))
    .bind(("active", active))
    .await
    .unwrap()
    .check()
    .unwrap();

    Principal {
        id,
        username: name.into(),
        role,
        active,
    }
}

fn draft() -> CreateAnnouncement {
    CreateAnnouncement {
        title: "Pool maintenance".into(),
        content: "The pool closes on Friday.".into(),
        category: AnnouncementCategory::Maintenance,
        author_id: Uuid::nil(), // overwritten by the service
        expires_at: None,
        is_pinned: false,
    }
}

// ---------------------------------------------------------------------------
// Announcements
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_and_unpublish_announcement() {
    let db = fresh_db().await;
    let admin = seed_principal(&db, Role::Admin, "admin", true).await;
    let svc = AnnouncementService::new(SurrealAnnouncementRepository::new(db.clone()));

    let a = svc.create(&admin, draft()).await.unwrap();
    assert_eq!(a.author_id, admin.id);
    assert!(!a.is_published);
    assert!(a.published_at.is_none());

    let published = svc.publish(&admin, a.id).await.unwrap();
    assert!(published.is_published);
    assert!(published.published_at.is_some());

    // Publishing twice conflicts.
    let err = svc.publish(&admin, a.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");

    let down = svc.unpublish(&admin, a.id).await.unwrap();
    assert!(!down.is_published);
    assert!(down.published_at.is_none());

    let err = svc.unpublish(&admin, a.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }));
}

#[tokio::test]
async fn security_creates_announcements_residents_do_not() {
    let db = fresh_db().await;
    let guard = seed_principal(&db, Role::Security, "guard", true).await;
    let alice = seed_principal(&db, Role::Resident, "alice", true).await;
    let svc = AnnouncementService::new(SurrealAnnouncementRepository::new(db.clone()));

    let a = svc.create(&guard, draft()).await.unwrap();
    assert_eq!(a.author_id, guard.id);

    let err = svc.create(&alice, draft()).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));

    // Residents still read published announcements.
    svc.publish(&guard, a.id).await.unwrap();
    let listed = svc.published(&alice).await.unwrap();
    assert_eq!(listed.len(), 1);
}

// ---------------------------------------------------------------------------
// Notification fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_notification_targets_role_members() {
    let db = fresh_db().await;
    let admin = seed_principal(&db, Role::Admin, "admin", true).await;
    let alice = seed_principal(&db, Role::Resident, "alice", true).await;
    let bob = seed_principal(&db, Role::Resident, "bob", true).await;
    // Inactive residents are skipped.
    seed_principal(&db, Role::Resident, "moved-out", false).await;
    seed_principal(&db, Role::Security, "guard", true).await;

    let svc = NotificationService::new(
        SurrealNotificationRepository::new(db.clone()),
        SurrealPrincipalRepository::new(db.clone()),
    );

    let created = svc
        .send_bulk(
            &admin,
            Audience::Role(Role::Resident),
            "Water outage".into(),
            "Tomorrow 9-12.".into(),
            NotificationKind::Warning,
            None,
        )
        .await
        .unwrap();
    assert_eq!(created, 2);

    let inbox = svc.my_notifications(&alice, true).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].title, "Water outage");
    assert!(!inbox[0].is_read);

    let inbox = svc.my_notifications(&bob, false).await.unwrap();
    assert_eq!(inbox.len(), 1);
}

#[tokio::test]
async fn mark_read_and_mark_all_read() {
    let db = fresh_db().await;
    let admin = seed_principal(&db, Role::Admin, "admin", true).await;
    let alice = seed_principal(&db, Role::Resident, "alice", true).await;
    let bob = seed_principal(&db, Role::Resident, "bob", true).await;

    let svc = NotificationService::new(
        SurrealNotificationRepository::new(db.clone()),
        SurrealPrincipalRepository::new(db.clone()),
    );

    svc.send_bulk(
        &admin,
        Audience::AllActive,
        "Assembly".into(),
        "Sunday 10:00.".into(),
        NotificationKind::Info,
        None,
    )
    .await
    .unwrap();
    svc.send_bulk(
        &admin,
        Audience::Principals(vec![alice.id]),
        "Package".into(),
        "At the front desk.".into(),
        NotificationKind::Success,
        None,
    )
    .await
    .unwrap();

    let inbox = svc.my_notifications(&alice, true).await.unwrap();
    assert_eq!(inbox.len(), 2);

    // Bob cannot read alice's notification.
    let err = svc.mark_read(&bob, inbox[0].id).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));

    let read = svc.mark_read(&alice, inbox[0].id).await.unwrap();
    assert!(read.is_read);
    assert!(read.read_at.is_some());

    // Marking again is harmless.
    let again = svc.mark_read(&alice, inbox[0].id).await.unwrap();
    assert!(again.is_read);

    let flipped = svc.mark_all_read(&alice).await.unwrap();
    assert_eq!(flipped, 1);
    assert!(svc.my_notifications(&alice, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn residents_cannot_send_bulk_notifications() {
    let db = fresh_db().await;
    let alice = seed_principal(&db, Role::Resident, "alice", true).await;

    let svc = NotificationService::new(
        SurrealNotificationRepository::new(db.clone()),
        SurrealPrincipalRepository::new(db.clone()),
    );

    let err = svc
        .send_bulk(
            &alice,
            Audience::AllActive,
            "Spam".into(),
            "Spam".into(),
            NotificationKind::Info,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));
}

// ---------------------------------------------------------------------------
// Fees & payments
// ---------------------------------------------------------------------------

async fn setup_finance() -> (
    FinanceService<SurrealFeeRepository<Db>>,
    Principal,                  // admin
    Principal,                  // unit owner
    vesta_core::models::unit::Unit,
) {
    let db = fresh_db().await;
    let admin = seed_principal(&db, Role::Admin, "admin", true).await;
    let owner = seed_principal(&db, Role::Resident, "owner", true).await;

    let unit_repo = SurrealUnitRepository::new(db.clone());
    let unit = unit_repo
        .create(CreateUnit {
            unit_number: "101".into(),
            owner_id: owner.id,
            floor: None,
            area_m2: None,
            bedrooms: None,
            bathrooms: None,
            description: None,
        })
        .await
        .unwrap();

    let svc = FinanceService::new(SurrealFeeRepository::new(db.clone()));
    (svc, admin, owner, unit)
}

#[tokio::test]
async fn payment_marks_fee_paid_and_double_payment_conflicts() {
    let (svc, admin, _, unit) = setup_finance().await;

    let fee = svc
        .create_fee(
            &admin,
            CreateFee {
                unit_id: unit.id,
                title: "November dues".into(),
                description: None,
                amount: Decimal::new(15000, 2),
                due_date: date(2024, 11, 10),
            },
        )
        .await
        .unwrap();
    assert_eq!(fee.status, FeeStatus::Pending);

    let (fee, payment) = svc
        .record_payment(
            &admin,
            CreatePayment {
                fee_id: fee.id,
                amount: Decimal::new(15000, 2),
                method: PaymentMethod::Transfer,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(fee.status, FeeStatus::Paid);
    assert!(!payment.verified);

    let err = svc
        .record_payment(
            &admin,
            CreatePayment {
                fee_id: fee.id,
                amount: Decimal::new(15000, 2),
                method: PaymentMethod::Cash,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
async fn payment_verification_is_single_shot() {
    let (svc, admin, _, unit) = setup_finance().await;

    let fee = svc
        .create_fee(
            &admin,
            CreateFee {
                unit_id: unit.id,
                title: "Dues".into(),
                description: None,
                amount: Decimal::from(100),
                due_date: date(2024, 1, 10),
            },
        )
        .await
        .unwrap();
    let (_, payment) = svc
        .record_payment(
            &admin,
            CreatePayment {
                fee_id: fee.id,
                amount: Decimal::from(100),
                method: PaymentMethod::Card,
                notes: None,
            },
        )
        .await
        .unwrap();

    let verified = svc.verify_payment(&admin, payment.id).await.unwrap();
    assert!(verified.verified);
    assert_eq!(verified.verified_by, Some(admin.id));

    let err = svc.verify_payment(&admin, payment.id).await.unwrap_err();
    assert!(matches!(err, VestaError::Conflict { .. }));
}

#[tokio::test]
async fn owners_read_their_own_fees_only() {
    let (svc, admin, owner, unit) = setup_finance().await;

    svc.create_fee(
        &admin,
        CreateFee {
            unit_id: unit.id,
            title: "Dues".into(),
            description: None,
            amount: Decimal::from(100),
            due_date: date(2024, 1, 10),
        },
    )
    .await
    .unwrap();

    let fees = svc.fees_for_unit(&owner, &unit).await.unwrap();
    assert_eq!(fees.len(), 1);

    let stranger = Principal {
        id: Uuid::new_v4(),
        username: "stranger".into(),
        role: Role::Resident,
        active: true,
    };
    let err = svc.fees_for_unit(&stranger, &unit).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));

    // Security has no finance access at all.
    let guard = Principal {
        id: Uuid::new_v4(),
        username: "guard".into(),
        role: Role::Security,
        active: true,
    };
    let err = svc.fees_for_unit(&guard, &unit).await.unwrap_err();
    assert!(matches!(err, VestaError::Forbidden { .. }));
}

#[tokio::test]
async fn overdue_rollover_counts_pending_fees_past_due() {
    let (svc, admin, _, unit) = setup_finance().await;

    for (title, due) in [
        ("September dues", date(2024, 9, 10)),
        ("October dues", date(2024, 10, 10)),
        ("November dues", date(2024, 11, 10)),
    ] {
        svc.create_fee(
            &admin,
            CreateFee {
                unit_id: unit.id,
                title: title.into(),
                description: None,
                amount: Decimal::from(100),
                due_date: due,
            },
        )
        .await
        .unwrap();
    }

    let rolled = svc.refresh_overdue(&admin, date(2024, 11, 1)).await.unwrap();
    assert_eq!(rolled, 2);

    // Re-running changes nothing.
    let rolled = svc.refresh_overdue(&admin, date(2024, 11, 1)).await.unwrap();
    assert_eq!(rolled, 0);

    let fees = svc.fees_for_unit(&admin, &unit).await.unwrap();
    let overdue = fees
        .iter()
        .filter(|f| f.status == FeeStatus::Overdue)
        .count();
    assert_eq!(overdue, 2);
}
