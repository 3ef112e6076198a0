//! Schema and migration tests against in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn migrations_run_cleanly() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    vesta_db::run_migrations(&db).await.unwrap();
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();

    vesta_db::run_migrations(&db).await.unwrap();
    vesta_db::run_migrations(&db).await.unwrap();
}

#[tokio::test]
async fn schema_rejects_unknown_status_values() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vesta_db::run_migrations(&db).await.unwrap();

    let result = db
        .query(
            "CREATE unit SET unit_number = 'X', \
             owner_id = 'o', occupancy_status = 'Squatted'",
        )
        .await
        .unwrap();
    assert!(result.check().is_err());
}

#[tokio::test]
async fn schema_v1_defines_every_table() {
    let ddl = vesta_db::schema_v1();
    for table in [
        "principal",
        "unit",
        "resident",
        "area",
        "reservation",
        "announcement",
        "notification",
        "fee",
        "payment",
        "camera",
        "access_log",
        "security_incident",
    ] {
        assert!(
            ddl.contains(&format!("DEFINE TABLE {table} ")),
            "missing table definition: {table}"
        );
    }
}
