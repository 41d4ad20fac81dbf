//! Unit tests for database initialization

use maap_common::db::init::{init_database, SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("maap.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("maap.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_all_tables_created() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("maap.db")).await.unwrap();

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for expected in [
        "abilities",
        "aspirations",
        "assignment_tenures",
        "assignments",
        "check_ins",
        "maap_snapshots",
        "position_tenures",
        "positions",
        "schema_version",
        "teammate_milestones",
    ] {
        assert!(tables.iter().any(|t| t == expected), "Should have table: {}", expected);
    }
}

#[tokio::test]
async fn test_schema_version_recorded_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("maap.db");

    let pool = init_database(&db_path).await.unwrap();
    maap_common::db::init::create_schema(&pool).await.unwrap();

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(versions, vec![SCHEMA_VERSION]);
}

#[tokio::test]
async fn test_check_in_kind_is_constrained() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("maap.db")).await.unwrap();

    let result = sqlx::query(
        "INSERT INTO check_ins (id, teammate_id, kind, dimension_id, check_in_started_on) VALUES (1, 1, 'huddle', 1, '2025-01-01')",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "Unknown check-in kind should be rejected");
}

#[tokio::test]
async fn test_snapshot_rows_reject_updates() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("maap.db")).await.unwrap();

    sqlx::query(
        r#"
        INSERT INTO maap_snapshots (
            guid, teammate_id, organization_id, change_type, effective_date,
            maap_data, form_params, maap_data_sha256
        ) VALUES ('g-1', 1, 1, 'bulk_change', '2025-01-01', '{}', '{}', 'x')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let update = sqlx::query("UPDATE maap_snapshots SET reason = 'edited' WHERE guid = 'g-1'")
        .execute(&pool)
        .await;

    assert!(update.is_err(), "Snapshot rows must be immutable");
}
