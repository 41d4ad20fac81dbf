//! Database initialization
//!
//! Creates the database on first run and brings the schema up to date.
//! Every step is idempotent, so opening an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every table (idempotent) and record the schema version
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // Dimension catalogs (organization scope lives here)
    create_catalog_table(pool, "assignments", "title").await?;
    create_catalog_table(pool, "positions", "title").await?;
    create_catalog_table(pool, "abilities", "name").await?;
    create_catalog_table(pool, "aspirations", "name").await?;

    // Per-teammate state
    create_assignment_tenures_table(pool).await?;
    create_position_tenures_table(pool).await?;
    create_check_ins_table(pool).await?;
    create_teammate_milestones_table(pool).await?;

    create_maap_snapshots_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_catalog_table(pool: &SqlitePool, table: &str, label_column: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL,
            {label_column} TEXT NOT NULL
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    let index_sql = format!(
        "CREATE INDEX IF NOT EXISTS idx_{table}_organization ON {table}(organization_id)"
    );
    sqlx::query(&index_sql).execute(pool).await?;

    Ok(())
}

async fn create_assignment_tenures_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assignment_tenures (
            id INTEGER PRIMARY KEY,
            teammate_id INTEGER NOT NULL,
            assignment_id INTEGER NOT NULL REFERENCES assignments(id),
            anticipated_energy_percentage INTEGER,
            official_rating TEXT,
            started_at TIMESTAMP NOT NULL,
            ended_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_assignment_tenures_teammate ON assignment_tenures(teammate_id, assignment_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_position_tenures_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS position_tenures (
            id INTEGER PRIMARY KEY,
            teammate_id INTEGER NOT NULL,
            position_id INTEGER NOT NULL REFERENCES positions(id),
            manager_id INTEGER,
            seat_id INTEGER,
            employment_type TEXT,
            official_position_rating INTEGER,
            started_at TIMESTAMP NOT NULL,
            ended_at TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_position_tenures_teammate ON position_tenures(teammate_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Assignment, position and aspiration check-ins share one table;
/// `kind` names the dimension family `dimension_id` points into.
async fn create_check_ins_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS check_ins (
            id INTEGER PRIMARY KEY,
            teammate_id INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('assignment', 'position', 'aspiration')),
            dimension_id INTEGER NOT NULL,
            check_in_started_on DATE NOT NULL,
            actual_energy_percentage INTEGER,
            employee_rating TEXT,
            manager_rating TEXT,
            official_rating TEXT,
            employee_private_notes TEXT,
            manager_private_notes TEXT,
            shared_notes TEXT,
            employee_completed_at TIMESTAMP,
            manager_completed_at TIMESTAMP,
            manager_completed_by_id INTEGER,
            official_check_in_completed_at TIMESTAMP,
            finalized_by_id INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_check_ins_teammate ON check_ins(teammate_id, kind, dimension_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_teammate_milestones_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teammate_milestones (
            id INTEGER PRIMARY KEY,
            teammate_id INTEGER NOT NULL,
            ability_id INTEGER NOT NULL REFERENCES abilities(id),
            milestone_level INTEGER NOT NULL,
            certified_by_id INTEGER,
            attained_at DATE NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Snapshots are insert-only; the trigger rejects any UPDATE.
async fn create_maap_snapshots_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maap_snapshots (
            guid TEXT PRIMARY KEY,
            teammate_id INTEGER NOT NULL,
            organization_id INTEGER NOT NULL,
            created_by_id INTEGER,
            change_type TEXT NOT NULL,
            reason TEXT,
            effective_date DATE NOT NULL,
            maap_data TEXT NOT NULL,
            form_params TEXT NOT NULL,
            maap_data_sha256 TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_maap_snapshots_teammate ON maap_snapshots(teammate_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER IF NOT EXISTS maap_snapshots_immutable
        BEFORE UPDATE ON maap_snapshots
        BEGIN
            SELECT RAISE(ABORT, 'maap_snapshots rows are immutable');
        END
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
