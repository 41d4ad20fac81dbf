//! Database helpers: temp databases and record seeding

use maap_common::db::init_database;
use maap_snapshot::model::{DimensionKind, SubjectRecords};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Fresh database in a temp dir; keep the `TempDir` alive for the test
pub async fn create_test_db() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Should create temp dir");
    let pool = init_database(&temp_dir.path().join("maap.db"))
        .await
        .expect("Should initialize database");
    (temp_dir, pool)
}

/// Insert records plus the catalog rows they point at
///
/// Catalog rows take the organization of the record that references them.
pub async fn seed_subject(pool: &SqlitePool, records: &SubjectRecords) {
    for tenure in &records.position_tenures {
        insert_catalog(pool, "positions", "title", tenure.position_id, tenure.organization_id).await;
        sqlx::query(
            r#"
            INSERT INTO position_tenures (id, teammate_id, position_id, manager_id, seat_id,
                employment_type, official_position_rating, started_at, ended_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenure.id)
        .bind(tenure.teammate_id)
        .bind(tenure.position_id)
        .bind(tenure.manager_id)
        .bind(tenure.seat_id)
        .bind(&tenure.employment_type)
        .bind(tenure.official_position_rating)
        .bind(tenure.started_at.to_rfc3339())
        .bind(tenure.ended_at.map(|t| t.to_rfc3339()))
        .execute(pool)
        .await
        .expect("Should insert position tenure");
    }

    for tenure in &records.assignment_tenures {
        insert_catalog(pool, "assignments", "title", tenure.assignment_id, tenure.organization_id)
            .await;
        sqlx::query(
            r#"
            INSERT INTO assignment_tenures (id, teammate_id, assignment_id,
                anticipated_energy_percentage, official_rating, started_at, ended_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenure.id)
        .bind(tenure.teammate_id)
        .bind(tenure.assignment_id)
        .bind(tenure.anticipated_energy_percentage)
        .bind(&tenure.official_rating)
        .bind(tenure.started_at.to_rfc3339())
        .bind(tenure.ended_at.map(|t| t.to_rfc3339()))
        .execute(pool)
        .await
        .expect("Should insert assignment tenure");
    }

    for check_in in &records.check_ins {
        let (table, label) = match check_in.kind {
            DimensionKind::Assignment => ("assignments", "title"),
            DimensionKind::Position => ("positions", "title"),
            DimensionKind::Aspiration => ("aspirations", "name"),
            DimensionKind::Ability => panic!("abilities have no check-ins"),
        };
        insert_catalog(pool, table, label, check_in.dimension_id, check_in.organization_id).await;

        sqlx::query(
            r#"
            INSERT INTO check_ins (id, teammate_id, kind, dimension_id, check_in_started_on,
                actual_energy_percentage, employee_rating, manager_rating, official_rating,
                employee_private_notes, manager_private_notes, shared_notes,
                employee_completed_at, manager_completed_at, manager_completed_by_id,
                official_check_in_completed_at, finalized_by_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(check_in.id)
        .bind(check_in.teammate_id)
        .bind(check_in.kind.to_db_string())
        .bind(check_in.dimension_id)
        .bind(check_in.check_in_started_on.format("%Y-%m-%d").to_string())
        .bind(check_in.actual_energy_percentage)
        .bind(&check_in.employee_rating)
        .bind(&check_in.manager_rating)
        .bind(&check_in.official_rating)
        .bind(&check_in.employee_private_notes)
        .bind(&check_in.manager_private_notes)
        .bind(&check_in.shared_notes)
        .bind(check_in.employee_completed_at.map(|t| t.to_rfc3339()))
        .bind(check_in.manager_completed_at.map(|t| t.to_rfc3339()))
        .bind(check_in.manager_completed_by_id)
        .bind(check_in.official_check_in_completed_at.map(|t| t.to_rfc3339()))
        .bind(check_in.finalized_by_id)
        .execute(pool)
        .await
        .expect("Should insert check-in");
    }

    for milestone in &records.ability_milestones {
        insert_catalog(pool, "abilities", "name", milestone.ability_id, milestone.organization_id)
            .await;
        sqlx::query(
            r#"
            INSERT INTO teammate_milestones (id, teammate_id, ability_id, milestone_level,
                certified_by_id, attained_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(milestone.id)
        .bind(milestone.teammate_id)
        .bind(milestone.ability_id)
        .bind(milestone.milestone_level)
        .bind(milestone.certified_by_id)
        .bind(milestone.attained_at.format("%Y-%m-%d").to_string())
        .execute(pool)
        .await
        .expect("Should insert milestone");
    }
}

async fn insert_catalog(pool: &SqlitePool, table: &str, label: &str, id: i64, organization_id: i64) {
    let sql = format!(
        "INSERT OR IGNORE INTO {table} (id, organization_id, {label}) VALUES (?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(organization_id)
        .bind(format!("{} {}", table, id))
        .execute(pool)
        .await
        .expect("Should insert catalog row");
}
