//! Subject record loading
//!
//! Fetches one teammate's tenures, check-ins and milestones, scoped to an
//! organization through the dimension catalogs. Timestamps are stored as
//! RFC 3339 text and dates as `YYYY-MM-DD`.

use maap_common::time::{parse_date, parse_timestamp};
use maap_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::model::{
    AbilityMilestone, AssignmentTenure, CheckInRecord, DimensionKind, PositionTenure,
    SubjectRecords, SubjectScope,
};

/// Load everything the reader needs for one teammate in one organization
pub async fn load_subject_records(pool: &SqlitePool, scope: SubjectScope) -> Result<SubjectRecords> {
    let records = SubjectRecords {
        position_tenures: load_position_tenures(pool, scope).await?,
        assignment_tenures: load_assignment_tenures(pool, scope).await?,
        check_ins: load_check_ins(pool, scope).await?,
        ability_milestones: load_ability_milestones(pool, scope).await?,
    };

    debug!(
        teammate_id = scope.teammate_id,
        organization_id = scope.organization_id,
        position_tenures = records.position_tenures.len(),
        assignment_tenures = records.assignment_tenures.len(),
        check_ins = records.check_ins.len(),
        ability_milestones = records.ability_milestones.len(),
        "Loaded subject records"
    );

    Ok(records)
}

async fn load_position_tenures(pool: &SqlitePool, scope: SubjectScope) -> Result<Vec<PositionTenure>> {
    let rows = sqlx::query(
        r#"
        SELECT pt.id, pt.teammate_id, p.organization_id, pt.position_id, pt.manager_id,
               pt.seat_id, pt.employment_type, pt.official_position_rating,
               pt.started_at, pt.ended_at
        FROM position_tenures pt
        JOIN positions p ON p.id = pt.position_id
        WHERE pt.teammate_id = ? AND p.organization_id = ?
        ORDER BY pt.id
        "#,
    )
    .bind(scope.teammate_id)
    .bind(scope.organization_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(PositionTenure {
                id: row.get("id"),
                teammate_id: row.get("teammate_id"),
                organization_id: row.get("organization_id"),
                position_id: row.get("position_id"),
                manager_id: row.get("manager_id"),
                seat_id: row.get("seat_id"),
                employment_type: row.get("employment_type"),
                official_position_rating: row.get("official_position_rating"),
                started_at: parse_timestamp(&row.get::<String, _>("started_at"))?,
                ended_at: optional_timestamp(row, "ended_at")?,
            })
        })
        .collect()
}

async fn load_assignment_tenures(
    pool: &SqlitePool,
    scope: SubjectScope,
) -> Result<Vec<AssignmentTenure>> {
    let rows = sqlx::query(
        r#"
        SELECT at.id, at.teammate_id, a.organization_id, at.assignment_id,
               at.anticipated_energy_percentage, at.official_rating,
               at.started_at, at.ended_at
        FROM assignment_tenures at
        JOIN assignments a ON a.id = at.assignment_id
        WHERE at.teammate_id = ? AND a.organization_id = ?
        ORDER BY at.id
        "#,
    )
    .bind(scope.teammate_id)
    .bind(scope.organization_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(AssignmentTenure {
                id: row.get("id"),
                teammate_id: row.get("teammate_id"),
                organization_id: row.get("organization_id"),
                assignment_id: row.get("assignment_id"),
                anticipated_energy_percentage: row.get("anticipated_energy_percentage"),
                official_rating: row.get("official_rating"),
                started_at: parse_timestamp(&row.get::<String, _>("started_at"))?,
                ended_at: optional_timestamp(row, "ended_at")?,
            })
        })
        .collect()
}

/// Check-ins of every kind; organization comes from whichever catalog
/// the row's `kind` points into
async fn load_check_ins(pool: &SqlitePool, scope: SubjectScope) -> Result<Vec<CheckInRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT c.*, COALESCE(a.organization_id, p.organization_id, s.organization_id) AS organization_id
        FROM check_ins c
        LEFT JOIN assignments a ON c.kind = 'assignment' AND a.id = c.dimension_id
        LEFT JOIN positions p ON c.kind = 'position' AND p.id = c.dimension_id
        LEFT JOIN aspirations s ON c.kind = 'aspiration' AND s.id = c.dimension_id
        WHERE c.teammate_id = ?
          AND COALESCE(a.organization_id, p.organization_id, s.organization_id) = ?
        ORDER BY c.id
        "#,
    )
    .bind(scope.teammate_id)
    .bind(scope.organization_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(check_in_from_row).collect()
}

pub(crate) fn check_in_from_row(row: &SqliteRow) -> Result<CheckInRecord> {
    let kind_str: String = row.get("kind");
    let kind = DimensionKind::from_str(&kind_str)
        .ok_or_else(|| Error::Internal(format!("Unknown check-in kind '{}'", kind_str)))?;

    Ok(CheckInRecord {
        id: row.get("id"),
        teammate_id: row.get("teammate_id"),
        organization_id: row.get("organization_id"),
        kind,
        dimension_id: row.get("dimension_id"),
        check_in_started_on: parse_date(&row.get::<String, _>("check_in_started_on"))?,
        actual_energy_percentage: row.get("actual_energy_percentage"),
        employee_rating: row.get("employee_rating"),
        manager_rating: row.get("manager_rating"),
        official_rating: row.get("official_rating"),
        employee_private_notes: row.get("employee_private_notes"),
        manager_private_notes: row.get("manager_private_notes"),
        shared_notes: row.get("shared_notes"),
        employee_completed_at: optional_timestamp(row, "employee_completed_at")?,
        manager_completed_at: optional_timestamp(row, "manager_completed_at")?,
        manager_completed_by_id: row.get("manager_completed_by_id"),
        official_check_in_completed_at: optional_timestamp(row, "official_check_in_completed_at")?,
        finalized_by_id: row.get("finalized_by_id"),
    })
}

async fn load_ability_milestones(
    pool: &SqlitePool,
    scope: SubjectScope,
) -> Result<Vec<AbilityMilestone>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.teammate_id, ab.organization_id, m.ability_id, m.milestone_level,
               m.certified_by_id, m.attained_at
        FROM teammate_milestones m
        JOIN abilities ab ON ab.id = m.ability_id
        WHERE m.teammate_id = ? AND ab.organization_id = ?
        ORDER BY m.ability_id, m.milestone_level, m.id
        "#,
    )
    .bind(scope.teammate_id)
    .bind(scope.organization_id)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(AbilityMilestone {
                id: row.get("id"),
                teammate_id: row.get("teammate_id"),
                organization_id: row.get("organization_id"),
                ability_id: row.get("ability_id"),
                milestone_level: row.get("milestone_level"),
                certified_by_id: row.get("certified_by_id"),
                attained_at: parse_date(&row.get::<String, _>("attained_at"))?,
            })
        })
        .collect()
}

fn optional_timestamp(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    row.get::<Option<String>, _>(column)
        .map(|s| parse_timestamp(&s))
        .transpose()
}
