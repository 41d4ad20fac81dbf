//! Snapshot persistence
//!
//! One immutable row per snapshot. The assembled body goes to `maap_data`,
//! the submitted payload to `form_params`; the two are never mixed.

use chrono::NaiveDate;
use maap_common::db::{maap_data_digest, ChangeType, MaapSnapshotRow, MaapSnapshotSummary};
use maap_common::time::{parse_date, parse_timestamp};
use maap_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::document::{MaapData, SnapshotDocument};
use crate::model::SubjectScope;

/// Metadata recorded alongside a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotMeta {
    pub scope: SubjectScope,
    pub created_by_id: Option<i64>,
    pub change_type: ChangeType,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
}

/// A snapshot read back from the database
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub summary: MaapSnapshotSummary,
    pub created_by_id: Option<i64>,
    pub document: SnapshotDocument,
}

/// Build the row for a document; the guid and creation time are assigned here
pub fn build_snapshot_row(meta: &SnapshotMeta, document: &SnapshotDocument) -> Result<MaapSnapshotRow> {
    let maap_data = serde_json::to_value(document.maap_data())?;
    let maap_data_sha256 = maap_data_digest(&maap_data);

    Ok(MaapSnapshotRow {
        guid: Uuid::new_v4(),
        teammate_id: meta.scope.teammate_id,
        organization_id: meta.scope.organization_id,
        created_by_id: meta.created_by_id,
        change_type: meta.change_type,
        reason: meta.reason.clone(),
        effective_date: meta.effective_date,
        maap_data,
        form_params: document.raw_changes().clone(),
        maap_data_sha256,
        created_at: maap_common::time::now(),
    })
}

pub async fn insert_snapshot(pool: &SqlitePool, row: &MaapSnapshotRow) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO maap_snapshots (
            guid, teammate_id, organization_id, created_by_id, change_type, reason,
            effective_date, maap_data, form_params, maap_data_sha256, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(row.guid.to_string())
    .bind(row.teammate_id)
    .bind(row.organization_id)
    .bind(row.created_by_id)
    .bind(row.change_type.to_db_string())
    .bind(&row.reason)
    .bind(row.effective_date.format("%Y-%m-%d").to_string())
    .bind(serde_json::to_string(&row.maap_data)?)
    .bind(serde_json::to_string(&row.form_params)?)
    .bind(&row.maap_data_sha256)
    .bind(row.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    info!(
        guid = %row.guid,
        teammate_id = row.teammate_id,
        change_type = %row.change_type,
        "Stored MAAP snapshot"
    );

    Ok(())
}

/// Load one snapshot, verifying the stored digest of `maap_data`
pub async fn load_snapshot(pool: &SqlitePool, guid: Uuid) -> Result<StoredSnapshot> {
    let row = sqlx::query(
        r#"
        SELECT guid, teammate_id, organization_id, created_by_id, change_type, reason,
               effective_date, maap_data, form_params, maap_data_sha256, created_at
        FROM maap_snapshots
        WHERE guid = ?
        "#,
    )
    .bind(guid.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("MAAP snapshot {}", guid)))?;

    let maap_data: serde_json::Value = serde_json::from_str(&row.get::<String, _>("maap_data"))?;
    let form_params: serde_json::Value =
        serde_json::from_str(&row.get::<String, _>("form_params"))?;

    let stored_digest: String = row.get("maap_data_sha256");
    if maap_data_digest(&maap_data) != stored_digest {
        return Err(Error::Internal(format!(
            "MAAP snapshot {} failed digest verification",
            guid
        )));
    }

    let body: MaapData = serde_json::from_value(maap_data)?;

    Ok(StoredSnapshot {
        summary: summary_from_row(&row)?,
        created_by_id: row.get("created_by_id"),
        document: SnapshotDocument::new(body, form_params),
    })
}

/// Snapshots for a teammate, newest first
pub async fn list_snapshots(pool: &SqlitePool, teammate_id: i64) -> Result<Vec<MaapSnapshotSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT guid, teammate_id, organization_id, change_type, reason, effective_date, created_at
        FROM maap_snapshots
        WHERE teammate_id = ?
        ORDER BY created_at DESC, guid
        "#,
    )
    .bind(teammate_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(summary_from_row).collect()
}

fn summary_from_row(row: &SqliteRow) -> Result<MaapSnapshotSummary> {
    let guid_str: String = row.get("guid");
    let guid = Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid snapshot guid '{}': {}", guid_str, e)))?;

    let change_type_str: String = row.get("change_type");
    let change_type = ChangeType::from_str(&change_type_str)
        .ok_or_else(|| Error::Internal(format!("Unknown change type '{}'", change_type_str)))?;

    Ok(MaapSnapshotSummary {
        guid,
        teammate_id: row.get("teammate_id"),
        organization_id: row.get("organization_id"),
        change_type,
        reason: row.get("reason"),
        effective_date: parse_date(&row.get::<String, _>("effective_date"))?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}
