//! Finalization processor
//!
//! Loads a teammate's records, assembles the snapshot with the submitted
//! changes and stores it as one immutable row.

use chrono::NaiveDate;
use maap_common::db::ChangeType;
use maap_common::Result;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::assembler::{assemble, Assembly};
use crate::db::{build_snapshot_row, insert_snapshot, load_subject_records, SnapshotMeta};
use crate::merge::MergeContext;
use crate::model::{CheckInRecord, SubjectRecords, SubjectScope};

#[derive(Debug, Clone)]
pub struct FinalizationRequest {
    pub scope: SubjectScope,
    /// Stamped on completion toggles and recorded as the snapshot creator
    pub actor_id: Option<i64>,
    pub change_type: ChangeType,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub raw_changes: Value,
    /// Assemble only; nothing is written
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct FinalizationOutcome {
    /// Set when the snapshot was stored
    pub snapshot_guid: Option<Uuid>,
    pub assembly: Assembly,
}

pub struct FinalizationProcessor {
    pool: SqlitePool,
}

impl FinalizationProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run(&self, request: FinalizationRequest) -> Result<FinalizationOutcome> {
        let records = load_subject_records(&self.pool, request.scope).await?;
        let ctx = MergeContext::at_now(request.actor_id);

        let assembly = assemble(&records, request.scope, request.raw_changes, &ctx)?;

        if request.dry_run {
            info!(
                teammate_id = request.scope.teammate_id,
                "Dry run: snapshot assembled but not stored"
            );
            return Ok(FinalizationOutcome {
                snapshot_guid: None,
                assembly,
            });
        }

        let meta = SnapshotMeta {
            scope: request.scope,
            created_by_id: request.actor_id,
            change_type: request.change_type,
            reason: request.reason,
            effective_date: request.effective_date,
        };
        let row = build_snapshot_row(&meta, &assembly.document)?;
        insert_snapshot(&self.pool, &row).await?;

        Ok(FinalizationOutcome {
            snapshot_guid: Some(row.guid),
            assembly,
        })
    }

    /// Check-ins of the teammate that both sides have completed
    pub async fn ready_check_ins(&self, scope: SubjectScope) -> Result<Vec<CheckInRecord>> {
        let records = load_subject_records(&self.pool, scope).await?;
        Ok(ready_for_finalization(&records, scope)
            .into_iter()
            .cloned()
            .collect())
    }
}

/// In-scope check-ins awaiting official completion, ordered by id
pub fn ready_for_finalization(records: &SubjectRecords, scope: SubjectScope) -> Vec<&CheckInRecord> {
    let mut ready: Vec<&CheckInRecord> = records
        .check_ins
        .iter()
        .filter(|c| scope.contains(c.teammate_id, c.organization_id))
        .filter(|c| c.is_ready_for_finalization())
        .collect();
    ready.sort_by_key(|c| c.id);
    ready
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DimensionKind;
    use chrono::{TimeZone, Utc};

    fn check_in(id: i64, teammate_id: i64, employee: bool, manager: bool, closed: bool) -> CheckInRecord {
        let t = Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap();
        CheckInRecord {
            id,
            teammate_id,
            organization_id: 3,
            kind: DimensionKind::Assignment,
            dimension_id: 80,
            check_in_started_on: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            actual_energy_percentage: None,
            employee_rating: None,
            manager_rating: None,
            official_rating: None,
            employee_private_notes: None,
            manager_private_notes: None,
            shared_notes: None,
            employee_completed_at: employee.then_some(t),
            manager_completed_at: manager.then_some(t),
            manager_completed_by_id: None,
            official_check_in_completed_at: closed.then_some(t),
            finalized_by_id: None,
        }
    }

    #[test]
    fn test_ready_for_finalization_filters_and_orders() {
        let records = SubjectRecords {
            check_ins: vec![
                check_in(9, 7, true, true, false),
                check_in(2, 7, true, true, false),
                check_in(3, 7, true, false, false),
                check_in(4, 7, true, true, true),
                check_in(5, 8, true, true, false),
            ],
            ..SubjectRecords::default()
        };

        let ready = ready_for_finalization(&records, SubjectScope::new(7, 3));

        let ids: Vec<i64> = ready.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 9]);
    }
}
