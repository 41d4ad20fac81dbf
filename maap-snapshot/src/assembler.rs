//! Snapshot Assembler
//!
//! Walks the baseline's own lists and consumes the overlay entry for each
//! instance by key. Whatever is left in the overlay map afterwards names a
//! dimension the teammate does not currently have; it is reported and
//! dropped, never turned into a new entry.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use maap_common::{Error, Result};

use crate::document::{
    AbilityEntry, AspirationEntry, AssignmentEntry, MaapData, PositionEntry, RatedAssignment,
    RatedPosition, SnapshotDocument,
};
use crate::merge::{merge_check_in, merge_tenure_fields, MergeContext};
use crate::model::{DimensionKey, SubjectRecords, SubjectScope};
use crate::overlay::{parse_overlays, OverlayFields, OverlayMap, RejectedKey};
use crate::reader::{read_current_state, AspirationState, AssignmentState, PositionState};

/// What happened to the submitted payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    /// Dimensions whose overlay was merged
    pub applied: Vec<DimensionKey>,
    /// Dimensions named by the payload but absent from the baseline
    pub stale: Vec<DimensionKey>,
    pub rejected: Vec<RejectedKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub document: SnapshotDocument,
    pub report: AssemblyReport,
}

/// Build the snapshot document for one teammate
///
/// `raw_changes` must be a JSON object; it is attached to the document
/// verbatim.
pub fn assemble(
    records: &SubjectRecords,
    scope: SubjectScope,
    raw_changes: Value,
    ctx: &MergeContext,
) -> Result<Assembly> {
    let Some(payload) = raw_changes.as_object() else {
        return Err(Error::InvalidInput(
            "proposed changes must be a JSON object".to_string(),
        ));
    };

    let baseline = read_current_state(records, scope);
    let parsed = parse_overlays(payload, &baseline.check_in_index)?;
    let mut overlays = parsed.overlays;
    let mut report = AssemblyReport {
        rejected: parsed.rejected,
        ..AssemblyReport::default()
    };

    let position = assemble_position(&baseline.position, &mut overlays, &mut report, ctx);

    let assignments: Vec<AssignmentEntry> = baseline
        .assignments
        .iter()
        .map(|state| assemble_assignment(state, &mut overlays, &mut report, ctx))
        .collect();

    let abilities: Vec<AbilityEntry> = baseline.abilities.iter().map(AbilityEntry::from).collect();

    let aspirations: Vec<AspirationEntry> = baseline
        .aspirations
        .iter()
        .map(|state| assemble_aspiration(state, &mut overlays, &mut report, ctx))
        .collect();

    for (key, overlay) in overlays {
        warn!(
            dimension = %key,
            teammate_id = scope.teammate_id,
            ?overlay,
            "Dropping overlay for dimension not held by teammate"
        );
        report.stale.push(key);
    }

    info!(
        teammate_id = scope.teammate_id,
        organization_id = scope.organization_id,
        assignments = assignments.len(),
        abilities = abilities.len(),
        aspirations = aspirations.len(),
        applied = report.applied.len(),
        stale = report.stale.len(),
        rejected = report.rejected.len(),
        "Assembled MAAP snapshot"
    );

    let maap_data = MaapData {
        position,
        assignments,
        abilities,
        aspirations,
    };

    Ok(Assembly {
        document: SnapshotDocument::new(maap_data, raw_changes),
        report,
    })
}

fn assemble_position(
    state: &PositionState,
    overlays: &mut OverlayMap,
    report: &mut AssemblyReport,
    ctx: &MergeContext,
) -> PositionEntry {
    let overlay = state.key().and_then(|key| take_overlay(overlays, key, report));
    let rated_position = RatedPosition::from(state.rated_tenure.as_ref());

    let Some(tenure) = &state.active_tenure else {
        return PositionEntry {
            rated_position,
            ..PositionEntry::default()
        };
    };

    PositionEntry {
        position_id: Some(tenure.position_id),
        manager_id: tenure.manager_id,
        seat_id: tenure.seat_id,
        employment_type: tenure.employment_type.clone(),
        official_position_rating: tenure.official_position_rating,
        started_at: Some(tenure.started_at),
        check_in: merge_check_in(state.open_check_in.as_ref(), overlay.as_ref(), ctx),
        rated_position,
    }
}

fn assemble_assignment(
    state: &AssignmentState,
    overlays: &mut OverlayMap,
    report: &mut AssemblyReport,
    ctx: &MergeContext,
) -> AssignmentEntry {
    let overlay = take_overlay(overlays, state.key(), report);
    let tenure = merge_tenure_fields(state.active_tenure.as_ref(), overlay.as_ref());

    AssignmentEntry {
        assignment_id: state.assignment_id,
        anticipated_energy_percentage: tenure.anticipated_energy_percentage,
        official_rating: tenure.official_rating,
        started_at: tenure.started_at,
        check_in: merge_check_in(state.open_check_in.as_ref(), overlay.as_ref(), ctx),
        rated_assignment: RatedAssignment::from(state.rated_tenure.as_ref()),
    }
}

fn assemble_aspiration(
    state: &AspirationState,
    overlays: &mut OverlayMap,
    report: &mut AssemblyReport,
    ctx: &MergeContext,
) -> AspirationEntry {
    let overlay = take_overlay(overlays, state.key(), report);

    AspirationEntry {
        aspiration_id: state.aspiration_id,
        official_rating: state
            .last_finalized
            .as_ref()
            .and_then(|c| c.official_rating.clone()),
        check_in: merge_check_in(state.open_check_in.as_ref(), overlay.as_ref(), ctx),
    }
}

fn take_overlay(
    overlays: &mut OverlayMap,
    key: DimensionKey,
    report: &mut AssemblyReport,
) -> Option<OverlayFields> {
    let overlay = overlays.remove(&key)?;
    report.applied.push(key);
    Some(overlay)
}
