//! Entity State Reader
//!
//! Pure read of a teammate's current rated state. Nothing here merges or
//! applies proposed changes; absence of data yields empty lists and an
//! all-null position, never an error.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::model::{
    AbilityMilestone, AssignmentTenure, CheckInRecord, DimensionKey, DimensionKind,
    PositionTenure, SubjectRecords, SubjectScope,
};

/// Belongs-to lookup from a check-in row id to its owning dimension
///
/// Keyed by `(kind, check_in_id)` so a position check-in id can never
/// resolve to an assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckInIndex {
    owners: BTreeMap<(DimensionKind, i64), i64>,
}

impl CheckInIndex {
    pub fn from_check_ins<'a>(check_ins: impl IntoIterator<Item = &'a CheckInRecord>) -> Self {
        let owners = check_ins
            .into_iter()
            .map(|c| ((c.kind, c.id), c.dimension_id))
            .collect();
        Self { owners }
    }

    /// Owning dimension of check-in `check_in_id` of family `kind`
    pub fn resolve(&self, kind: DimensionKind, check_in_id: i64) -> Option<DimensionKey> {
        self.owners
            .get(&(kind, check_in_id))
            .map(|&dimension_id| DimensionKey::new(kind, dimension_id))
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Current position state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionState {
    pub active_tenure: Option<PositionTenure>,
    pub open_check_in: Option<CheckInRecord>,
    /// Most recently closed position tenure (`ended_at DESC`)
    pub rated_tenure: Option<PositionTenure>,
}

impl PositionState {
    /// Key overlays must carry to target the position; none without an active tenure
    pub fn key(&self) -> Option<DimensionKey> {
        self.active_tenure
            .as_ref()
            .map(|t| DimensionKey::position(t.position_id))
    }
}

/// Current state of one assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentState {
    pub assignment_id: i64,
    pub active_tenure: Option<AssignmentTenure>,
    pub open_check_in: Option<CheckInRecord>,
    /// Most recently closed tenure for this assignment (`ended_at DESC`)
    pub rated_tenure: Option<AssignmentTenure>,
}

impl AssignmentState {
    pub fn key(&self) -> DimensionKey {
        DimensionKey::assignment(self.assignment_id)
    }
}

/// Current state of one aspiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspirationState {
    pub aspiration_id: i64,
    pub open_check_in: Option<CheckInRecord>,
    pub last_finalized: Option<CheckInRecord>,
}

impl AspirationState {
    pub fn key(&self) -> DimensionKey {
        DimensionKey::aspiration(self.aspiration_id)
    }
}

/// Baseline for one reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineState {
    pub scope: SubjectScope,
    pub position: PositionState,
    /// Ordered by ascending assignment id
    pub assignments: Vec<AssignmentState>,
    /// Ordered by `(ability_id, milestone_level, id)`
    pub abilities: Vec<AbilityMilestone>,
    /// Ordered by ascending aspiration id
    pub aspirations: Vec<AspirationState>,
    pub check_in_index: CheckInIndex,
}

/// Read the teammate's current state from already-fetched records
pub fn read_current_state(records: &SubjectRecords, scope: SubjectScope) -> BaselineState {
    let position_tenures: Vec<&PositionTenure> = records
        .position_tenures
        .iter()
        .filter(|t| scope.contains(t.teammate_id, t.organization_id))
        .collect();
    let assignment_tenures: Vec<&AssignmentTenure> = records
        .assignment_tenures
        .iter()
        .filter(|t| scope.contains(t.teammate_id, t.organization_id))
        .collect();
    let check_ins: Vec<&CheckInRecord> = records
        .check_ins
        .iter()
        .filter(|c| scope.contains(c.teammate_id, c.organization_id))
        .collect();

    let mut abilities: Vec<AbilityMilestone> = records
        .ability_milestones
        .iter()
        .filter(|m| scope.contains(m.teammate_id, m.organization_id))
        .cloned()
        .collect();
    abilities.sort_by_key(|m| (m.ability_id, m.milestone_level, m.id));

    BaselineState {
        scope,
        position: read_position(&position_tenures, &check_ins),
        assignments: read_assignments(&assignment_tenures, &check_ins),
        abilities,
        aspirations: read_aspirations(&check_ins),
        check_in_index: CheckInIndex::from_check_ins(check_ins.iter().copied()),
    }
}

fn read_position(tenures: &[&PositionTenure], check_ins: &[&CheckInRecord]) -> PositionState {
    let open: Vec<&PositionTenure> = tenures.iter().copied().filter(|t| t.is_open()).collect();
    if open.len() > 1 {
        warn!(
            open_tenures = open.len(),
            "Multiple open position tenures; using the most recently started"
        );
    }
    let active_tenure = open.into_iter().max_by_key(|t| (t.started_at, t.id)).cloned();

    let rated_tenure = tenures
        .iter()
        .copied()
        .filter(|t| !t.is_open())
        .max_by_key(|t| (t.ended_at, t.id))
        .cloned();

    let open_check_in = active_tenure.as_ref().and_then(|tenure| {
        latest_open_check_in(check_ins, DimensionKey::position(tenure.position_id))
    });

    PositionState {
        active_tenure,
        open_check_in,
        rated_tenure,
    }
}

fn read_assignments(
    tenures: &[&AssignmentTenure],
    check_ins: &[&CheckInRecord],
) -> Vec<AssignmentState> {
    let mut assignment_ids: BTreeSet<i64> = tenures
        .iter()
        .filter(|t| t.is_open())
        .map(|t| t.assignment_id)
        .collect();
    assignment_ids.extend(
        check_ins
            .iter()
            .filter(|c| c.kind == DimensionKind::Assignment && c.is_open())
            .map(|c| c.dimension_id),
    );

    assignment_ids
        .into_iter()
        .map(|assignment_id| {
            let for_assignment = || {
                tenures
                    .iter()
                    .copied()
                    .filter(move |t| t.assignment_id == assignment_id)
            };

            let open: Vec<&AssignmentTenure> = for_assignment().filter(|t| t.is_open()).collect();
            if open.len() > 1 {
                warn!(
                    assignment_id,
                    open_tenures = open.len(),
                    "Multiple open assignment tenures; using the most recently started"
                );
            }

            AssignmentState {
                assignment_id,
                active_tenure: open.into_iter().max_by_key(|t| (t.started_at, t.id)).cloned(),
                open_check_in: latest_open_check_in(
                    check_ins,
                    DimensionKey::assignment(assignment_id),
                ),
                rated_tenure: for_assignment()
                    .filter(|t| !t.is_open())
                    .max_by_key(|t| (t.ended_at, t.id))
                    .cloned(),
            }
        })
        .collect()
}

fn read_aspirations(check_ins: &[&CheckInRecord]) -> Vec<AspirationState> {
    let aspiration_ids: BTreeSet<i64> = check_ins
        .iter()
        .filter(|c| c.kind == DimensionKind::Aspiration)
        .map(|c| c.dimension_id)
        .collect();

    aspiration_ids
        .into_iter()
        .map(|aspiration_id| {
            let key = DimensionKey::aspiration(aspiration_id);
            AspirationState {
                aspiration_id,
                open_check_in: latest_open_check_in(check_ins, key),
                last_finalized: check_ins
                    .iter()
                    .copied()
                    .filter(|c| c.dimension_key() == key && !c.is_open())
                    .max_by_key(|c| (c.official_check_in_completed_at, c.id))
                    .cloned(),
            }
        })
        .collect()
}

/// Open check-in with the latest start date (ties: highest id)
fn latest_open_check_in(check_ins: &[&CheckInRecord], key: DimensionKey) -> Option<CheckInRecord> {
    check_ins
        .iter()
        .copied()
        .filter(|c| c.dimension_key() == key && c.is_open())
        .max_by_key(|c| (c.check_in_started_on, c.id))
        .cloned()
}
