//! Input records and dimension identity
//!
//! Records arrive already fetched and scoped by the persistence layer. Each
//! carries the `organization_id` of the dimension it points at so that scope
//! can be re-checked in memory.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four trackable dimension families of a teammate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionKind {
    Position,
    Assignment,
    Ability,
    Aspiration,
}

impl DimensionKind {
    /// Parse dimension kind from its database string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "position" => Some(DimensionKind::Position),
            "assignment" => Some(DimensionKind::Assignment),
            "ability" => Some(DimensionKind::Ability),
            "aspiration" => Some(DimensionKind::Aspiration),
            _ => None,
        }
    }

    /// Convert to string for database storage
    pub fn to_db_string(&self) -> &'static str {
        match self {
            DimensionKind::Position => "position",
            DimensionKind::Assignment => "assignment",
            DimensionKind::Ability => "ability",
            DimensionKind::Aspiration => "aspiration",
        }
    }
}

/// Identifies exactly one dimension instance of the subject
///
/// `id` is always the dimension's own id (assignment id, position id, ...),
/// never the id of a check-in row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DimensionKey {
    pub kind: DimensionKind,
    pub id: i64,
}

impl DimensionKey {
    pub fn new(kind: DimensionKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn position(id: i64) -> Self {
        Self::new(DimensionKind::Position, id)
    }

    pub fn assignment(id: i64) -> Self {
        Self::new(DimensionKind::Assignment, id)
    }

    pub fn aspiration(id: i64) -> Self {
        Self::new(DimensionKind::Aspiration, id)
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind.to_db_string(), self.id)
    }
}

/// Teammate whose data is reconciled, within one organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectScope {
    pub teammate_id: i64,
    pub organization_id: i64,
}

impl SubjectScope {
    pub fn new(teammate_id: i64, organization_id: i64) -> Self {
        Self {
            teammate_id,
            organization_id,
        }
    }

    /// True when a record belongs to this teammate and organization
    pub fn contains(&self, teammate_id: i64, organization_id: i64) -> bool {
        self.teammate_id == teammate_id && self.organization_id == organization_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTenure {
    pub id: i64,
    pub teammate_id: i64,
    pub organization_id: i64,
    pub position_id: i64,
    pub manager_id: Option<i64>,
    pub seat_id: Option<i64>,
    pub employment_type: Option<String>,
    pub official_position_rating: Option<i64>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl PositionTenure {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentTenure {
    pub id: i64,
    pub teammate_id: i64,
    pub organization_id: i64,
    pub assignment_id: i64,
    pub anticipated_energy_percentage: Option<i64>,
    pub official_rating: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl AssignmentTenure {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// One review cycle for a (teammate, dimension) pair
///
/// Assignment, position and aspiration check-ins share this shape; `kind`
/// and `dimension_id` name the owning dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub id: i64,
    pub teammate_id: i64,
    pub organization_id: i64,
    pub kind: DimensionKind,
    pub dimension_id: i64,
    pub check_in_started_on: NaiveDate,
    pub actual_energy_percentage: Option<i64>,
    pub employee_rating: Option<String>,
    pub manager_rating: Option<String>,
    pub official_rating: Option<String>,
    pub employee_private_notes: Option<String>,
    pub manager_private_notes: Option<String>,
    pub shared_notes: Option<String>,
    pub employee_completed_at: Option<DateTime<Utc>>,
    pub manager_completed_at: Option<DateTime<Utc>>,
    pub manager_completed_by_id: Option<i64>,
    pub official_check_in_completed_at: Option<DateTime<Utc>>,
    pub finalized_by_id: Option<i64>,
}

impl CheckInRecord {
    pub fn dimension_key(&self) -> DimensionKey {
        DimensionKey::new(self.kind, self.dimension_id)
    }

    /// Not yet finalized
    pub fn is_open(&self) -> bool {
        self.official_check_in_completed_at.is_none()
    }

    /// Both sides completed and no official completion yet
    pub fn is_ready_for_finalization(&self) -> bool {
        self.employee_completed_at.is_some()
            && self.manager_completed_at.is_some()
            && self.official_check_in_completed_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityMilestone {
    pub id: i64,
    pub teammate_id: i64,
    pub organization_id: i64,
    pub ability_id: i64,
    pub milestone_level: i64,
    pub certified_by_id: Option<i64>,
    pub attained_at: NaiveDate,
}

/// Everything the reader needs for one teammate, as fetched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecords {
    pub position_tenures: Vec<PositionTenure>,
    pub assignment_tenures: Vec<AssignmentTenure>,
    pub check_ins: Vec<CheckInRecord>,
    pub ability_milestones: Vec<AbilityMilestone>,
}
