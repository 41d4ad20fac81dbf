//! Snapshot document types
//!
//! A `SnapshotDocument` is built once by the assembler and never mutated:
//! its fields are private and only exposed by reference. The raw submitted
//! payload travels with it as `raw_changes`, for audit display only.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AbilityMilestone, AssignmentTenure, CheckInRecord, PositionTenure};

/// Check-in fields as they appear in a snapshot (merged with any overlay)
///
/// `check_in_id` is `None` when the fields describe a check-in proposed by an
/// overlay that has no stored record yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInFields {
    pub check_in_id: Option<i64>,
    pub check_in_started_on: Option<NaiveDate>,
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

impl From<&CheckInRecord> for CheckInFields {
    fn from(record: &CheckInRecord) -> Self {
        Self {
            check_in_id: Some(record.id),
            check_in_started_on: Some(record.check_in_started_on),
            actual_energy_percentage: record.actual_energy_percentage,
            employee_rating: record.employee_rating.clone(),
            manager_rating: record.manager_rating.clone(),
            official_rating: record.official_rating.clone(),
            employee_private_notes: record.employee_private_notes.clone(),
            manager_private_notes: record.manager_private_notes.clone(),
            shared_notes: record.shared_notes.clone(),
            employee_completed_at: record.employee_completed_at,
            manager_completed_at: record.manager_completed_at,
            manager_completed_by_id: record.manager_completed_by_id,
            official_check_in_completed_at: record.official_check_in_completed_at,
            finalized_by_id: record.finalized_by_id,
        }
    }
}

/// Most recently closed assignment tenure; serializes as `{}` when empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatedAssignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anticipated_energy_percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl RatedAssignment {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Option<&AssignmentTenure>> for RatedAssignment {
    fn from(tenure: Option<&AssignmentTenure>) -> Self {
        match tenure {
            Some(t) => Self {
                assignment_id: Some(t.assignment_id),
                anticipated_energy_percentage: t.anticipated_energy_percentage,
                official_rating: t.official_rating.clone(),
                started_at: Some(t.started_at),
                ended_at: t.ended_at,
            },
            None => Self::default(),
        }
    }
}

/// Most recently closed position tenure; serializes as `{}` when empty
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatedPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_position_rating: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl RatedPosition {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Option<&PositionTenure>> for RatedPosition {
    fn from(tenure: Option<&PositionTenure>) -> Self {
        match tenure {
            Some(t) => Self {
                position_id: Some(t.position_id),
                manager_id: t.manager_id,
                seat_id: t.seat_id,
                employment_type: t.employment_type.clone(),
                official_position_rating: t.official_position_rating,
                started_at: Some(t.started_at),
                ended_at: t.ended_at,
            },
            None => Self::default(),
        }
    }
}

/// The subject's position: active tenure at top level, rated tenure nested
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    pub position_id: Option<i64>,
    pub manager_id: Option<i64>,
    pub seat_id: Option<i64>,
    pub employment_type: Option<String>,
    pub official_position_rating: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub check_in: Option<CheckInFields>,
    #[serde(default)]
    pub rated_position: RatedPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub assignment_id: i64,
    pub anticipated_energy_percentage: Option<i64>,
    pub official_rating: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub check_in: Option<CheckInFields>,
    #[serde(default)]
    pub rated_assignment: RatedAssignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityEntry {
    pub ability_id: i64,
    pub milestone_level: i64,
    pub certified_by_id: Option<i64>,
    pub attained_at: NaiveDate,
}

impl From<&AbilityMilestone> for AbilityEntry {
    fn from(milestone: &AbilityMilestone) -> Self {
        Self {
            ability_id: milestone.ability_id,
            milestone_level: milestone.milestone_level,
            certified_by_id: milestone.certified_by_id,
            attained_at: milestone.attained_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspirationEntry {
    pub aspiration_id: i64,
    /// Official rating of the most recently finalized check-in
    pub official_rating: Option<String>,
    pub check_in: Option<CheckInFields>,
}

/// The derived state of a snapshot (what `maap_data` stores)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaapData {
    pub position: PositionEntry,
    pub assignments: Vec<AssignmentEntry>,
    pub abilities: Vec<AbilityEntry>,
    pub aspirations: Vec<AspirationEntry>,
}

/// Assembled snapshot: derived state plus the raw payload it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(flatten)]
    maap_data: MaapData,
    raw_changes: serde_json::Value,
}

impl SnapshotDocument {
    pub(crate) fn new(maap_data: MaapData, raw_changes: serde_json::Value) -> Self {
        Self {
            maap_data,
            raw_changes,
        }
    }

    pub fn maap_data(&self) -> &MaapData {
        &self.maap_data
    }

    pub fn position(&self) -> &PositionEntry {
        &self.maap_data.position
    }

    pub fn assignments(&self) -> &[AssignmentEntry] {
        &self.maap_data.assignments
    }

    pub fn abilities(&self) -> &[AbilityEntry] {
        &self.maap_data.abilities
    }

    pub fn aspirations(&self) -> &[AspirationEntry] {
        &self.maap_data.aspirations
    }

    /// The submitted payload, verbatim. Audit display only.
    pub fn raw_changes(&self) -> &serde_json::Value {
        &self.raw_changes
    }

    pub fn assignment(&self, assignment_id: i64) -> Option<&AssignmentEntry> {
        self.assignments()
            .iter()
            .find(|entry| entry.assignment_id == assignment_id)
    }

    pub fn aspiration(&self, aspiration_id: i64) -> Option<&AspirationEntry> {
        self.aspirations()
            .iter()
            .find(|entry| entry.aspiration_id == aspiration_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_rated_assignment_serializes_as_empty_object() {
        let value = serde_json::to_value(RatedAssignment::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_empty_object_deserializes_to_empty_rated_position() {
        let rated: RatedPosition = serde_json::from_value(json!({})).unwrap();
        assert!(rated.is_empty());
    }

    #[test]
    fn test_document_top_level_keys() {
        let document = SnapshotDocument::new(MaapData::default(), json!({"reason": "review"}));
        let value = serde_json::to_value(&document).unwrap();
        let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        keys.sort();

        assert_eq!(
            keys,
            vec!["abilities", "aspirations", "assignments", "position", "raw_changes"]
        );
        assert_eq!(value["position"]["rated_position"], json!({}));
    }

    #[test]
    fn test_document_deserializes_from_own_encoding() {
        let maap_data = MaapData {
            assignments: vec![AssignmentEntry {
                assignment_id: 80,
                anticipated_energy_percentage: Some(25),
                official_rating: None,
                started_at: None,
                check_in: Some(CheckInFields {
                    shared_notes: Some("Lifeline notes".to_string()),
                    ..CheckInFields::default()
                }),
                rated_assignment: RatedAssignment::default(),
            }],
            ..MaapData::default()
        };
        let document = SnapshotDocument::new(maap_data, json!({}));

        let encoded = serde_json::to_string(&document).unwrap();
        let decoded: SnapshotDocument = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, document);
        assert_eq!(decoded.assignment(80).unwrap().anticipated_energy_percentage, Some(25));
        assert!(decoded.assignment(81).is_none());
    }
}
