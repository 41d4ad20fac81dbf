//! Database models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Why a snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    AssignmentManagement,
    PositionTenure,
    MilestoneManagement,
    AspirationManagement,
    Exploration,
    BulkChange,
    BulkCheckInFinalization,
}

impl ChangeType {
    pub const ALL: [ChangeType; 7] = [
        ChangeType::AssignmentManagement,
        ChangeType::PositionTenure,
        ChangeType::MilestoneManagement,
        ChangeType::AspirationManagement,
        ChangeType::Exploration,
        ChangeType::BulkChange,
        ChangeType::BulkCheckInFinalization,
    ];

    /// Parse change type from its database string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|change_type| change_type.to_db_string() == needle)
    }

    /// Convert to string for database storage
    pub fn to_db_string(&self) -> &'static str {
        match self {
            ChangeType::AssignmentManagement => "assignment_management",
            ChangeType::PositionTenure => "position_tenure",
            ChangeType::MilestoneManagement => "milestone_management",
            ChangeType::AspirationManagement => "aspiration_management",
            ChangeType::Exploration => "exploration",
            ChangeType::BulkChange => "bulk_change",
            ChangeType::BulkCheckInFinalization => "bulk_check_in_finalization",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// One row of `maap_snapshots`
///
/// `maap_data` holds the assembled document body; `form_params` holds the raw
/// submitted payload and is kept for audit display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaapSnapshotRow {
    pub guid: Uuid,
    pub teammate_id: i64,
    pub organization_id: i64,
    pub created_by_id: Option<i64>,
    pub change_type: ChangeType,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub maap_data: serde_json::Value,
    pub form_params: serde_json::Value,
    pub maap_data_sha256: String,
    pub created_at: DateTime<Utc>,
}

/// Summary of a stored snapshot, without the document bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaapSnapshotSummary {
    pub guid: Uuid,
    pub teammate_id: i64,
    pub organization_id: i64,
    pub change_type: ChangeType,
    pub reason: Option<String>,
    pub effective_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Hex-encoded SHA-256 of the canonical JSON encoding of `maap_data`
///
/// serde_json maps are ordered, so the encoding is stable for equal values.
pub fn maap_data_digest(maap_data: &serde_json::Value) -> String {
    let bytes = serde_json::to_vec(maap_data).unwrap_or_default();
    format!("{:x}", Sha256::digest(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_change_type_round_trip_all_variants() {
        for change_type in ChangeType::ALL {
            let db_string = change_type.to_db_string();
            assert_eq!(ChangeType::from_str(db_string), Some(change_type));
        }
    }

    #[test]
    fn test_change_type_case_insensitive() {
        assert_eq!(
            ChangeType::from_str("Bulk_Check_In_Finalization"),
            Some(ChangeType::BulkCheckInFinalization)
        );
        assert_eq!(ChangeType::from_str("kudos"), None);
    }

    #[test]
    fn test_change_type_serde_matches_db_string() {
        let json = serde_json::to_string(&ChangeType::PositionTenure).unwrap();
        assert_eq!(json, "\"position_tenure\"");
    }

    #[test]
    fn test_digest_is_stable_and_sensitive() {
        let a = json!({"assignments": [{"assignment_id": 80}], "position": {}});
        let b = json!({"position": {}, "assignments": [{"assignment_id": 80}]});
        let c = json!({"assignments": [{"assignment_id": 81}], "position": {}});

        assert_eq!(maap_data_digest(&a), maap_data_digest(&b));
        assert_ne!(maap_data_digest(&a), maap_data_digest(&c));
        assert_eq!(maap_data_digest(&a).len(), 64);
    }
}
