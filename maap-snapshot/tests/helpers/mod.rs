//! Test Helper Utilities
//!
//! Shared fixtures for maap-snapshot integration tests

#![allow(dead_code)]

pub mod db_utils;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use maap_snapshot::model::{
    AbilityMilestone, AssignmentTenure, CheckInRecord, DimensionKind, PositionTenure,
    SubjectRecords, SubjectScope,
};
use maap_snapshot::MergeContext;

pub use db_utils::{create_test_db, seed_subject};

pub const TEAMMATE_ID: i64 = 7;
pub const ORGANIZATION_ID: i64 = 3;
pub const MANAGER_ID: i64 = 42;

pub fn scope() -> SubjectScope {
    SubjectScope::new(TEAMMATE_ID, ORGANIZATION_ID)
}

/// Fixed clock so stamped completions are comparable
pub fn ctx() -> MergeContext {
    MergeContext::new(Some(MANAGER_ID), at(2025, 3, 1))
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn assignment_tenure(
    id: i64,
    assignment_id: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
) -> AssignmentTenure {
    AssignmentTenure {
        id,
        teammate_id: TEAMMATE_ID,
        organization_id: ORGANIZATION_ID,
        assignment_id,
        anticipated_energy_percentage: Some(20),
        official_rating: ended_at.map(|_| "meeting".to_string()),
        started_at,
        ended_at,
    }
}

pub fn check_in(id: i64, kind: DimensionKind, dimension_id: i64) -> CheckInRecord {
    CheckInRecord {
        id,
        teammate_id: TEAMMATE_ID,
        organization_id: ORGANIZATION_ID,
        kind,
        dimension_id,
        check_in_started_on: date(2025, 2, 3),
        actual_energy_percentage: None,
        employee_rating: None,
        manager_rating: None,
        official_rating: None,
        employee_private_notes: None,
        manager_private_notes: None,
        shared_notes: None,
        employee_completed_at: None,
        manager_completed_at: None,
        manager_completed_by_id: None,
        official_check_in_completed_at: None,
        finalized_by_id: None,
    }
}

/// Assignments 80, 81 and 84, each with an open check-in
///
/// Check-in ids are chosen to collide with other assignments' ids:
/// check-in 84 belongs to assignment 80, check-in 80 to assignment 81 and
/// check-in 81 to assignment 84.
pub fn three_assignment_records() -> SubjectRecords {
    let mut for_80 = check_in(84, DimensionKind::Assignment, 80);
    for_80.shared_notes = Some("Eighty baseline".to_string());
    for_80.official_rating = Some("meeting".to_string());

    let mut for_81 = check_in(80, DimensionKind::Assignment, 81);
    for_81.shared_notes = Some("Eighty-one baseline".to_string());

    let mut for_84 = check_in(81, DimensionKind::Assignment, 84);
    for_84.shared_notes = Some("Existing lifeline notes".to_string());
    for_84.official_rating = Some("exceeding".to_string());
    for_84.employee_completed_at = Some(at(2025, 2, 10));

    SubjectRecords {
        position_tenures: vec![
            position_tenure(1, 300, at(2023, 1, 1), Some(at(2024, 1, 1)), Some(2)),
            position_tenure(2, 301, at(2024, 1, 1), Some(at(2024, 9, 1)), Some(3)),
            position_tenure(3, 302, at(2024, 9, 1), None, None),
        ],
        assignment_tenures: vec![
            assignment_tenure(10, 80, at(2024, 1, 1), Some(at(2024, 6, 1))),
            assignment_tenure(11, 80, at(2024, 6, 1), Some(at(2024, 12, 1))),
            assignment_tenure(12, 80, at(2024, 12, 1), None),
            assignment_tenure(13, 81, at(2024, 12, 1), None),
            assignment_tenure(14, 84, at(2024, 12, 1), None),
        ],
        check_ins: vec![for_80, for_81, for_84],
        ability_milestones: vec![
            milestone(2, 60, 2),
            milestone(1, 60, 1),
            milestone(3, 55, 4),
        ],
    }
}

pub fn position_tenure(
    id: i64,
    position_id: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    rating: Option<i64>,
) -> PositionTenure {
    PositionTenure {
        id,
        teammate_id: TEAMMATE_ID,
        organization_id: ORGANIZATION_ID,
        position_id,
        manager_id: Some(MANAGER_ID),
        seat_id: Some(900 + id),
        employment_type: Some("full_time".to_string()),
        official_position_rating: rating,
        started_at,
        ended_at,
    }
}

pub fn milestone(id: i64, ability_id: i64, level: i64) -> AbilityMilestone {
    AbilityMilestone {
        id,
        teammate_id: TEAMMATE_ID,
        organization_id: ORGANIZATION_ID,
        ability_id,
        milestone_level: level,
        certified_by_id: Some(MANAGER_ID),
        attained_at: date(2024, 5, level as u32),
    }
}
