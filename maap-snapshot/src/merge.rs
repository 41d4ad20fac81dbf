//! Per-Entity Merge Engine
//!
//! Combines one dimension's stored check-in with the overlay resolved to that
//! same dimension. The function sees exactly one record and one overlay, so
//! it cannot pick up values belonging to another entity.

use chrono::{DateTime, Utc};

use crate::document::CheckInFields;
use crate::model::{AssignmentTenure, CheckInRecord};
use crate::overlay::OverlayFields;

/// Actor and clock used to stamp completion toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeContext {
    pub actor_id: Option<i64>,
    pub now: DateTime<Utc>,
}

impl MergeContext {
    pub fn new(actor_id: Option<i64>, now: DateTime<Utc>) -> Self {
        Self { actor_id, now }
    }

    /// Context stamped with the current wall-clock time
    pub fn at_now(actor_id: Option<i64>) -> Self {
        Self::new(actor_id, maap_common::time::now())
    }
}

/// Merge a stored check-in with its overlay
///
/// Returns `None` only when there is neither a stored check-in nor an overlay
/// touching check-in fields.
pub fn merge_check_in(
    current: Option<&CheckInRecord>,
    overlay: Option<&OverlayFields>,
    ctx: &MergeContext,
) -> Option<CheckInFields> {
    let current = current.map(CheckInFields::from);

    let overlay = match overlay {
        Some(overlay) if overlay.touches_check_in() => overlay,
        _ => return current,
    };

    let mut merged = current.unwrap_or_default();

    if let Some(v) = &overlay.shared_notes {
        merged.shared_notes = Some(v.clone());
    }
    if let Some(v) = &overlay.official_rating {
        merged.official_rating = Some(v.clone());
    }
    if let Some(v) = &overlay.employee_rating {
        merged.employee_rating = Some(v.clone());
    }
    if let Some(v) = &overlay.manager_rating {
        merged.manager_rating = Some(v.clone());
    }
    if let Some(v) = overlay.actual_energy_percentage {
        merged.actual_energy_percentage = Some(v);
    }
    if let Some(v) = &overlay.employee_private_notes {
        merged.employee_private_notes = Some(v.clone());
    }
    if let Some(v) = &overlay.manager_private_notes {
        merged.manager_private_notes = Some(v.clone());
    }

    if let Some(complete) = overlay.employee_complete {
        apply_toggle(complete, &mut merged.employee_completed_at, None, ctx);
    }
    if let Some(complete) = overlay.manager_complete {
        apply_toggle(
            complete,
            &mut merged.manager_completed_at,
            Some(&mut merged.manager_completed_by_id),
            ctx,
        );
    }
    if let Some(close) = overlay.close_rating {
        apply_toggle(
            close,
            &mut merged.official_check_in_completed_at,
            Some(&mut merged.finalized_by_id),
            ctx,
        );
    }

    Some(merged)
}

/// Set or clear a completion stamp
///
/// `true` keeps an existing stamp and only fills an empty one; `false` clears
/// both the timestamp and the actor.
fn apply_toggle(
    complete: bool,
    completed_at: &mut Option<DateTime<Utc>>,
    completed_by: Option<&mut Option<i64>>,
    ctx: &MergeContext,
) {
    if complete {
        if completed_at.is_none() {
            *completed_at = Some(ctx.now);
            if let Some(by) = completed_by {
                *by = ctx.actor_id;
            }
        }
    } else {
        *completed_at = None;
        if let Some(by) = completed_by {
            *by = None;
        }
    }
}

/// Tenure-level values shown at the top of an assignment entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenureFields {
    pub anticipated_energy_percentage: Option<i64>,
    pub official_rating: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Apply the tenure-level overlay field to the active assignment tenure
///
/// Closed tenures never pass through here; rated sub-objects are built
/// straight from the stored record.
pub fn merge_tenure_fields(
    active: Option<&AssignmentTenure>,
    overlay: Option<&OverlayFields>,
) -> TenureFields {
    let mut fields = active
        .map(|t| TenureFields {
            anticipated_energy_percentage: t.anticipated_energy_percentage,
            official_rating: t.official_rating.clone(),
            started_at: Some(t.started_at),
        })
        .unwrap_or_default();

    if let Some(energy) = overlay.and_then(|o| o.anticipated_energy_percentage) {
        fields.anticipated_energy_percentage = Some(energy);
    }

    fields
}
