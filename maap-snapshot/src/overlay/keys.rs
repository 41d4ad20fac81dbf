//! Flat form-key grammar
//!
//! A flat overlay key is `<prefix><digits>_<field name>`. The prefix names the
//! dimension family and whether the digits are a dimension id or a check-in
//! row id. Prefixes are tried longest first and the whole key must match; a
//! key whose id segment is not numeric is not an overlay key at all.

use crate::model::DimensionKind;

use super::fields::OverlayField;

/// What the numeric segment of a flat key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    /// The dimension's own id (assignment id, position id, ...)
    Dimension,
    /// A check-in row id; the owning dimension must be looked up
    CheckIn,
}

const FLAT_PREFIXES: [(&str, DimensionKind, IdScheme); 7] = [
    ("assignment_check_in_", DimensionKind::Assignment, IdScheme::CheckIn),
    ("aspiration_check_in_", DimensionKind::Aspiration, IdScheme::CheckIn),
    ("position_check_in_", DimensionKind::Position, IdScheme::CheckIn),
    ("assignment_", DimensionKind::Assignment, IdScheme::Dimension),
    ("aspiration_", DimensionKind::Aspiration, IdScheme::Dimension),
    ("check_in_", DimensionKind::Assignment, IdScheme::CheckIn),
    ("position_", DimensionKind::Position, IdScheme::Dimension),
];

/// A parsed flat key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatKey {
    pub kind: DimensionKind,
    pub scheme: IdScheme,
    pub id: i64,
    pub field: OverlayField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlatKeyMatch {
    /// Not an overlay key (e.g. `authenticity_token`, `position_id`)
    NotOverlay,
    /// Overlay-shaped but unusable
    Malformed { scheme: IdScheme, reason: String },
    Key(FlatKey),
}

/// Parse one top-level payload key
pub fn parse_flat_key(key: &str) -> FlatKeyMatch {
    for (prefix, kind, scheme) in FLAT_PREFIXES {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        let Some((id_part, field_part)) = rest.split_once('_') else {
            continue;
        };
        if id_part.is_empty() || !id_part.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        let Ok(id) = id_part.parse::<i64>() else {
            return FlatKeyMatch::Malformed {
                scheme,
                reason: format!("id {} out of range", id_part),
            };
        };

        return match OverlayField::from_name(field_part) {
            Some(field) => FlatKeyMatch::Key(FlatKey {
                kind,
                scheme,
                id,
                field,
            }),
            None => FlatKeyMatch::Malformed {
                scheme,
                reason: format!("unknown field {:?}", field_part),
            },
        };
    }

    FlatKeyMatch::NotOverlay
}
