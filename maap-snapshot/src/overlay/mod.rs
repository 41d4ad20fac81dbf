//! Change Overlay Parser
//!
//! Normalizes a submitted proposed-changes payload into one map of
//! `DimensionKey -> OverlayFields`. The payload may carry the same edit in
//! three shapes at once:
//!
//! - nested by dimension id: `check_in_data[80][shared_notes]`
//! - flat by check-in row id: `check_in_501_shared_notes`
//! - flat by dimension id: `assignment_80_shared_notes`
//!
//! Each shape has its own decoder writing into its own accumulator, keyed by
//! the resolved `DimensionKey`. Accumulators are folded into the output in
//! `PayloadShape::PRECEDENCE` order, so for a given field the last shape that
//! mentions it wins. Check-in ids are resolved through `CheckInIndex`; a
//! check-in id is never taken to be a dimension id.

pub mod fields;
pub mod keys;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use maap_common::{Error, Result};

use crate::model::{DimensionKey, DimensionKind};
use crate::reader::CheckInIndex;

pub use fields::{OverlayField, OverlayFields, OverlayValue};
use keys::{parse_flat_key, FlatKeyMatch, IdScheme};

/// Resolved overlays, one entry per mentioned dimension instance
pub type OverlayMap = BTreeMap<DimensionKey, OverlayFields>;

/// The three encodings a payload may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    NestedByDimension,
    FlatByCheckIn,
    FlatByDimension,
}

impl PayloadShape {
    /// Fold order: later shapes overwrite fields set by earlier ones
    pub const PRECEDENCE: [PayloadShape; 3] = [
        PayloadShape::NestedByDimension,
        PayloadShape::FlatByCheckIn,
        PayloadShape::FlatByDimension,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadShape::NestedByDimension => "nested_by_dimension",
            PayloadShape::FlatByCheckIn => "flat_by_check_in",
            PayloadShape::FlatByDimension => "flat_by_dimension",
        }
    }
}

/// Nested containers and the dimension family their keys identify
const NESTED_CONTAINERS: [(&str, DimensionKind); 4] = [
    ("check_in_data", DimensionKind::Assignment),
    ("assignment_check_ins", DimensionKind::Assignment),
    ("position_check_ins", DimensionKind::Position),
    ("aspiration_check_ins", DimensionKind::Aspiration),
];

/// A payload key that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedKey {
    pub key: String,
    pub shape: PayloadShape,
    pub reason: String,
}

/// Parser output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOverlays {
    pub overlays: OverlayMap,
    pub rejected: Vec<RejectedKey>,
}

/// Parse a raw payload into per-dimension overlays
///
/// Unresolvable keys are collected in `rejected` and logged; two keys of the
/// same shape giving one field of one dimension different values is an
/// `Error::OverlayConflict`.
pub fn parse_overlays(raw: &Map<String, Value>, index: &CheckInIndex) -> Result<ParsedOverlays> {
    let mut overlays = OverlayMap::new();
    let mut rejected = Vec::new();

    for shape in PayloadShape::PRECEDENCE {
        let mut accumulator = ShapeAccumulator::new(shape);
        match shape {
            PayloadShape::NestedByDimension => {
                decode_nested(raw, index, &mut accumulator, &mut rejected)?
            }
            PayloadShape::FlatByCheckIn => {
                decode_flat(raw, IdScheme::CheckIn, index, &mut accumulator, &mut rejected)?
            }
            PayloadShape::FlatByDimension => {
                decode_flat(raw, IdScheme::Dimension, index, &mut accumulator, &mut rejected)?
            }
        }
        accumulator.fold_into(&mut overlays);
    }

    for rejection in &rejected {
        warn!(
            key = %rejection.key,
            shape = rejection.shape.as_str(),
            "Dropping overlay key: {}",
            rejection.reason
        );
    }

    Ok(ParsedOverlays { overlays, rejected })
}

/// Values decoded from one shape, with the key each came from
struct ShapeAccumulator {
    shape: PayloadShape,
    entries: BTreeMap<DimensionKey, BTreeMap<OverlayField, (OverlayValue, String)>>,
}

impl ShapeAccumulator {
    fn new(shape: PayloadShape) -> Self {
        Self {
            shape,
            entries: BTreeMap::new(),
        }
    }

    fn insert(
        &mut self,
        dimension: DimensionKey,
        field: OverlayField,
        value: OverlayValue,
        source_key: String,
    ) -> Result<()> {
        let fields = self.entries.entry(dimension).or_default();
        if let Some((existing, existing_key)) = fields.get(&field) {
            if *existing != value {
                return Err(Error::OverlayConflict {
                    dimension: dimension.to_string(),
                    field: field.canonical_name().to_string(),
                    shape: self.shape.as_str().to_string(),
                    first: format!("{}={}", existing_key, existing),
                    second: format!("{}={}", source_key, value),
                });
            }
            return Ok(());
        }

        debug!(
            %dimension,
            field = field.canonical_name(),
            shape = self.shape.as_str(),
            source_key = %source_key,
            "Decoded overlay value"
        );
        fields.insert(field, (value, source_key));
        Ok(())
    }

    fn fold_into(self, overlays: &mut OverlayMap) {
        for (dimension, fields) in self.entries {
            let overlay = overlays.entry(dimension).or_default();
            for (field, (value, _)) in fields {
                overlay.set(field, value);
            }
        }
    }
}

fn decode_nested(
    raw: &Map<String, Value>,
    index: &CheckInIndex,
    accumulator: &mut ShapeAccumulator,
    rejected: &mut Vec<RejectedKey>,
) -> Result<()> {
    let shape = PayloadShape::NestedByDimension;

    for (container, kind) in NESTED_CONTAINERS {
        let Some(value) = raw.get(container) else {
            continue;
        };
        let Some(by_id) = value.as_object() else {
            rejected.push(RejectedKey {
                key: container.to_string(),
                shape,
                reason: "expected an object keyed by dimension id".to_string(),
            });
            continue;
        };

        for (id_text, entry) in by_id {
            let entry_key = format!("{}[{}]", container, id_text);
            let Some(dimension_id) = parse_id(id_text) else {
                rejected.push(RejectedKey {
                    key: entry_key,
                    shape,
                    reason: format!("{:?} is not a dimension id", id_text),
                });
                continue;
            };
            let Some(entry_fields) = entry.as_object() else {
                rejected.push(RejectedKey {
                    key: entry_key,
                    shape,
                    reason: "expected an object of fields".to_string(),
                });
                continue;
            };

            let dimension = DimensionKey::new(kind, dimension_id);
            if let Err(reason) = verify_identity_echoes(dimension, entry_fields, index) {
                rejected.push(RejectedKey {
                    key: entry_key,
                    shape,
                    reason,
                });
                continue;
            }

            for (name, raw_value) in entry_fields {
                if is_identity_echo(kind, name) {
                    continue;
                }
                let source_key = format!("{}[{}]", entry_key, name);
                let Some(field) = OverlayField::from_name(name) else {
                    rejected.push(RejectedKey {
                        key: source_key,
                        shape,
                        reason: format!("unknown field {:?}", name),
                    });
                    continue;
                };
                if !field.applies_to(kind) {
                    rejected.push(RejectedKey {
                        key: source_key,
                        shape,
                        reason: inapplicable_field(field, kind),
                    });
                    continue;
                }
                match field.coerce(raw_value) {
                    Ok(value) => accumulator.insert(dimension, field, value, source_key)?,
                    Err(reason) => rejected.push(RejectedKey {
                        key: source_key,
                        shape,
                        reason,
                    }),
                }
            }
        }
    }

    Ok(())
}

fn decode_flat(
    raw: &Map<String, Value>,
    scheme: IdScheme,
    index: &CheckInIndex,
    accumulator: &mut ShapeAccumulator,
    rejected: &mut Vec<RejectedKey>,
) -> Result<()> {
    let shape = match scheme {
        IdScheme::CheckIn => PayloadShape::FlatByCheckIn,
        IdScheme::Dimension => PayloadShape::FlatByDimension,
    };

    for (key, raw_value) in raw {
        let flat = match parse_flat_key(key) {
            FlatKeyMatch::NotOverlay => continue,
            FlatKeyMatch::Malformed {
                scheme: key_scheme,
                reason,
            } => {
                if key_scheme == scheme {
                    rejected.push(RejectedKey {
                        key: key.clone(),
                        shape,
                        reason,
                    });
                }
                continue;
            }
            FlatKeyMatch::Key(flat) if flat.scheme == scheme => flat,
            FlatKeyMatch::Key(_) => continue,
        };

        let dimension = match scheme {
            IdScheme::Dimension => DimensionKey::new(flat.kind, flat.id),
            IdScheme::CheckIn => match index.resolve(flat.kind, flat.id) {
                Some(owner) => owner,
                None => {
                    rejected.push(RejectedKey {
                        key: key.clone(),
                        shape,
                        reason: format!(
                            "{} check-in {} is not a check-in of this teammate",
                            flat.kind.to_db_string(),
                            flat.id
                        ),
                    });
                    continue;
                }
            },
        };

        if !flat.field.applies_to(dimension.kind) {
            rejected.push(RejectedKey {
                key: key.clone(),
                shape,
                reason: inapplicable_field(flat.field, dimension.kind),
            });
            continue;
        }

        match flat.field.coerce(raw_value) {
            Ok(value) => accumulator.insert(dimension, flat.field, value, key.clone())?,
            Err(reason) => rejected.push(RejectedKey {
                key: key.clone(),
                shape,
                reason,
            }),
        }
    }

    Ok(())
}

fn inapplicable_field(field: OverlayField, kind: DimensionKind) -> String {
    format!(
        "{} does not apply to {} check-ins",
        field.canonical_name(),
        kind.to_db_string()
    )
}

fn parse_id(text: &str) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Form fields that restate which record a nested entry is about
fn is_identity_echo(kind: DimensionKind, name: &str) -> bool {
    name == "id" || name == "check_in_id" || name == dimension_id_field(kind)
}

fn dimension_id_field(kind: DimensionKind) -> &'static str {
    match kind {
        DimensionKind::Position => "position_id",
        DimensionKind::Assignment => "assignment_id",
        DimensionKind::Ability => "ability_id",
        DimensionKind::Aspiration => "aspiration_id",
    }
}

/// A nested entry that names a different dimension, or a check-in belonging
/// to a different dimension, than the id it is filed under is rejected whole.
fn verify_identity_echoes(
    dimension: DimensionKey,
    entry: &Map<String, Value>,
    index: &CheckInIndex,
) -> std::result::Result<(), String> {
    for name in ["id", dimension_id_field(dimension.kind)] {
        if let Some(echo) = entry.get(name).and_then(echo_id) {
            if echo != dimension.id {
                return Err(format!("{}={} does not match {}", name, echo, dimension));
            }
        }
    }

    if let Some(check_in_id) = entry.get("check_in_id").and_then(echo_id) {
        match index.resolve(dimension.kind, check_in_id) {
            Some(owner) if owner == dimension => {}
            Some(owner) => {
                return Err(format!(
                    "check-in {} belongs to {}, not {}",
                    check_in_id, owner, dimension
                ))
            }
            None => {
                return Err(format!(
                    "check-in {} is not a check-in of this teammate",
                    check_in_id
                ))
            }
        }
    }

    Ok(())
}

fn echo_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => parse_id(s.trim()),
        _ => None,
    }
}
