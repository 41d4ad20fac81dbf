//! Overlay field names, value coercion and the canonical field set

use serde::Serialize;
use serde_json::Value;

use crate::model::DimensionKind;

/// Every field an overlay may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayField {
    SharedNotes,
    OfficialRating,
    EmployeeRating,
    ManagerRating,
    ActualEnergyPercentage,
    AnticipatedEnergyPercentage,
    EmployeePrivateNotes,
    ManagerPrivateNotes,
    EmployeeComplete,
    ManagerComplete,
    CloseRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Integer,
    Toggle,
}

impl OverlayField {
    /// Resolve a submitted field name, including aliases
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "shared_notes" => Some(Self::SharedNotes),
            "official_rating" | "final_rating" => Some(Self::OfficialRating),
            "employee_rating" => Some(Self::EmployeeRating),
            "manager_rating" => Some(Self::ManagerRating),
            "actual_energy_percentage" => Some(Self::ActualEnergyPercentage),
            "anticipated_energy_percentage" => Some(Self::AnticipatedEnergyPercentage),
            "employee_private_notes" => Some(Self::EmployeePrivateNotes),
            "manager_private_notes" => Some(Self::ManagerPrivateNotes),
            "employee_complete" => Some(Self::EmployeeComplete),
            "manager_complete" => Some(Self::ManagerComplete),
            "close_rating" => Some(Self::CloseRating),
            _ => None,
        }
    }

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::SharedNotes => "shared_notes",
            Self::OfficialRating => "official_rating",
            Self::EmployeeRating => "employee_rating",
            Self::ManagerRating => "manager_rating",
            Self::ActualEnergyPercentage => "actual_energy_percentage",
            Self::AnticipatedEnergyPercentage => "anticipated_energy_percentage",
            Self::EmployeePrivateNotes => "employee_private_notes",
            Self::ManagerPrivateNotes => "manager_private_notes",
            Self::EmployeeComplete => "employee_complete",
            Self::ManagerComplete => "manager_complete",
            Self::CloseRating => "close_rating",
        }
    }

    /// Tenure fields only exist on assignments; everything else edits a check-in
    pub fn applies_to(&self, kind: DimensionKind) -> bool {
        match self {
            Self::AnticipatedEnergyPercentage => kind == DimensionKind::Assignment,
            _ => true,
        }
    }

    fn value_kind(&self) -> ValueKind {
        match self {
            Self::SharedNotes
            | Self::OfficialRating
            | Self::EmployeeRating
            | Self::ManagerRating
            | Self::EmployeePrivateNotes
            | Self::ManagerPrivateNotes => ValueKind::Text,
            Self::ActualEnergyPercentage | Self::AnticipatedEnergyPercentage => ValueKind::Integer,
            Self::EmployeeComplete | Self::ManagerComplete | Self::CloseRating => ValueKind::Toggle,
        }
    }

    /// Coerce a submitted JSON value to this field's type
    ///
    /// Form submissions send everything as strings, so numeric strings and
    /// checkbox strings are accepted alongside native JSON types.
    pub fn coerce(&self, raw: &Value) -> Result<OverlayValue, String> {
        match (self.value_kind(), raw) {
            (ValueKind::Text, Value::String(s)) => Ok(OverlayValue::Text(s.clone())),
            (ValueKind::Text, Value::Number(n)) => Ok(OverlayValue::Text(n.to_string())),

            (ValueKind::Integer, Value::Number(n)) => n
                .as_i64()
                .map(OverlayValue::Integer)
                .ok_or_else(|| format!("{} is not an integer", n)),
            (ValueKind::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(OverlayValue::Integer)
                .map_err(|_| format!("{:?} is not an integer", s)),

            (ValueKind::Toggle, Value::Bool(b)) => Ok(OverlayValue::Toggle(*b)),
            (ValueKind::Toggle, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(OverlayValue::Toggle(false)),
                Some(1) => Ok(OverlayValue::Toggle(true)),
                _ => Err(format!("{} is not a checkbox value", n)),
            },
            (ValueKind::Toggle, Value::String(s)) => parse_toggle(s)
                .map(OverlayValue::Toggle)
                .ok_or_else(|| format!("{:?} is not a checkbox value", s)),

            (_, other) => Err(format!(
                "unsupported {} value for {}",
                json_type_name(other),
                self.canonical_name()
            )),
        }
    }
}

fn parse_toggle(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A coerced overlay value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayValue {
    Text(String),
    Integer(i64),
    Toggle(bool),
}

impl std::fmt::Display for OverlayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayValue::Text(s) => f.write_str(s),
            OverlayValue::Integer(n) => write!(f, "{}", n),
            OverlayValue::Toggle(b) => write!(f, "{}", b),
        }
    }
}

/// Proposed edits for one dimension instance
///
/// `None` means "not mentioned": the merge leaves the field as it is.
/// `Some(false)` on a completion toggle is an explicit "uncomplete".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayFields {
    pub shared_notes: Option<String>,
    pub official_rating: Option<String>,
    pub employee_rating: Option<String>,
    pub manager_rating: Option<String>,
    pub actual_energy_percentage: Option<i64>,
    pub anticipated_energy_percentage: Option<i64>,
    pub employee_private_notes: Option<String>,
    pub manager_private_notes: Option<String>,
    pub employee_complete: Option<bool>,
    pub manager_complete: Option<bool>,
    pub close_rating: Option<bool>,
}

impl OverlayFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True when any check-in level field is mentioned
    pub fn touches_check_in(&self) -> bool {
        let check_in_only = Self {
            anticipated_energy_percentage: None,
            ..self.clone()
        };
        !check_in_only.is_empty()
    }

    /// Store a coerced value; values always match the field's kind after `coerce`
    pub(crate) fn set(&mut self, field: OverlayField, value: OverlayValue) {
        use OverlayField as F;
        use OverlayValue as V;

        match (field, value) {
            (F::SharedNotes, V::Text(v)) => self.shared_notes = Some(v),
            (F::OfficialRating, V::Text(v)) => self.official_rating = Some(v),
            (F::EmployeeRating, V::Text(v)) => self.employee_rating = Some(v),
            (F::ManagerRating, V::Text(v)) => self.manager_rating = Some(v),
            (F::EmployeePrivateNotes, V::Text(v)) => self.employee_private_notes = Some(v),
            (F::ManagerPrivateNotes, V::Text(v)) => self.manager_private_notes = Some(v),
            (F::ActualEnergyPercentage, V::Integer(v)) => self.actual_energy_percentage = Some(v),
            (F::AnticipatedEnergyPercentage, V::Integer(v)) => {
                self.anticipated_energy_percentage = Some(v)
            }
            (F::EmployeeComplete, V::Toggle(v)) => self.employee_complete = Some(v),
            (F::ManagerComplete, V::Toggle(v)) => self.manager_complete = Some(v),
            (F::CloseRating, V::Toggle(v)) => self.close_rating = Some(v),
            (field, value) => {
                tracing::debug!(?field, ?value, "Ignoring overlay value of mismatched type")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_final_rating_aliases_official_rating() {
        assert_eq!(
            OverlayField::from_name("final_rating"),
            Some(OverlayField::OfficialRating)
        );
        assert_eq!(OverlayField::OfficialRating.canonical_name(), "official_rating");
        assert_eq!(OverlayField::from_name("rating"), None);
    }

    #[test]
    fn test_anticipated_energy_applies_to_assignments_only() {
        let field = OverlayField::AnticipatedEnergyPercentage;
        assert!(field.applies_to(DimensionKind::Assignment));
        assert!(!field.applies_to(DimensionKind::Position));
        assert!(!field.applies_to(DimensionKind::Aspiration));
        assert!(OverlayField::SharedNotes.applies_to(DimensionKind::Position));
    }

    #[test]
    fn test_toggle_accepts_form_strings() {
        let field = OverlayField::CloseRating;
        for (raw, expected) in [
            (json!("1"), true),
            (json!("true"), true),
            (json!("On"), true),
            (json!("0"), false),
            (json!("false"), false),
            (json!(""), false),
            (json!(true), true),
            (json!(0), false),
        ] {
            assert_eq!(field.coerce(&raw), Ok(OverlayValue::Toggle(expected)), "{}", raw);
        }
        assert!(field.coerce(&json!("maybe")).is_err());
        assert!(field.coerce(&json!(2)).is_err());
    }

    #[test]
    fn test_integer_accepts_numeric_strings() {
        let field = OverlayField::ActualEnergyPercentage;
        assert_eq!(field.coerce(&json!(" 40 ")), Ok(OverlayValue::Integer(40)));
        assert_eq!(field.coerce(&json!(35)), Ok(OverlayValue::Integer(35)));
        assert!(field.coerce(&json!("forty")).is_err());
        assert!(field.coerce(&json!(12.5)).is_err());
    }

    #[test]
    fn test_text_rejects_structured_values() {
        let field = OverlayField::SharedNotes;
        assert_eq!(
            field.coerce(&json!("")),
            Ok(OverlayValue::Text(String::new()))
        );
        assert!(field.coerce(&json!({"nested": true})).is_err());
        assert!(field.coerce(&Value::Null).is_err());
    }

    #[test]
    fn test_touches_check_in() {
        let tenure_only = OverlayFields {
            anticipated_energy_percentage: Some(30),
            ..OverlayFields::default()
        };
        assert!(!tenure_only.touches_check_in());

        let mut with_notes = tenure_only.clone();
        with_notes.set(OverlayField::SharedNotes, OverlayValue::Text("x".into()));
        assert!(with_notes.touches_check_in());
    }
}
