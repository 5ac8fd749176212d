//! Named-field input maps.
//!
//! Upstream form layers hand the engine loosely typed mappings where a
//! number may arrive as `7.5` or `"7.5"`. `FieldMap` is the single place
//! where those values become `Decimal` (for the deterministic calculator)
//! or `f64` (for the Monte Carlo simulator).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::PlannerError;
use crate::types::{Age, Money};
use crate::PlannerResult;

const MAX_AGE: u32 = 150;

/// Whole years from `start` to `end`. An end before the start is rejected
/// against `end_field`.
pub(crate) fn span_years(
    start: Age,
    end: Age,
    start_field: &str,
    end_field: &str,
) -> PlannerResult<u32> {
    end.checked_sub(start).ok_or_else(|| {
        PlannerError::invalid(
            end_field,
            format!("{end_field} ({end}) must not be before {start_field} ({start})"),
        )
    })
}

/// A mapping of field name to numeric (or numeric-string) value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// True if the field carries a value. Null and blank strings count as absent.
    pub fn has(&self, field: &str) -> bool {
        self.present(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Key-sorted JSON rendering, stable for identical contents.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    fn present(&self, field: &str) -> Option<&Value> {
        match self.0.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(v) => Some(v),
        }
    }

    // -----------------------------------------------------------------------
    // Decimal domain
    // -----------------------------------------------------------------------

    /// Required decimal field.
    pub fn decimal(&self, field: &str) -> PlannerResult<Decimal> {
        match self.present(field) {
            Some(v) => to_decimal(field, v),
            None => Err(PlannerError::MissingField {
                field: field.to_string(),
            }),
        }
    }

    /// Optional decimal field, zero when absent.
    pub fn optional_decimal(&self, field: &str) -> PlannerResult<Decimal> {
        match self.present(field) {
            Some(v) => to_decimal(field, v),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Required monetary amount, must be >= 0.
    pub fn money(&self, field: &str) -> PlannerResult<Money> {
        non_negative(field, self.decimal(field)?)
    }

    /// Optional monetary amount, zero when absent, must be >= 0.
    pub fn optional_money(&self, field: &str) -> PlannerResult<Money> {
        non_negative(field, self.optional_decimal(field)?)
    }

    /// Required whole-year age.
    pub fn age(&self, field: &str) -> PlannerResult<Age> {
        let value = self.decimal(field)?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PlannerError::invalid(field, "Age cannot be negative"));
        }
        if !value.fract().is_zero() {
            return Err(PlannerError::invalid(field, "Age must be a whole number of years"));
        }
        match value.to_u32() {
            Some(age) if age <= MAX_AGE => Ok(age),
            _ => Err(PlannerError::invalid(
                field,
                format!("Age must be between 0 and {MAX_AGE}"),
            )),
        }
    }

    /// Whole years from `start_field` to `end_field`; an end before the start is rejected.
    pub fn years_between(&self, start_field: &str, end_field: &str) -> PlannerResult<u32> {
        span_years(self.age(start_field)?, self.age(end_field)?, start_field, end_field)
    }

    /// Optional non-negative integer (run counts, seeds).
    pub fn optional_count(&self, field: &str) -> PlannerResult<Option<u64>> {
        let Some(v) = self.present(field) else {
            return Ok(None);
        };
        let value = to_decimal(field, v)?;
        if !value.fract().is_zero() {
            return Err(PlannerError::invalid(field, "Must be a whole number"));
        }
        value
            .to_u64()
            .map(Some)
            .ok_or_else(|| PlannerError::invalid(field, "Must be a non-negative whole number"))
    }

    // -----------------------------------------------------------------------
    // Float domain (Monte Carlo boundary)
    // -----------------------------------------------------------------------

    /// Required field converted to f64 for simulation.
    pub fn float(&self, field: &str) -> PlannerResult<f64> {
        decimal_to_f64(field, self.decimal(field)?)
    }

    /// Optional field converted to f64, `default` when absent.
    pub fn optional_float(&self, field: &str, default: f64) -> PlannerResult<f64> {
        match self.present(field) {
            Some(v) => decimal_to_f64(field, to_decimal(field, v)?),
            None => Ok(default),
        }
    }
}

impl FromIterator<(String, Value)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        FieldMap(iter.into_iter().collect())
    }
}

impl TryFrom<Value> for FieldMap {
    type Error = PlannerError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(PlannerError::invalid(
                "input",
                format!("Expected an object of named fields, got {other}"),
            )),
        }
    }
}

fn to_decimal(field: &str, value: &Value) -> PlannerResult<Decimal> {
    let parsed = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                parse_numeric_str(&n.to_string())
            }
        }
        Value::String(s) => parse_numeric_str(s.trim()),
        _ => None,
    };
    parsed.ok_or_else(|| PlannerError::invalid(field, format!("'{value}' is not a number")))
}

fn parse_numeric_str(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn non_negative(field: &str, value: Decimal) -> PlannerResult<Decimal> {
    if value < Decimal::ZERO {
        return Err(PlannerError::invalid(field, "Amount cannot be negative"));
    }
    Ok(value)
}

fn decimal_to_f64(field: &str, value: Decimal) -> PlannerResult<f64> {
    value
        .to_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| PlannerError::invalid(field, "Value is not representable as f64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_numbers_and_numeric_strings_agree() {
        let fields = FieldMap::new()
            .with("a", 7.5)
            .with("b", "7.5")
            .with("c", " 7.5 ");
        assert_eq!(fields.decimal("a").unwrap(), dec!(7.5));
        assert_eq!(fields.decimal("b").unwrap(), dec!(7.5));
        assert_eq!(fields.decimal("c").unwrap(), dec!(7.5));
    }

    #[test]
    fn test_missing_field_is_distinct_from_invalid() {
        let fields = FieldMap::new().with("bad", "seven");
        assert!(matches!(
            fields.decimal("absent"),
            Err(PlannerError::MissingField { .. })
        ));
        assert!(matches!(
            fields.decimal("bad"),
            Err(PlannerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_null_and_blank_are_absent() {
        let fields: FieldMap = FieldMap::try_from(json!({"x": null, "y": ""})).unwrap();
        assert!(!fields.has("x"));
        assert!(!fields.has("y"));
        assert_eq!(fields.optional_decimal("x").unwrap(), Decimal::ZERO);
        assert!(fields.decimal("y").is_err());
    }

    #[test]
    fn test_age_must_be_whole_and_non_negative() {
        let fields = FieldMap::new()
            .with("ok", 65)
            .with("frac", 65.5)
            .with("neg", -1)
            .with("huge", 400);
        assert_eq!(fields.age("ok").unwrap(), 65);
        assert!(fields.age("frac").is_err());
        assert!(fields.age("neg").is_err());
        assert!(fields.age("huge").is_err());
    }

    #[test]
    fn test_negative_money_rejected() {
        let fields = FieldMap::new().with("savings", -100);
        assert!(fields.money("savings").is_err());
        assert!(fields.optional_money("savings").is_err());
    }

    #[test]
    fn test_bool_is_not_numeric() {
        let fields = FieldMap::new().with("flag", true);
        assert!(fields.decimal("flag").is_err());
    }

    #[test]
    fn test_optional_float_default() {
        let fields = FieldMap::new().with("variance", "12.5");
        assert_eq!(fields.optional_float("variance", 10.0).unwrap(), 12.5);
        assert_eq!(fields.optional_float("missing", 10.0).unwrap(), 10.0);
    }

    #[test]
    fn test_canonical_json_is_key_sorted() {
        let a = FieldMap::new().with("b", 1).with("a", 2);
        let b = FieldMap::new().with("a", 2).with("b", 1);
        assert_eq!(a.canonical_json(), b.canonical_json());
        assert_eq!(a.canonical_json(), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(FieldMap::try_from(json!([1, 2])).is_err());
    }
}
