use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Annual rates as entered by users, in percent (7.5 = 7.5%).
pub type Percent = Decimal;

/// Fractional per-period rates (0.00625 = 0.625% per month).
pub type Rate = Decimal;

/// Whole years of age
pub type Age = u32;

/// Compounding and cash-flow periods per year.
pub const PERIODS_PER_YEAR: u32 = 12;

/// The four sequential life stages a plan can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Accumulation,
    PhasedRetirement,
    ActiveRetirement,
    LateRetirement,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 4] = [
        PhaseKind::Accumulation,
        PhaseKind::PhasedRetirement,
        PhaseKind::ActiveRetirement,
        PhaseKind::LateRetirement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Accumulation => "accumulation",
            PhaseKind::PhasedRetirement => "phased_retirement",
            PhaseKind::ActiveRetirement => "active_retirement",
            PhaseKind::LateRetirement => "late_retirement",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| PlannerError::InvalidInput {
                field: "phase".into(),
                reason: format!("Unknown phase '{s}'"),
            })
    }
}

/// One year of a deterministic phase projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseYear {
    pub age: Age,
    pub beginning_balance: Money,
    pub contributions: Money,
    pub withdrawals: Money,
    pub investment_return: Money,
    pub ending_balance: Money,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

impl<T: Serialize> ComputationOutput<T> {
    /// Transform the result while keeping the envelope.
    pub fn map<U: Serialize>(self, f: impl FnOnce(T) -> U) -> ComputationOutput<U> {
        ComputationOutput {
            result: f(self.result),
            methodology: self.methodology,
            assumptions: self.assumptions,
            warnings: self.warnings,
            metadata: self.metadata,
        }
    }
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_kind_round_trips_through_str() {
        for kind in PhaseKind::ALL {
            assert_eq!(kind.as_str().parse::<PhaseKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_phase_rejected() {
        let err = "retired".parse::<PhaseKind>().unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_phase_kind_serde_matches_display() {
        let v = serde_json::to_value(PhaseKind::LateRetirement).unwrap();
        assert_eq!(v, serde_json::json!("late_retirement"));
    }
}
