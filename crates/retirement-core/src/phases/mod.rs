//! Deterministic phase calculator.
//!
//! Every phase compounds monthly and applies the same per-period rule:
//! growth on the opening balance first, then the period's net cash flow.
//! The Monte Carlo simulator follows the identical order.

pub mod accumulation;
pub mod active;
pub mod late;
pub mod phased;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
pub(crate) use crate::fields::span_years;
use crate::fields::FieldMap;
use crate::types::{Age, ComputationOutput, Money, Percent, PhaseKind, PhaseYear, Rate, PERIODS_PER_YEAR};
use crate::PlannerResult;

pub use accumulation::{calculate_accumulation, AccumulationInput, AccumulationResult};
pub use active::{calculate_active_retirement, ActiveRetirementInput, ActiveRetirementResult};
pub use late::{calculate_late_retirement, LateRetirementInput, LateRetirementResult};
pub use phased::{calculate_phased_retirement, PhasedRetirementInput, PhasedRetirementResult};

/// Returns above this are flagged as unrealistic (historical equity average is 7-10%).
const REALISTIC_RETURN_CEILING: Decimal = dec!(15);

// ---------------------------------------------------------------------------
// Shared balance-update rule
// ---------------------------------------------------------------------------

/// Convert an annual percentage into a per-month fractional rate.
pub fn periodic_rate(annual: Percent) -> Rate {
    annual / dec!(100) / Decimal::from(PERIODS_PER_YEAR)
}

/// Apply one period of growth to `balance`, returning the gain.
pub(crate) fn grow(balance: &mut Money, rate: Rate) -> Money {
    let gain = *balance * rate;
    *balance += gain;
    gain
}

pub(crate) fn validate_return(field: &str, annual: Percent) -> PlannerResult<()> {
    if annual <= dec!(-100) {
        return Err(PlannerError::invalid(field, "Rate must be greater than -100%"));
    }
    Ok(())
}

pub(crate) fn validate_non_negative(field: &str, amount: Money) -> PlannerResult<()> {
    if amount < Decimal::ZERO {
        return Err(PlannerError::invalid(field, "Amount cannot be negative"));
    }
    Ok(())
}

pub(crate) fn return_warnings(expected_return: Percent, warnings: &mut Vec<String>) {
    if expected_return > REALISTIC_RETURN_CEILING {
        warnings.push(format!(
            "Expected return of {expected_return}% is unrealistic; historical market average is 7-10%"
        ));
    }
}

/// Rolls monthly activity up into one `PhaseYear` row per year of age.
pub(crate) struct YearLedger {
    start_age: Age,
    rows: Vec<PhaseYear>,
    open: Option<PhaseYear>,
}

impl YearLedger {
    pub(crate) fn new(start_age: Age, years: u32) -> Self {
        Self {
            start_age,
            rows: Vec::with_capacity(years as usize),
            open: None,
        }
    }

    pub(crate) fn record(
        &mut self,
        period: u32,
        beginning: Money,
        contribution: Money,
        withdrawal: Money,
        gain: Money,
        ending: Money,
    ) {
        let start_age = self.start_age;
        let row = self.open.get_or_insert_with(|| PhaseYear {
            age: start_age + period / PERIODS_PER_YEAR,
            beginning_balance: beginning,
            contributions: Decimal::ZERO,
            withdrawals: Decimal::ZERO,
            investment_return: Decimal::ZERO,
            ending_balance: beginning,
        });
        row.contributions += contribution;
        row.withdrawals += withdrawal;
        row.investment_return += gain;
        row.ending_balance = ending;

        if (period + 1) % PERIODS_PER_YEAR == 0 {
            if let Some(row) = self.open.take() {
                self.rows.push(row);
            }
        }
    }

    /// Close any partial year (a phase that depleted mid-year).
    pub(crate) fn finish(mut self) -> Vec<PhaseYear> {
        if let Some(row) = self.open.take() {
            self.rows.push(row);
        }
        self.rows
    }
}

// ---------------------------------------------------------------------------
// Phase dispatch
// ---------------------------------------------------------------------------

/// Result of any single phase, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum PhaseResult {
    Accumulation(AccumulationResult),
    PhasedRetirement(PhasedRetirementResult),
    ActiveRetirement(ActiveRetirementResult),
    LateRetirement(LateRetirementResult),
}

impl PhaseResult {
    pub fn kind(&self) -> PhaseKind {
        match self {
            PhaseResult::Accumulation(_) => PhaseKind::Accumulation,
            PhaseResult::PhasedRetirement(_) => PhaseKind::PhasedRetirement,
            PhaseResult::ActiveRetirement(_) => PhaseKind::ActiveRetirement,
            PhaseResult::LateRetirement(_) => PhaseKind::LateRetirement,
        }
    }

    /// Portfolio value at the end of the phase.
    pub fn ending_portfolio(&self) -> Money {
        match self {
            PhaseResult::Accumulation(r) => r.future_value,
            PhaseResult::PhasedRetirement(r) => r.ending_portfolio,
            PhaseResult::ActiveRetirement(r) => r.ending_portfolio,
            PhaseResult::LateRetirement(r) => r.ending_portfolio,
        }
    }

    pub fn duration_years(&self) -> u32 {
        match self {
            PhaseResult::Accumulation(r) => r.years_to_retirement,
            PhaseResult::PhasedRetirement(r) => r.phase_duration_years,
            PhaseResult::ActiveRetirement(r) => r.phase_duration_years,
            PhaseResult::LateRetirement(r) => r.phase_duration_years,
        }
    }

    /// Age at which the portfolio ran out, for phases that track depletion.
    pub fn depletion_age(&self) -> Option<Age> {
        match self {
            PhaseResult::ActiveRetirement(r) => r.portfolio_depletion_age,
            PhaseResult::LateRetirement(r) => r.portfolio_depletion_age,
            _ => None,
        }
    }

    pub fn year_by_year(&self) -> &[PhaseYear] {
        match self {
            PhaseResult::Accumulation(r) => &r.year_by_year,
            PhaseResult::PhasedRetirement(r) => &r.year_by_year,
            PhaseResult::ActiveRetirement(r) => &r.year_by_year,
            PhaseResult::LateRetirement(r) => &r.year_by_year,
        }
    }
}

/// Parse `fields` for the given phase and run its calculation.
pub fn calculate_phase(
    kind: PhaseKind,
    fields: &FieldMap,
) -> PlannerResult<ComputationOutput<PhaseResult>> {
    let output = match kind {
        PhaseKind::Accumulation => {
            calculate_accumulation(&AccumulationInput::from_fields(fields)?)?
                .map(PhaseResult::Accumulation)
        }
        PhaseKind::PhasedRetirement => {
            calculate_phased_retirement(&PhasedRetirementInput::from_fields(fields)?)?
                .map(PhaseResult::PhasedRetirement)
        }
        PhaseKind::ActiveRetirement => {
            calculate_active_retirement(&ActiveRetirementInput::from_fields(fields)?)?
                .map(PhaseResult::ActiveRetirement)
        }
        PhaseKind::LateRetirement => {
            calculate_late_retirement(&LateRetirementInput::from_fields(fields)?)?
                .map(PhaseResult::LateRetirement)
        }
    };
    Ok(output)
}
