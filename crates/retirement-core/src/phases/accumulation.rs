use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{grow, periodic_rate, return_warnings, span_years, validate_non_negative, validate_return, YearLedger};
use crate::fields::FieldMap;
use crate::types::{with_metadata, Age, ComputationOutput, Money, Percent, PhaseYear, PERIODS_PER_YEAR};
use crate::PlannerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the working-years accumulation phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccumulationInput {
    pub current_age: Age,
    pub retirement_start_age: Age,
    pub current_savings: Money,
    pub monthly_contribution: Money,
    /// Employer match as a percentage of the personal contribution.
    #[serde(default)]
    pub employer_match_rate: Percent,
    pub expected_return: Percent,
    /// Applied to the contribution once every 12 months.
    #[serde(default)]
    pub annual_salary_increase: Percent,
}

impl AccumulationInput {
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        Ok(Self {
            current_age: fields.age("current_age")?,
            retirement_start_age: fields.age("retirement_start_age")?,
            current_savings: fields.money("current_savings")?,
            monthly_contribution: fields.money("monthly_contribution")?,
            employer_match_rate: fields.optional_decimal("employer_match_rate")?,
            expected_return: fields.decimal("expected_return")?,
            annual_salary_increase: fields.optional_decimal("annual_salary_increase")?,
        })
    }
}

/// Accumulation-phase summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulationResult {
    pub years_to_retirement: u32,
    pub total_personal_contributions: Money,
    pub total_employer_contributions: Money,
    pub future_value: Money,
    pub investment_gains: Money,
    /// Personal contribution made in the final month, after raises.
    pub final_monthly_contribution: Money,
    pub year_by_year: Vec<PhaseYear>,
}

impl AccumulationResult {
    pub fn total_contributions(&self) -> Money {
        self.total_personal_contributions + self.total_employer_contributions
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Project savings from the current age to the retirement start age.
///
/// Each month the balance earns `expected_return / 12`, then the personal
/// contribution and employer match are added. The personal contribution is
/// raised by `annual_salary_increase` at the start of every year after the
/// first, and the match is recomputed from the raised amount.
pub fn calculate_accumulation(
    input: &AccumulationInput,
) -> PlannerResult<ComputationOutput<AccumulationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    // --- Validation ---
    let years = span_years(
        input.current_age,
        input.retirement_start_age,
        "current_age",
        "retirement_start_age",
    )?;
    validate_non_negative("current_savings", input.current_savings)?;
    validate_non_negative("monthly_contribution", input.monthly_contribution)?;
    validate_non_negative("employer_match_rate", input.employer_match_rate)?;
    validate_return("expected_return", input.expected_return)?;
    validate_return("annual_salary_increase", input.annual_salary_increase)?;
    return_warnings(input.expected_return, &mut warnings);

    let months = years * PERIODS_PER_YEAR;
    let monthly_rate = periodic_rate(input.expected_return);
    let match_fraction = input.employer_match_rate / dec!(100);
    let raise = input.annual_salary_increase / dec!(100);

    let mut balance = input.current_savings;
    let mut total_personal = Decimal::ZERO;
    let mut total_employer = Decimal::ZERO;
    let mut contribution = input.monthly_contribution;
    let mut ledger = YearLedger::new(input.current_age, years);

    for period in 0..months {
        if period > 0 && period % PERIODS_PER_YEAR == 0 && !raise.is_zero() {
            contribution *= Decimal::ONE + raise;
        }
        let employer_match = contribution * match_fraction;

        let beginning = balance;
        let gain = grow(&mut balance, monthly_rate);
        balance += contribution + employer_match;

        total_personal += contribution;
        total_employer += employer_match;
        ledger.record(period, beginning, contribution + employer_match, Decimal::ZERO, gain, balance);
    }

    if input.current_savings.is_zero() && input.monthly_contribution.is_zero() {
        warnings.push("No current savings or contributions; portfolio stays at zero".into());
    }

    let investment_gains = balance - (input.current_savings + total_personal + total_employer);

    let output = AccumulationResult {
        years_to_retirement: years,
        total_personal_contributions: total_personal,
        total_employer_contributions: total_employer,
        future_value: balance,
        investment_gains,
        final_monthly_contribution: contribution,
        year_by_year: ledger.finish(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Accumulation phase (monthly compounding, growth then contribution)",
        &serde_json::json!({
            "current_age": input.current_age,
            "retirement_start_age": input.retirement_start_age,
            "expected_return_pct": input.expected_return.to_string(),
            "employer_match_pct": input.employer_match_rate.to_string(),
            "annual_salary_increase_pct": input.annual_salary_increase.to_string(),
            "months": months,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
