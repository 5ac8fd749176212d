use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{grow, periodic_rate, return_warnings, span_years, validate_non_negative, validate_return, YearLedger};
use crate::fields::FieldMap;
use crate::types::{with_metadata, Age, ComputationOutput, Money, Percent, PhaseYear, PERIODS_PER_YEAR};
use crate::PlannerResult;

/// Input for the semi-retired transition phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasedRetirementInput {
    pub starting_portfolio: Money,
    pub phase_start_age: Age,
    pub full_retirement_age: Age,
    #[serde(default)]
    pub monthly_contribution: Money,
    #[serde(default)]
    pub annual_withdrawal: Money,
    /// Annual earnings from part-time work; spent directly, never invested.
    #[serde(default)]
    pub part_time_income: Money,
    pub expected_return: Percent,
}

impl PhasedRetirementInput {
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        Ok(Self {
            starting_portfolio: fields.money("starting_portfolio")?,
            phase_start_age: fields.age("phase_start_age")?,
            full_retirement_age: fields.age("full_retirement_age")?,
            monthly_contribution: fields.optional_money("monthly_contribution")?,
            annual_withdrawal: fields.optional_money("annual_withdrawal")?,
            part_time_income: fields.optional_money("part_time_income")?,
            expected_return: fields.decimal("expected_return")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasedRetirementResult {
    pub phase_duration_years: u32,
    pub starting_portfolio: Money,
    pub ending_portfolio: Money,
    pub total_contributions: Money,
    pub total_withdrawals: Money,
    pub total_part_time_income: Money,
    pub investment_gains: Money,
    pub net_change: Money,
    pub year_by_year: Vec<PhaseYear>,
}

/// Project the phased-retirement years.
///
/// There is no depletion check here: the phase assumes the withdrawal plan
/// is sized to last. A balance that goes negative is reported as a warning
/// and carried through unchanged.
pub fn calculate_phased_retirement(
    input: &PhasedRetirementInput,
) -> PlannerResult<ComputationOutput<PhasedRetirementResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = span_years(
        input.phase_start_age,
        input.full_retirement_age,
        "phase_start_age",
        "full_retirement_age",
    )?;
    validate_non_negative("starting_portfolio", input.starting_portfolio)?;
    validate_non_negative("monthly_contribution", input.monthly_contribution)?;
    validate_non_negative("annual_withdrawal", input.annual_withdrawal)?;
    validate_non_negative("part_time_income", input.part_time_income)?;
    validate_return("expected_return", input.expected_return)?;
    return_warnings(input.expected_return, &mut warnings);

    let months = years * PERIODS_PER_YEAR;
    let monthly_rate = periodic_rate(input.expected_return);
    let monthly_withdrawal = input.annual_withdrawal / Decimal::from(PERIODS_PER_YEAR);

    let mut balance = input.starting_portfolio;
    let mut total_contributions = Decimal::ZERO;
    let mut total_withdrawals = Decimal::ZERO;
    let mut total_gains = Decimal::ZERO;
    let mut first_negative_age: Option<Age> = None;
    let mut ledger = YearLedger::new(input.phase_start_age, years);

    for period in 0..months {
        let beginning = balance;
        let gain = grow(&mut balance, monthly_rate);
        balance += input.monthly_contribution;
        balance -= monthly_withdrawal;

        total_gains += gain;
        total_contributions += input.monthly_contribution;
        total_withdrawals += monthly_withdrawal;
        ledger.record(period, beginning, input.monthly_contribution, monthly_withdrawal, gain, balance);

        if balance < Decimal::ZERO && first_negative_age.is_none() {
            first_negative_age = Some(input.phase_start_age + period / PERIODS_PER_YEAR);
        }
    }

    if let Some(age) = first_negative_age {
        warn!("phased retirement balance went negative at age {age}");
        warnings.push(format!(
            "Withdrawals exceed the portfolio from age {age}; ending balance is negative"
        ));
    }

    let output = PhasedRetirementResult {
        phase_duration_years: years,
        starting_portfolio: input.starting_portfolio,
        ending_portfolio: balance,
        total_contributions,
        total_withdrawals,
        total_part_time_income: input.part_time_income * Decimal::from(years),
        investment_gains: total_gains,
        net_change: balance - input.starting_portfolio,
        year_by_year: ledger.finish(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Phased retirement (monthly compounding, growth then contribution and withdrawal)",
        &serde_json::json!({
            "phase_start_age": input.phase_start_age,
            "full_retirement_age": input.full_retirement_age,
            "expected_return_pct": input.expected_return.to_string(),
            "months": months,
        }),
        warnings,
        elapsed,
        output,
    ))
}
