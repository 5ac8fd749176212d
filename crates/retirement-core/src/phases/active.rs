use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{grow, periodic_rate, return_warnings, span_years, validate_non_negative, validate_return, YearLedger};
use crate::fields::FieldMap;
use crate::types::{with_metadata, Age, ComputationOutput, Money, Percent, PhaseYear, PERIODS_PER_YEAR};
use crate::PlannerResult;

/// Input for the early, active years of full retirement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveRetirementInput {
    pub starting_portfolio: Money,
    pub active_retirement_start_age: Age,
    pub active_retirement_end_age: Age,
    pub annual_expenses: Money,
    pub annual_healthcare_costs: Money,
    #[serde(default)]
    pub social_security_annual: Money,
    #[serde(default)]
    pub pension_annual: Money,
    pub expected_return: Percent,
    pub inflation_rate: Percent,
}

impl ActiveRetirementInput {
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        Ok(Self {
            starting_portfolio: fields.money("starting_portfolio")?,
            active_retirement_start_age: fields.age("active_retirement_start_age")?,
            active_retirement_end_age: fields.age("active_retirement_end_age")?,
            annual_expenses: fields.money("annual_expenses")?,
            annual_healthcare_costs: fields.money("annual_healthcare_costs")?,
            social_security_annual: fields.optional_money("social_security_annual")?,
            pension_annual: fields.optional_money("pension_annual")?,
            expected_return: fields.decimal("expected_return")?,
            inflation_rate: fields.decimal("inflation_rate")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRetirementResult {
    pub phase_duration_years: u32,
    pub starting_portfolio: Money,
    pub ending_portfolio: Money,
    pub total_withdrawals: Money,
    pub total_social_security: Money,
    pub total_pension: Money,
    pub total_investment_gains: Money,
    pub average_annual_withdrawal: Money,
    /// Age at which the portfolio ran out, if it did.
    pub portfolio_depletion_age: Option<Age>,
    pub year_by_year: Vec<PhaseYear>,
}

/// Project active retirement, drawing inflation-adjusted living and
/// healthcare costs (net of Social Security and pension) from the portfolio.
///
/// When a month's need meets or exceeds the remaining balance the balance
/// is withdrawn in full, the depletion age is recorded and the projection
/// stops.
pub fn calculate_active_retirement(
    input: &ActiveRetirementInput,
) -> PlannerResult<ComputationOutput<ActiveRetirementResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = span_years(
        input.active_retirement_start_age,
        input.active_retirement_end_age,
        "active_retirement_start_age",
        "active_retirement_end_age",
    )?;
    validate_non_negative("starting_portfolio", input.starting_portfolio)?;
    validate_non_negative("annual_expenses", input.annual_expenses)?;
    validate_non_negative("annual_healthcare_costs", input.annual_healthcare_costs)?;
    validate_non_negative("social_security_annual", input.social_security_annual)?;
    validate_non_negative("pension_annual", input.pension_annual)?;
    validate_return("expected_return", input.expected_return)?;
    validate_return("inflation_rate", input.inflation_rate)?;
    return_warnings(input.expected_return, &mut warnings);

    let periods = Decimal::from(PERIODS_PER_YEAR);
    let months = years * PERIODS_PER_YEAR;
    let monthly_rate = periodic_rate(input.expected_return);
    let monthly_inflation = periodic_rate(input.inflation_rate);
    let monthly_ss = input.social_security_annual / periods;
    let monthly_pension = input.pension_annual / periods;

    let mut balance = input.starting_portfolio;
    let mut expenses = input.annual_expenses;
    let mut healthcare = input.annual_healthcare_costs;
    let mut total_withdrawals = Decimal::ZERO;
    let mut total_ss = Decimal::ZERO;
    let mut total_pension = Decimal::ZERO;
    let mut total_gains = Decimal::ZERO;
    let mut depletion_age: Option<Age> = None;
    let mut ledger = YearLedger::new(input.active_retirement_start_age, years);

    for period in 0..months {
        let beginning = balance;
        let gain = grow(&mut balance, monthly_rate);
        total_gains += gain;

        total_ss += monthly_ss;
        total_pension += monthly_pension;

        let costs = (expenses + healthcare) / periods;
        let need = (costs - monthly_ss - monthly_pension).max(Decimal::ZERO);

        let withdrawal = if need > Decimal::ZERO && need >= balance {
            depletion_age = Some(input.active_retirement_start_age + period / PERIODS_PER_YEAR);
            std::mem::replace(&mut balance, Decimal::ZERO)
        } else {
            balance -= need;
            need
        };
        total_withdrawals += withdrawal;
        ledger.record(period, beginning, Decimal::ZERO, withdrawal, gain, balance);

        expenses *= Decimal::ONE + monthly_inflation;
        healthcare *= Decimal::ONE + monthly_inflation;

        if depletion_age.is_some() {
            break;
        }
    }

    if let Some(age) = depletion_age {
        warn!("active retirement portfolio depleted at age {age}");
        warnings.push(format!(
            "Portfolio depleted at age {age}, before the phase ends at {}",
            input.active_retirement_end_age
        ));
    }

    let average_annual_withdrawal = if years > 0 {
        total_withdrawals / Decimal::from(years)
    } else {
        Decimal::ZERO
    };

    let output = ActiveRetirementResult {
        phase_duration_years: years,
        starting_portfolio: input.starting_portfolio,
        ending_portfolio: balance,
        total_withdrawals,
        total_social_security: total_ss,
        total_pension,
        total_investment_gains: total_gains,
        average_annual_withdrawal,
        portfolio_depletion_age: depletion_age,
        year_by_year: ledger.finish(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Active retirement (monthly compounding and inflation, growth then withdrawal)",
        &serde_json::json!({
            "start_age": input.active_retirement_start_age,
            "end_age": input.active_retirement_end_age,
            "expected_return_pct": input.expected_return.to_string(),
            "inflation_pct": input.inflation_rate.to_string(),
            "months": months,
        }),
        warnings,
        elapsed,
        output,
    ))
}
