use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{grow, periodic_rate, return_warnings, span_years, validate_non_negative, validate_return, YearLedger};
use crate::fields::FieldMap;
use crate::types::{with_metadata, Age, ComputationOutput, Money, Percent, PhaseYear, PERIODS_PER_YEAR};
use crate::PlannerResult;

/// Input for the final years, where healthcare and long-term care dominate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LateRetirementInput {
    pub starting_portfolio: Money,
    pub late_retirement_start_age: Age,
    pub life_expectancy: Age,
    pub annual_basic_expenses: Money,
    pub annual_healthcare_costs: Money,
    #[serde(default)]
    pub long_term_care_annual: Money,
    /// Annual benefit paid by long-term-care insurance.
    #[serde(default)]
    pub ltc_insurance_coverage: Money,
    #[serde(default)]
    pub social_security_annual: Money,
    pub expected_return: Percent,
    pub inflation_rate: Percent,
    #[serde(default)]
    pub desired_legacy: Money,
}

impl LateRetirementInput {
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        Ok(Self {
            starting_portfolio: fields.money("starting_portfolio")?,
            late_retirement_start_age: fields.age("late_retirement_start_age")?,
            life_expectancy: fields.age("life_expectancy")?,
            annual_basic_expenses: fields.money("annual_basic_expenses")?,
            annual_healthcare_costs: fields.money("annual_healthcare_costs")?,
            long_term_care_annual: fields.optional_money("long_term_care_annual")?,
            ltc_insurance_coverage: fields.optional_money("ltc_insurance_coverage")?,
            social_security_annual: fields.optional_money("social_security_annual")?,
            expected_return: fields.decimal("expected_return")?,
            inflation_rate: fields.decimal("inflation_rate")?,
            desired_legacy: fields.optional_money("desired_legacy")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LateRetirementResult {
    pub phase_duration_years: u32,
    pub starting_portfolio: Money,
    pub ending_portfolio: Money,
    pub total_withdrawals: Money,
    pub total_ltc_costs: Money,
    pub total_ltc_insurance_paid: Money,
    pub total_social_security: Money,
    pub net_ltc_out_of_pocket: Money,
    pub legacy_amount: Money,
    /// Never depleted and ending value meets the desired legacy.
    pub portfolio_sufficient: bool,
    pub portfolio_depletion_age: Option<Age>,
    pub year_by_year: Vec<PhaseYear>,
}

/// Project late retirement through life expectancy.
pub fn calculate_late_retirement(
    input: &LateRetirementInput,
) -> PlannerResult<ComputationOutput<LateRetirementResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let years = span_years(
        input.late_retirement_start_age,
        input.life_expectancy,
        "late_retirement_start_age",
        "life_expectancy",
    )?;
    validate_non_negative("starting_portfolio", input.starting_portfolio)?;
    validate_non_negative("annual_basic_expenses", input.annual_basic_expenses)?;
    validate_non_negative("annual_healthcare_costs", input.annual_healthcare_costs)?;
    validate_non_negative("long_term_care_annual", input.long_term_care_annual)?;
    validate_non_negative("ltc_insurance_coverage", input.ltc_insurance_coverage)?;
    validate_non_negative("social_security_annual", input.social_security_annual)?;
    validate_non_negative("desired_legacy", input.desired_legacy)?;
    validate_return("expected_return", input.expected_return)?;
    validate_return("inflation_rate", input.inflation_rate)?;
    return_warnings(input.expected_return, &mut warnings);

    let periods = Decimal::from(PERIODS_PER_YEAR);
    let months = years * PERIODS_PER_YEAR;
    let monthly_rate = periodic_rate(input.expected_return);
    let monthly_inflation = periodic_rate(input.inflation_rate);
    let monthly_ss = input.social_security_annual / periods;
    let monthly_coverage = input.ltc_insurance_coverage / periods;

    let mut balance = input.starting_portfolio;
    let mut basic = input.annual_basic_expenses;
    let mut healthcare = input.annual_healthcare_costs;
    let mut ltc = input.long_term_care_annual;
    let mut total_withdrawals = Decimal::ZERO;
    let mut total_ltc = Decimal::ZERO;
    let mut total_ltc_paid = Decimal::ZERO;
    let mut total_ss = Decimal::ZERO;
    let mut depletion_age: Option<Age> = None;
    let mut ledger = YearLedger::new(input.late_retirement_start_age, years);

    for period in 0..months {
        let beginning = balance;
        let gain = grow(&mut balance, monthly_rate);

        total_ss += monthly_ss;

        let period_ltc = ltc / periods;
        let covered = monthly_coverage.min(period_ltc);
        total_ltc += period_ltc;
        total_ltc_paid += covered;

        let costs = (basic + healthcare) / periods + period_ltc - covered;
        let need = (costs - monthly_ss).max(Decimal::ZERO);

        let withdrawal = if need > Decimal::ZERO && need >= balance {
            depletion_age = Some(input.late_retirement_start_age + period / PERIODS_PER_YEAR);
            std::mem::replace(&mut balance, Decimal::ZERO)
        } else {
            balance -= need;
            need
        };
        total_withdrawals += withdrawal;
        ledger.record(period, beginning, Decimal::ZERO, withdrawal, gain, balance);

        basic *= Decimal::ONE + monthly_inflation;
        healthcare *= Decimal::ONE + monthly_inflation;
        ltc *= Decimal::ONE + monthly_inflation;

        if depletion_age.is_some() {
            break;
        }
    }

    let portfolio_sufficient = depletion_age.is_none() && balance >= input.desired_legacy;

    if let Some(age) = depletion_age {
        warn!("late retirement portfolio depleted at age {age}");
        warnings.push(format!(
            "Portfolio depleted at age {age}, before life expectancy of {}",
            input.life_expectancy
        ));
    } else if !portfolio_sufficient {
        warnings.push(format!(
            "Ending portfolio of {} falls short of the desired legacy of {}",
            balance.round_dp(2),
            input.desired_legacy
        ));
    }

    let output = LateRetirementResult {
        phase_duration_years: years,
        starting_portfolio: input.starting_portfolio,
        ending_portfolio: balance,
        total_withdrawals,
        total_ltc_costs: total_ltc,
        total_ltc_insurance_paid: total_ltc_paid,
        total_social_security: total_ss,
        net_ltc_out_of_pocket: total_ltc - total_ltc_paid,
        legacy_amount: balance,
        portfolio_sufficient,
        portfolio_depletion_age: depletion_age,
        year_by_year: ledger.finish(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Late retirement (monthly compounding and inflation, LTC net of insurance, legacy test)",
        &serde_json::json!({
            "start_age": input.late_retirement_start_age,
            "life_expectancy": input.life_expectancy,
            "expected_return_pct": input.expected_return.to_string(),
            "inflation_pct": input.inflation_rate.to_string(),
            "desired_legacy": input.desired_legacy.to_string(),
            "months": months,
        }),
        warnings,
        elapsed,
        output,
    ))
}
