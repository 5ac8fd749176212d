use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PlannerError;
use crate::fields::{span_years, FieldMap};
use crate::types::{with_metadata, Age, ComputationOutput, Money, Percent, PERIODS_PER_YEAR};
use crate::PlannerResult;

/// Drawdown horizon used for the monthly income estimate.
const INCOME_ESTIMATE_MONTHS: u32 = 20 * PERIODS_PER_YEAR;

const DEFAULT_SAFE_WITHDRAWAL_PCT: Decimal = dec!(4);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// (1 + rate)^periods by repeated multiplication, exact in Decimal.
fn growth_factor(rate: Decimal, periods: u32) -> Decimal {
    (0..periods).fold(Decimal::ONE, |acc, _| acc * (Decimal::ONE + rate))
}

fn monthly(annual_rate: Percent) -> Decimal {
    annual_rate / dec!(100) / Decimal::from(PERIODS_PER_YEAR)
}

/// Future value of a lump sum compounded monthly: FV = PV × (1 + r/12)^(12n)
pub fn future_value_lump_sum(principal: Money, annual_rate: Percent, years: u32) -> Money {
    principal * growth_factor(monthly(annual_rate), years * PERIODS_PER_YEAR)
}

/// Future value of level end-of-month payments: FV = PMT × [((1 + r)^n − 1) / r]
pub fn future_value_annuity(monthly_payment: Money, annual_rate: Percent, years: u32) -> Money {
    let months = years * PERIODS_PER_YEAR;
    let rate = monthly(annual_rate);
    if rate.is_zero() {
        return monthly_payment * Decimal::from(months);
    }
    monthly_payment * (growth_factor(rate, months) - Decimal::ONE) / rate
}

/// Annual amount that can be drawn at `withdrawal_rate` percent of savings.
pub fn safe_withdrawal_amount(total_savings: Money, withdrawal_rate: Percent) -> Money {
    total_savings * (withdrawal_rate / dec!(100))
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Single-phase savings projection, the quick calculator on the landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsProjectionInput {
    pub current_age: Age,
    pub retirement_age: Age,
    pub current_savings: Money,
    pub monthly_contribution: Money,
    pub annual_return_rate: Percent,
    /// Carried through for display; the projection itself is deterministic.
    #[serde(default)]
    pub variance: Option<Percent>,
    #[serde(default)]
    pub safe_withdrawal_rate: Option<Percent>,
}

impl SavingsProjectionInput {
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        let optional = |name: &str| -> PlannerResult<Option<Percent>> {
            if fields.has(name) {
                fields.decimal(name).map(Some)
            } else {
                Ok(None)
            }
        };
        Ok(Self {
            current_age: fields.age("current_age")?,
            retirement_age: fields.age("retirement_age")?,
            current_savings: fields.money("current_savings")?,
            monthly_contribution: fields.money("monthly_contribution")?,
            annual_return_rate: fields.decimal("annual_return_rate")?,
            variance: optional("variance")?,
            safe_withdrawal_rate: optional("safe_withdrawal_rate")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementProjection {
    pub years_to_retirement: u32,
    /// Current savings plus every monthly contribution.
    pub total_contributions: Money,
    pub future_value: Money,
    pub investment_gains: Money,
    /// Future value spread evenly over a 20-year drawdown.
    pub monthly_income_estimate: Money,
    pub return_on_investment_pct: Percent,
    pub safe_annual_withdrawal: Money,
    pub variance: Option<Percent>,
}

/// Project retirement savings as lump-sum growth plus an ordinary annuity.
pub fn project_retirement_savings(
    input: &SavingsProjectionInput,
) -> PlannerResult<ComputationOutput<RetirementProjection>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    let years = span_years(
        input.current_age,
        input.retirement_age,
        "current_age",
        "retirement_age",
    )?;
    if input.annual_return_rate <= dec!(-100) {
        return Err(PlannerError::InvalidInput {
            field: "annual_return_rate".into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }

    let fv_savings = future_value_lump_sum(input.current_savings, input.annual_return_rate, years);
    let fv_contributions =
        future_value_annuity(input.monthly_contribution, input.annual_return_rate, years);
    let future_value = fv_savings + fv_contributions;

    let total_contributions = input.current_savings
        + input.monthly_contribution * Decimal::from(years * PERIODS_PER_YEAR);
    let investment_gains = future_value - total_contributions;

    let return_on_investment_pct = if total_contributions.is_zero() {
        Decimal::ZERO
    } else {
        investment_gains / total_contributions * dec!(100)
    };

    let withdrawal_rate = input
        .safe_withdrawal_rate
        .unwrap_or(DEFAULT_SAFE_WITHDRAWAL_PCT);

    let output = RetirementProjection {
        years_to_retirement: years,
        total_contributions,
        future_value,
        investment_gains,
        monthly_income_estimate: future_value / Decimal::from(INCOME_ESTIMATE_MONTHS),
        return_on_investment_pct,
        safe_annual_withdrawal: safe_withdrawal_amount(future_value, withdrawal_rate),
        variance: input.variance,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Retirement savings projection (lump sum FV + ordinary annuity FV, monthly compounding)",
        &serde_json::json!({
            "current_age": input.current_age,
            "retirement_age": input.retirement_age,
            "annual_return_pct": input.annual_return_rate.to_string(),
            "safe_withdrawal_pct": withdrawal_rate.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
