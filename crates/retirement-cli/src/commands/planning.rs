use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use retirement_core::lifecycle::{self, LifecycleInput};
use retirement_core::savings::{self, SavingsProjectionInput};
use retirement_core::FieldMap;

use crate::input;

/// Arguments for lifecycle chaining
#[derive(Args)]
pub struct LifecycleArgs {
    /// Path to a JSON or YAML file with an ordered `steps` list of {phase, fields}
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the quick savings projection
#[derive(Args)]
pub struct SavingsArgs {
    /// Path to a JSON or YAML file of named fields (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Current age in years
    #[arg(long)]
    pub current_age: Option<u32>,

    /// Planned retirement age
    #[arg(long)]
    pub retirement_age: Option<u32>,

    /// Current savings balance
    #[arg(long)]
    pub current_savings: Option<Decimal>,

    /// Monthly contribution
    #[arg(long)]
    pub monthly_contribution: Option<Decimal>,

    /// Expected annual return in percent
    #[arg(long, alias = "return")]
    pub annual_return_rate: Option<Decimal>,

    /// Annual withdrawal rate in percent for the safe withdrawal estimate
    #[arg(long, default_value = "4")]
    pub safe_withdrawal_rate: Decimal,
}

pub fn run_lifecycle(args: LifecycleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let lifecycle_input: LifecycleInput = match input::load(args.input.as_deref())? {
        Some(doc) => serde_json::from_value(doc)?,
        None => return Err("--input <file> or stdin required for lifecycle projection".into()),
    };
    let result = lifecycle::project_lifecycle(&lifecycle_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_savings(args: SavingsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let savings_input = match input::load(args.input.as_deref())? {
        Some(doc) => SavingsProjectionInput::from_fields(&FieldMap::try_from(doc)?)?,
        None => SavingsProjectionInput {
            current_age: args
                .current_age
                .ok_or("--current-age is required (or provide --input)")?,
            retirement_age: args
                .retirement_age
                .ok_or("--retirement-age is required (or provide --input)")?,
            current_savings: args
                .current_savings
                .ok_or("--current-savings is required (or provide --input)")?,
            monthly_contribution: args
                .monthly_contribution
                .ok_or("--monthly-contribution is required (or provide --input)")?,
            annual_return_rate: args
                .annual_return_rate
                .ok_or("--annual-return-rate is required (or provide --input)")?,
            variance: None,
            safe_withdrawal_rate: Some(args.safe_withdrawal_rate),
        },
    };
    let result = savings::project_retirement_savings(&savings_input)?;
    Ok(serde_json::to_value(result)?)
}
