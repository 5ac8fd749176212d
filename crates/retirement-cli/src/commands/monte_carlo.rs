use clap::Args;
use serde_json::Value;

use retirement_core::monte_carlo::{self, AccumulationMcInput, WithdrawalMcInput};
use retirement_core::FieldMap;

use crate::input;

/// Arguments for both Monte Carlo commands
#[derive(Args)]
pub struct McArgs {
    /// Path to a JSON or YAML file of named fields
    #[arg(long)]
    pub input: Option<String>,

    /// Field override, repeatable (e.g. --field variance=12)
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Number of simulated runs (default 10000)
    #[arg(long)]
    pub runs: Option<u32>,

    /// RNG seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Include every run's ending balance in the output
    #[arg(long)]
    pub all_outcomes: bool,
}

fn fields(args: &McArgs) -> Result<FieldMap, Box<dyn std::error::Error>> {
    let mut fields = input::field_map(args.input.as_deref(), &args.fields)?;
    if let Some(runs) = args.runs {
        fields.insert("runs", runs);
    }
    if let Some(seed) = args.seed {
        fields.insert("seed", seed);
    }
    Ok(fields)
}

fn finish(mut value: Value, keep_outcomes: bool) -> Value {
    if !keep_outcomes {
        if let Some(Value::Object(result)) = value.get_mut("result") {
            result.remove("all_outcomes");
        }
    }
    value
}

pub fn run_mc_accumulation(args: McArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc_input = AccumulationMcInput::from_fields(&fields(&args)?)?;
    let output = monte_carlo::run_accumulation_monte_carlo(&mc_input)?;
    Ok(finish(serde_json::to_value(output)?, args.all_outcomes))
}

pub fn run_mc_withdrawal(args: McArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mc_input = WithdrawalMcInput::from_fields(&fields(&args)?)?;
    let output = monte_carlo::run_withdrawal_monte_carlo(&mc_input)?;
    Ok(finish(serde_json::to_value(output)?, args.all_outcomes))
}
