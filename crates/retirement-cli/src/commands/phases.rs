use clap::Args;
use serde_json::Value;

use retirement_core::phases;
use retirement_core::PhaseKind;

use crate::input;

/// Arguments shared by the four deterministic phase commands
#[derive(Args)]
pub struct PhaseArgs {
    /// Path to a JSON or YAML file of named fields
    #[arg(long)]
    pub input: Option<String>,

    /// Field override, repeatable (e.g. --field expected_return=6.5)
    #[arg(long = "field", short = 'f', value_name = "KEY=VALUE")]
    pub fields: Vec<String>,

    /// Omit the year-by-year schedule from the output
    #[arg(long)]
    pub summary_only: bool,
}

pub fn run_phase(kind: PhaseKind, args: PhaseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fields = input::field_map(args.input.as_deref(), &args.fields)?;
    let output = phases::calculate_phase(kind, &fields)?;
    let mut value = serde_json::to_value(output)?;
    if args.summary_only {
        if let Some(Value::Object(result)) = value.get_mut("result") {
            result.remove("year_by_year");
        }
    }
    Ok(value)
}
