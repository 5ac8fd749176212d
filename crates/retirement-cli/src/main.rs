mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::monte_carlo::McArgs;
use commands::phases::PhaseArgs;
use commands::planning::{LifecycleArgs, SavingsArgs};
use retirement_core::PhaseKind;

/// Retirement phase projections and Monte Carlo forecasts
#[derive(Parser)]
#[command(
    name = "retire",
    version,
    about = "Retirement phase projections and Monte Carlo forecasts",
    long_about = "Projects a retirement plan across accumulation, phased, active and late \
                  retirement with decimal precision, and forecasts portfolio outcomes with \
                  Monte Carlo simulation. Inputs are JSON or YAML maps of named fields, \
                  read from --input or stdin, with --field overrides."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Project the accumulation phase (working years)
    Accumulation(PhaseArgs),
    /// Project phased retirement (part-time work, partial withdrawals)
    Phased(PhaseArgs),
    /// Project active retirement (expenses net of social security and pension)
    Active(PhaseArgs),
    /// Project late retirement (long-term care, legacy target)
    Late(PhaseArgs),
    /// Monte Carlo forecast of the accumulation phase
    McAccumulation(McArgs),
    /// Monte Carlo forecast of a withdrawal phase
    McWithdrawal(McArgs),
    /// Chain several phases, carrying the portfolio forward
    Lifecycle(LifecycleArgs),
    /// Quick retirement savings projection with the safe withdrawal rule
    Savings(SavingsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Accumulation(args) => commands::phases::run_phase(PhaseKind::Accumulation, args),
        Commands::Phased(args) => commands::phases::run_phase(PhaseKind::PhasedRetirement, args),
        Commands::Active(args) => commands::phases::run_phase(PhaseKind::ActiveRetirement, args),
        Commands::Late(args) => commands::phases::run_phase(PhaseKind::LateRetirement, args),
        Commands::McAccumulation(args) => commands::monte_carlo::run_mc_accumulation(args),
        Commands::McWithdrawal(args) => commands::monte_carlo::run_mc_withdrawal(args),
        Commands::Lifecycle(args) => commands::planning::run_lifecycle(args),
        Commands::Savings(args) => commands::planning::run_savings(args),
        Commands::Version => {
            println!("retire {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
