//! Monte Carlo simulation of phase balances under random monthly returns.
//!
//! Runs in `f64`; the deterministic calculator stays in `Decimal`. Inputs
//! cross from field maps into this module through `FieldMap::float`.

pub mod simulation;
pub mod statistics;

pub use simulation::{
    run_accumulation_monte_carlo, run_withdrawal_monte_carlo, AccumulationMcInput,
    MonteCarloResult, WithdrawalMcInput,
};
pub use statistics::{OutcomeSummary, PercentileBands};
