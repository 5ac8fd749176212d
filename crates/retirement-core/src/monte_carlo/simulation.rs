use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::time::Instant;

use super::statistics::{OutcomeSummary, PercentileBands};
use crate::error::PlannerError;
use crate::fields::FieldMap;
use crate::types::{ComputationMetadata, ComputationOutput, PERIODS_PER_YEAR};
use crate::PlannerResult;

const MONTHS: f64 = PERIODS_PER_YEAR as f64;

/// Below this many runs the percentile estimates are too noisy to trust.
const NOISY_RUN_COUNT: u32 = 1_000;

// ---------------------------------------------------------------------------
// Helper: build ComputationOutput without requiring Decimal
// ---------------------------------------------------------------------------

fn with_metadata_f64<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "ieee754_f64".to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

fn default_runs() -> u32 {
    10_000
}

fn default_variance() -> f64 {
    10.0
}

fn default_inflation() -> f64 {
    3.0
}

/// Input for an accumulation-phase simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccumulationMcInput {
    pub current_savings: f64,
    /// Total monthly inflow, employer match included.
    pub monthly_contribution: f64,
    pub years: u32,
    /// Expected annual return in percent.
    pub expected_return: f64,
    /// Annualized volatility in percentage points.
    #[serde(default = "default_variance")]
    pub variance: f64,
    /// Contribution growth applied once every 12 months, in percent.
    #[serde(default)]
    pub annual_contribution_increase: f64,
    #[serde(default = "default_runs")]
    pub runs: u32,
    /// Optional seed for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl AccumulationMcInput {
    /// Derive simulation inputs from accumulation-phase fields.
    ///
    /// Years come from `retirement_start_age - current_age`, the employer
    /// match is folded into the monthly contribution and `return_volatility`
    /// is accepted as an alias for `variance`.
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        let monthly = fields.float("monthly_contribution")?;
        let match_rate = fields.optional_float("employer_match_rate", 0.0)?;
        Ok(Self {
            current_savings: fields.float("current_savings")?,
            monthly_contribution: monthly + monthly * match_rate / 100.0,
            years: fields.years_between("current_age", "retirement_start_age")?,
            expected_return: fields.float("expected_return")?,
            variance: volatility_field(fields)?,
            annual_contribution_increase: fields.optional_float("annual_salary_increase", 0.0)?,
            runs: run_count_field(fields)?,
            seed: fields.optional_count("seed")?,
        })
    }
}

/// Input for a withdrawal-phase simulation (phased, active or late retirement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalMcInput {
    pub starting_portfolio: f64,
    /// First-year withdrawal; inflated once every 12 months.
    pub annual_withdrawal: f64,
    pub years: u32,
    pub expected_return: f64,
    #[serde(default = "default_variance")]
    pub variance: f64,
    #[serde(default = "default_inflation")]
    pub inflation_rate: f64,
    #[serde(default = "default_runs")]
    pub runs: u32,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Age pairs that define a withdrawal phase's length, checked in order.
const WITHDRAWAL_AGE_PAIRS: [(&str, &str); 3] = [
    ("active_retirement_start_age", "active_retirement_end_age"),
    ("late_retirement_start_age", "life_expectancy"),
    ("phase_start_age", "full_retirement_age"),
];

impl WithdrawalMcInput {
    /// Derive simulation inputs from any retirement phase's fields.
    ///
    /// Duration is an explicit `years` field, or the first complete pair of
    /// phase start/end ages.
    pub fn from_fields(fields: &FieldMap) -> PlannerResult<Self> {
        let years = if fields.has("years") {
            let years = fields.optional_count("years")?.unwrap_or_default();
            u32::try_from(years).map_err(|_| PlannerError::invalid("years", "Too many years"))?
        } else {
            let (start, end) = WITHDRAWAL_AGE_PAIRS
                .iter()
                .find(|(start, end)| fields.has(start) && fields.has(end))
                .ok_or_else(|| PlannerError::MissingField {
                    field: "years".into(),
                })?;
            fields.years_between(start, end)?
        };

        Ok(Self {
            starting_portfolio: fields.float("starting_portfolio")?,
            annual_withdrawal: fields.optional_float("annual_withdrawal", 0.0)?,
            years,
            expected_return: fields.float("expected_return")?,
            variance: volatility_field(fields)?,
            inflation_rate: fields.optional_float("inflation_rate", default_inflation())?,
            runs: run_count_field(fields)?,
            seed: fields.optional_count("seed")?,
        })
    }
}

fn volatility_field(fields: &FieldMap) -> PlannerResult<f64> {
    if fields.has("variance") {
        fields.float("variance")
    } else {
        fields.optional_float("return_volatility", default_variance())
    }
}

fn run_count_field(fields: &FieldMap) -> PlannerResult<u32> {
    match fields.optional_count("runs")? {
        Some(n) => u32::try_from(n).map_err(|_| PlannerError::invalid("runs", "Too many runs")),
        None => Ok(default_runs()),
    }
}

/// Output of a Monte Carlo phase simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub runs: u32,
    #[serde(flatten)]
    pub summary: OutcomeSummary,
    /// Percentage of runs that never depleted.
    pub success_rate: f64,
    pub depleted_runs: u32,
    /// Ending balance of every run, in run order.
    pub all_outcomes: Vec<f64>,
    #[serde(flatten)]
    pub bands: PercentileBands,
}

// ---------------------------------------------------------------------------
// Path engine
// ---------------------------------------------------------------------------

/// Monthly cash flow applied after each period's random return.
#[derive(Debug, Clone, Copy)]
enum CashFlow {
    /// Added each month; grows by `annual_growth` every 12 months. Never depletes.
    Contribution { monthly: f64, annual_growth: f64 },
    /// Subtracted each month; grows by `annual_inflation` every 12 months.
    Withdrawal { monthly: f64, annual_inflation: f64 },
}

impl CashFlow {
    fn escalated(self) -> Self {
        match self {
            CashFlow::Contribution { monthly, annual_growth } => CashFlow::Contribution {
                monthly: monthly * (1.0 + annual_growth),
                annual_growth,
            },
            CashFlow::Withdrawal { monthly, annual_inflation } => CashFlow::Withdrawal {
                monthly: monthly * (1.0 + annual_inflation),
                annual_inflation,
            },
        }
    }

    /// Apply the flow; returns true if the balance is now depleted.
    ///
    /// Only a positive withdrawal that meets or exceeds the balance depletes
    /// a run. A zero withdrawal never does, even from an empty portfolio.
    fn apply(self, balance: &mut f64) -> bool {
        match self {
            CashFlow::Contribution { monthly, .. } => {
                *balance += monthly;
                false
            }
            CashFlow::Withdrawal { monthly, .. } => {
                let depleted = monthly > 0.0 && monthly >= *balance;
                *balance = (*balance - monthly).max(0.0);
                depleted
            }
        }
    }
}

struct SimulatedPaths {
    outcomes: Vec<f64>,
    depleted_runs: u32,
    /// `snapshots[year][run]`
    snapshots: Vec<Vec<f64>>,
}

fn simulate_paths(
    start: f64,
    years: u32,
    runs: u32,
    flow: CashFlow,
    returns: &Normal,
    rng: &mut StdRng,
) -> SimulatedPaths {
    let n = runs as usize;
    let mut outcomes = Vec::with_capacity(n);
    let mut depleted_runs = 0;
    let mut snapshots: Vec<Vec<f64>> = (0..=years).map(|_| Vec::with_capacity(n)).collect();

    for _ in 0..runs {
        let mut balance = start;
        let mut current = flow;
        let mut depleted = false;
        snapshots[0].push(balance);

        for year in 1..=years as usize {
            if year > 1 {
                current = current.escalated();
            }
            // Depleted runs still draw, so every run consumes years * 12 samples.
            for _ in 0..PERIODS_PER_YEAR {
                let r: f64 = rng.sample(returns);
                if depleted {
                    continue;
                }
                balance *= 1.0 + r;
                depleted = current.apply(&mut balance);
            }
            snapshots[year].push(balance);
        }

        if depleted {
            depleted_runs += 1;
        }
        outcomes.push(balance);
    }

    SimulatedPaths {
        outcomes,
        depleted_runs,
        snapshots,
    }
}

fn monthly_returns(expected_return: f64, variance: f64) -> PlannerResult<Normal> {
    let mean = expected_return / 100.0 / MONTHS;
    let std_dev = variance / 100.0 / MONTHS.sqrt();
    Normal::new(mean, std_dev).map_err(|e| {
        PlannerError::ComputationFailure(format!("Invalid return distribution: {e}"))
    })
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn require_finite(field: &str, value: f64) -> PlannerResult<f64> {
    if !value.is_finite() {
        return Err(PlannerError::invalid(field, "Must be a finite number"));
    }
    Ok(value)
}

fn require_non_negative(field: &str, value: f64) -> PlannerResult<()> {
    if require_finite(field, value)? < 0.0 {
        return Err(PlannerError::invalid(field, "Cannot be negative"));
    }
    Ok(())
}

fn require_rate(field: &str, value: f64) -> PlannerResult<()> {
    if require_finite(field, value)? <= -100.0 {
        return Err(PlannerError::invalid(field, "Rate must be greater than -100%"));
    }
    Ok(())
}

fn require_volatility(value: f64) -> PlannerResult<()> {
    if require_finite("variance", value)? <= 0.0 {
        return Err(PlannerError::invalid(
            "variance",
            "Volatility must be greater than zero",
        ));
    }
    Ok(())
}

fn run_warnings(runs: u32) -> Vec<String> {
    let mut warnings = Vec::new();
    if runs > 0 && runs < NOISY_RUN_COUNT {
        warnings.push(format!(
            "Only {runs} runs; percentile estimates will be noisy (10,000 recommended)"
        ));
    }
    warnings
}

fn build_result(start: f64, years: u32, runs: u32, paths: Option<SimulatedPaths>) -> MonteCarloResult {
    match paths {
        Some(mut paths) if runs > 0 => {
            let success = runs - paths.depleted_runs;
            MonteCarloResult {
                runs,
                summary: OutcomeSummary::from_outcomes(&paths.outcomes),
                success_rate: success as f64 / runs as f64 * 100.0,
                depleted_runs: paths.depleted_runs,
                bands: PercentileBands::from_snapshots(&mut paths.snapshots),
                all_outcomes: paths.outcomes,
            }
        }
        _ => MonteCarloResult {
            runs,
            summary: OutcomeSummary::constant(start),
            success_rate: 100.0,
            depleted_runs: 0,
            all_outcomes: Vec::new(),
            bands: PercentileBands::constant(start, years),
        },
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the accumulation phase under normally distributed monthly returns.
///
/// Every run starts at `current_savings`; each month applies
/// `balance * (1 + r)` then adds the contribution. Accumulation has no
/// failure condition, so the success rate is always 100.
pub fn run_accumulation_monte_carlo(
    input: &AccumulationMcInput,
) -> PlannerResult<ComputationOutput<MonteCarloResult>> {
    let start = Instant::now();

    require_non_negative("current_savings", input.current_savings)?;
    require_non_negative("monthly_contribution", input.monthly_contribution)?;
    require_rate("expected_return", input.expected_return)?;
    require_rate("annual_contribution_increase", input.annual_contribution_increase)?;
    require_volatility(input.variance)?;
    let returns = monthly_returns(input.expected_return, input.variance)?;
    let warnings = run_warnings(input.runs);

    debug!(
        "accumulation monte carlo: {} runs over {} years",
        input.runs, input.years
    );

    let flow = CashFlow::Contribution {
        monthly: input.monthly_contribution,
        annual_growth: input.annual_contribution_increase / 100.0,
    };
    let paths = (input.runs > 0).then(|| {
        let mut rng = make_rng(input.seed);
        simulate_paths(input.current_savings, input.years, input.runs, flow, &returns, &mut rng)
    });
    let mut output = build_result(input.current_savings, input.years, input.runs, paths);
    output.success_rate = 100.0;

    let elapsed = start.elapsed().as_micros() as u64;
    debug!("accumulation monte carlo finished in {elapsed}us");
    Ok(with_metadata_f64(
        "Monte Carlo accumulation (normal monthly returns, growth then contribution)",
        &serde_json::json!({
            "current_savings": input.current_savings,
            "monthly_contribution": input.monthly_contribution,
            "years": input.years,
            "expected_return_pct": input.expected_return,
            "volatility_pct": input.variance,
            "annual_contribution_increase_pct": input.annual_contribution_increase,
            "runs": input.runs,
            "seed": input.seed,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Simulate a withdrawal phase under normally distributed monthly returns.
///
/// Each month applies `balance * (1 + r)` then subtracts the withdrawal.
/// A run whose balance reaches zero or below is clamped to zero, marked
/// depleted, and records zero at every later year boundary.
pub fn run_withdrawal_monte_carlo(
    input: &WithdrawalMcInput,
) -> PlannerResult<ComputationOutput<MonteCarloResult>> {
    let start = Instant::now();

    require_non_negative("starting_portfolio", input.starting_portfolio)?;
    require_non_negative("annual_withdrawal", input.annual_withdrawal)?;
    require_rate("expected_return", input.expected_return)?;
    require_rate("inflation_rate", input.inflation_rate)?;
    require_volatility(input.variance)?;
    let returns = monthly_returns(input.expected_return, input.variance)?;
    let mut warnings = run_warnings(input.runs);

    debug!(
        "withdrawal monte carlo: {} runs over {} years",
        input.runs, input.years
    );

    let flow = CashFlow::Withdrawal {
        monthly: input.annual_withdrawal / MONTHS,
        annual_inflation: input.inflation_rate / 100.0,
    };
    let paths = (input.runs > 0).then(|| {
        let mut rng = make_rng(input.seed);
        simulate_paths(input.starting_portfolio, input.years, input.runs, flow, &returns, &mut rng)
    });
    let output = build_result(input.starting_portfolio, input.years, input.runs, paths);

    if output.depleted_runs > 0 {
        warnings.push(format!(
            "{} of {} runs depleted before year {}",
            output.depleted_runs, input.runs, input.years
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    debug!(
        "withdrawal monte carlo finished in {elapsed}us, success rate {:.1}%",
        output.success_rate
    );
    Ok(with_metadata_f64(
        "Monte Carlo withdrawal (normal monthly returns, growth then inflation-adjusted withdrawal)",
        &serde_json::json!({
            "starting_portfolio": input.starting_portfolio,
            "annual_withdrawal": input.annual_withdrawal,
            "years": input.years,
            "expected_return_pct": input.expected_return,
            "volatility_pct": input.variance,
            "inflation_pct": input.inflation_rate,
            "runs": input.runs,
            "seed": input.seed,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn accumulation_input() -> AccumulationMcInput {
        AccumulationMcInput {
            current_savings: 50_000.0,
            monthly_contribution: 1_000.0,
            years: 10,
            expected_return: 7.0,
            variance: 10.0,
            annual_contribution_increase: 0.0,
            runs: 1_000,
            seed: Some(SEED),
        }
    }

    fn withdrawal_input() -> WithdrawalMcInput {
        WithdrawalMcInput {
            starting_portfolio: 1_000_000.0,
            annual_withdrawal: 40_000.0,
            years: 30,
            expected_return: 7.0,
            variance: 15.0,
            inflation_rate: 3.0,
            runs: 1_000,
            seed: Some(SEED),
        }
    }

    #[test]
    fn test_contribution_escalates_by_growth() {
        let flow = CashFlow::Contribution {
            monthly: 100.0,
            annual_growth: 0.10,
        };
        match flow.escalated() {
            CashFlow::Contribution { monthly, .. } => assert!((monthly - 110.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_withdrawal_clamps_at_zero() {
        let flow = CashFlow::Withdrawal {
            monthly: 500.0,
            annual_inflation: 0.0,
        };
        let mut balance = 300.0;
        assert!(flow.apply(&mut balance));
        assert_eq!(balance, 0.0);
    }

    #[test]
    fn test_zero_withdrawal_never_depletes() {
        let flow = CashFlow::Withdrawal {
            monthly: 0.0,
            annual_inflation: 0.0,
        };
        let mut balance = 0.0;
        assert!(!flow.apply(&mut balance));
        assert_eq!(balance, 0.0);
    }

    #[test]
    fn test_empty_portfolio_without_withdrawals_succeeds() {
        let mut input = withdrawal_input();
        input.starting_portfolio = 0.0;
        input.annual_withdrawal = 0.0;
        input.runs = 200;
        let out = run_withdrawal_monte_carlo(&input).unwrap().result;
        assert_eq!(out.depleted_runs, 0);
        assert_eq!(out.success_rate, 100.0);
        assert!(out.all_outcomes.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_seeded_reproducibility() {
        let a = run_withdrawal_monte_carlo(&withdrawal_input()).unwrap().result;
        let b = run_withdrawal_monte_carlo(&withdrawal_input()).unwrap().result;
        assert_eq!(a.all_outcomes, b.all_outcomes);
        assert_eq!(a.success_rate, b.success_rate);
    }

    #[test]
    fn test_accumulation_band_shape() {
        let out = run_accumulation_monte_carlo(&accumulation_input()).unwrap().result;
        assert_eq!(out.bands.len(), 11);
        assert_eq!(out.bands.yearly_10th[0], 50_000.0);
        assert_eq!(out.bands.yearly_90th[0], 50_000.0);
        for i in 0..out.bands.len() {
            assert!(out.bands.yearly_10th[i] <= out.bands.yearly_50th[i]);
            assert!(out.bands.yearly_50th[i] <= out.bands.yearly_90th[i]);
        }
    }

    #[test]
    fn test_depleted_runs_end_at_zero_and_stay_there() {
        let mut input = withdrawal_input();
        input.annual_withdrawal = 120_000.0;
        let out = run_withdrawal_monte_carlo(&input).unwrap().result;
        assert!(out.depleted_runs > 0);
        let zeros = out.all_outcomes.iter().filter(|v| **v == 0.0).count();
        assert_eq!(zeros as u32, out.depleted_runs);
        let last = out.bands.yearly_10th.last().copied().unwrap();
        assert_eq!(last, 0.0);
    }

    #[test]
    fn test_zero_volatility_rejected_before_simulation() {
        let mut input = withdrawal_input();
        input.variance = 0.0;
        assert!(matches!(
            run_withdrawal_monte_carlo(&input),
            Err(PlannerError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut input = accumulation_input();
        input.current_savings = f64::NAN;
        assert!(run_accumulation_monte_carlo(&input).is_err());
    }

    #[test]
    fn test_low_run_count_warns() {
        let mut input = accumulation_input();
        input.runs = 100;
        let out = run_accumulation_monte_carlo(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.contains("noisy")));
    }

    #[test]
    fn test_serde_defaults() {
        let input: WithdrawalMcInput = serde_json::from_value(serde_json::json!({
            "starting_portfolio": 500000.0,
            "annual_withdrawal": 20000.0,
            "years": 20,
            "expected_return": 6.0
        }))
        .unwrap();
        assert_eq!(input.runs, 10_000);
        assert_eq!(input.variance, 10.0);
        assert_eq!(input.inflation_rate, 3.0);
        assert!(input.seed.is_none());
    }

    #[test]
    fn test_result_serializes_flat() {
        let out = run_accumulation_monte_carlo(&accumulation_input()).unwrap().result;
        let v = serde_json::to_value(&out).unwrap();
        assert!(v.get("percentile_50").is_some());
        assert!(v.get("yearly_90th").is_some());
        assert_eq!(v["median"], v["percentile_50"]);
    }
}
