use retirement_core::monte_carlo::{
    run_accumulation_monte_carlo, run_withdrawal_monte_carlo, AccumulationMcInput,
    MonteCarloResult, WithdrawalMcInput,
};
use retirement_core::{FieldMap, PlannerError};

// ===========================================================================
// Monte Carlo simulator: statistical properties under a fixed seed.
// ===========================================================================

const SEED: u64 = 42;

fn accumulation_input() -> AccumulationMcInput {
    AccumulationMcInput {
        current_savings: 50_000.0,
        monthly_contribution: 1_000.0,
        years: 25,
        expected_return: 7.0,
        variance: 15.0,
        annual_contribution_increase: 2.0,
        runs: 2_000,
        seed: Some(SEED),
    }
}

fn withdrawal_input() -> WithdrawalMcInput {
    WithdrawalMcInput {
        starting_portfolio: 1_000_000.0,
        annual_withdrawal: 60_000.0,
        years: 30,
        expected_return: 6.0,
        variance: 12.0,
        inflation_rate: 3.0,
        runs: 2_000,
        seed: Some(SEED),
    }
}

fn withdrawal(input: &WithdrawalMcInput) -> MonteCarloResult {
    run_withdrawal_monte_carlo(input).unwrap().result
}

fn assert_percentiles_ordered(r: &MonteCarloResult) {
    let s = &r.summary;
    assert!(s.percentile_10 <= s.percentile_25);
    assert!(s.percentile_25 <= s.percentile_50);
    assert!(s.percentile_50 <= s.percentile_75);
    assert!(s.percentile_75 <= s.percentile_90);
    assert_eq!(s.median, s.percentile_50);
}

// ---------------------------------------------------------------------------
// Distribution shape
// ---------------------------------------------------------------------------

#[test]
fn test_percentiles_ordered_for_both_simulators() {
    let acc = run_accumulation_monte_carlo(&accumulation_input()).unwrap().result;
    assert_percentiles_ordered(&acc);
    assert_percentiles_ordered(&withdrawal(&withdrawal_input()));
}

#[test]
fn test_yearly_bands_ordered_and_sized() {
    let r = withdrawal(&withdrawal_input());
    assert_eq!(r.bands.len(), 31);
    assert_eq!(r.bands.yearly_50th[0], 1_000_000.0);
    for year in 0..r.bands.len() {
        assert!(r.bands.yearly_10th[year] <= r.bands.yearly_50th[year]);
        assert!(r.bands.yearly_50th[year] <= r.bands.yearly_90th[year]);
    }
}

#[test]
fn test_run_count_fidelity() {
    let acc = run_accumulation_monte_carlo(&accumulation_input()).unwrap().result;
    assert_eq!(acc.all_outcomes.len(), 2_000);
    let wd = withdrawal(&withdrawal_input());
    assert_eq!(wd.all_outcomes.len(), 2_000);
    assert_eq!(wd.runs, 2_000);
}

#[test]
fn test_same_seed_reproduces_outcomes() {
    let a = withdrawal(&withdrawal_input());
    let b = withdrawal(&withdrawal_input());
    assert_eq!(a.all_outcomes, b.all_outcomes);
}

// ---------------------------------------------------------------------------
// Success rate
// ---------------------------------------------------------------------------

#[test]
fn test_accumulation_success_is_always_100() {
    for variance in [1.0, 15.0, 60.0] {
        for years in [0, 1, 40] {
            let input = AccumulationMcInput {
                variance,
                years,
                runs: 300,
                ..accumulation_input()
            };
            let r = run_accumulation_monte_carlo(&input).unwrap().result;
            assert_eq!(r.success_rate, 100.0);
        }
    }
}

#[test]
fn test_depletion_consistency() {
    let input = WithdrawalMcInput {
        annual_withdrawal: 90_000.0,
        ..withdrawal_input()
    };
    let r = withdrawal(&input);
    let zeros = r.all_outcomes.iter().filter(|&&v| v == 0.0).count() as u32;
    assert_eq!(zeros, r.depleted_runs);
    let survivors = r.all_outcomes.iter().filter(|&&v| v > 0.0).count() as f64;
    let expected = 100.0 * survivors / r.runs as f64;
    assert!((r.success_rate - expected).abs() < 1e-9);
}

#[test]
fn test_higher_withdrawal_never_raises_success() {
    let mut previous = f64::INFINITY;
    for annual_withdrawal in [30_000.0, 50_000.0, 70_000.0, 90_000.0] {
        let r = withdrawal(&WithdrawalMcInput {
            annual_withdrawal,
            ..withdrawal_input()
        });
        assert!(r.success_rate <= previous, "withdrawal {annual_withdrawal}");
        previous = r.success_rate;
    }
}

#[test]
fn test_higher_return_never_lowers_success() {
    let mut previous = f64::NEG_INFINITY;
    for expected_return in [2.0, 4.0, 6.0, 8.0] {
        let r = withdrawal(&WithdrawalMcInput {
            expected_return,
            ..withdrawal_input()
        });
        assert!(r.success_rate >= previous, "return {expected_return}");
        previous = r.success_rate;
    }
}

#[test]
fn test_higher_inflation_never_raises_success() {
    let mut previous = f64::INFINITY;
    for inflation_rate in [0.0, 2.0, 4.0, 6.0] {
        let r = withdrawal(&WithdrawalMcInput {
            inflation_rate,
            ..withdrawal_input()
        });
        assert!(r.success_rate <= previous, "inflation {inflation_rate}");
        previous = r.success_rate;
    }
}

#[test]
fn test_higher_volatility_widens_outcomes() {
    let mut previous = 0.0;
    for variance in [5.0, 15.0, 30.0] {
        let input = AccumulationMcInput {
            variance,
            runs: 5_000,
            ..accumulation_input()
        };
        let r = run_accumulation_monte_carlo(&input).unwrap().result;
        assert!(r.summary.std_deviation > previous, "variance {variance}");
        previous = r.summary.std_deviation;
    }
}

// ---------------------------------------------------------------------------
// Degenerate cases
// ---------------------------------------------------------------------------

#[test]
fn test_zero_runs_is_degenerate_not_an_error() {
    let input = WithdrawalMcInput {
        runs: 0,
        ..withdrawal_input()
    };
    let r = withdrawal(&input);
    assert_eq!(r.success_rate, 100.0);
    assert!(r.all_outcomes.is_empty());
    assert_eq!(r.summary.mean, 1_000_000.0);
    assert_eq!(r.summary.percentile_90, 1_000_000.0);
    assert_eq!(r.summary.std_deviation, 0.0);
}

#[test]
fn test_zero_years_returns_starting_value() {
    let input = WithdrawalMcInput {
        years: 0,
        ..withdrawal_input()
    };
    let r = withdrawal(&input);
    assert!(r.all_outcomes.iter().all(|&v| v == 1_000_000.0));
    assert_eq!(r.success_rate, 100.0);
    assert_eq!(r.bands.len(), 1);
}

// ---------------------------------------------------------------------------
// Field-map boundary
// ---------------------------------------------------------------------------

#[test]
fn test_accumulation_from_fields_derives_years_and_match() {
    let fields = FieldMap::new()
        .with("current_age", 40)
        .with("retirement_start_age", 60)
        .with("current_savings", "25000")
        .with("monthly_contribution", 800)
        .with("employer_match_rate", 50)
        .with("expected_return", 7)
        .with("return_volatility", 12)
        .with("runs", 500);
    let input = AccumulationMcInput::from_fields(&fields).unwrap();
    assert_eq!(input.years, 20);
    assert_eq!(input.monthly_contribution, 1_200.0);
    assert_eq!(input.variance, 12.0);
    assert_eq!(input.runs, 500);
}

#[test]
fn test_withdrawal_from_fields_uses_phase_ages_and_defaults() {
    let fields = FieldMap::new()
        .with("starting_portfolio", 600_000)
        .with("late_retirement_start_age", 80)
        .with("life_expectancy", 95)
        .with("annual_withdrawal", 30_000)
        .with("expected_return", 5);
    let input = WithdrawalMcInput::from_fields(&fields).unwrap();
    assert_eq!(input.years, 15);
    assert_eq!(input.variance, 10.0);
    assert_eq!(input.inflation_rate, 3.0);
    assert_eq!(input.runs, 10_000);
}

#[test]
fn test_bad_input_fails_before_simulating() {
    let fields = FieldMap::new()
        .with("starting_portfolio", "lots")
        .with("years", 10)
        .with("expected_return", 5);
    let err = WithdrawalMcInput::from_fields(&fields).unwrap_err();
    assert!(matches!(err, PlannerError::InvalidInput { .. }));

    let input = WithdrawalMcInput {
        variance: 0.0,
        ..withdrawal_input()
    };
    assert!(run_withdrawal_monte_carlo(&input).is_err());
}
