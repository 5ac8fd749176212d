use pretty_assertions::assert_eq;
use retirement_core::phases::{self, PhaseResult};
use retirement_core::{FieldMap, PhaseKind, PlannerError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Deterministic phase calculator, driven through named-field maps the way
// form handlers call it.
// ===========================================================================

fn accumulation_fields() -> FieldMap {
    FieldMap::new()
        .with("current_age", 30)
        .with("retirement_start_age", 65)
        .with("current_savings", 10_000)
        .with("monthly_contribution", 500)
        .with("expected_return", 7)
}

fn late_fields(starting: i64, basic: i64, healthcare: i64, ret: i64, legacy: i64) -> FieldMap {
    FieldMap::new()
        .with("starting_portfolio", starting)
        .with("late_retirement_start_age", 85)
        .with("life_expectancy", 95)
        .with("annual_basic_expenses", basic)
        .with("annual_healthcare_costs", healthcare)
        .with("expected_return", ret)
        .with("inflation_rate", 3)
        .with("desired_legacy", legacy)
}

fn unwrap_late(result: PhaseResult) -> phases::LateRetirementResult {
    match result {
        PhaseResult::LateRetirement(r) => r,
        other => panic!("expected late retirement, got {:?}", other.kind()),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_accumulation_scenario() {
    let out = phases::calculate_phase(PhaseKind::Accumulation, &accumulation_fields()).unwrap();
    let PhaseResult::Accumulation(r) = out.result else {
        panic!("expected accumulation result");
    };
    assert_eq!(r.years_to_retirement, 35);
    let total = r.total_contributions();
    assert_eq!(total, dec!(500) * dec!(420));
    assert!(r.future_value > total);
    assert!(total > Decimal::ZERO);
    assert_eq!(r.investment_gains, r.future_value - dec!(10_000) - total);
    assert_eq!(r.year_by_year.len(), 35);
}

#[test]
fn test_late_retirement_depletion_scenario() {
    let fields = late_fields(100_000, 50_000, 20_000, 5, 50_000);
    let out = phases::calculate_phase(PhaseKind::LateRetirement, &fields).unwrap();
    let r = unwrap_late(out.result);
    assert_eq!(r.ending_portfolio, Decimal::ZERO);
    assert!(!r.portfolio_sufficient);
    assert!(r.portfolio_depletion_age.is_some());
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_late_retirement_sufficiency_scenario() {
    let fields = late_fields(500_000, 20_000, 10_000, 6, 100_000);
    let out = phases::calculate_phase(PhaseKind::LateRetirement, &fields).unwrap();
    let r = unwrap_late(out.result);
    assert!(r.ending_portfolio > Decimal::ZERO);
    assert!(r.ending_portfolio >= dec!(100_000));
    assert!(r.portfolio_sufficient);
    assert_eq!(r.portfolio_depletion_age, None);
    assert_eq!(r.legacy_amount, r.ending_portfolio);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn test_zero_rate_additivity_with_match() {
    let fields = accumulation_fields()
        .with("expected_return", 0)
        .with("employer_match_rate", 50);
    let out = phases::calculate_phase(PhaseKind::Accumulation, &fields).unwrap();
    let PhaseResult::Accumulation(r) = out.result else {
        panic!("expected accumulation result");
    };
    // 420 months of 500 personal + 250 match
    assert_eq!(r.future_value, dec!(10_000) + dec!(750) * dec!(420));
    assert_eq!(r.investment_gains, Decimal::ZERO);
}

#[test]
fn test_zero_duration_identity_for_every_phase() {
    let cases = [
        (
            PhaseKind::Accumulation,
            accumulation_fields().with("retirement_start_age", 30),
            dec!(10_000),
        ),
        (
            PhaseKind::PhasedRetirement,
            FieldMap::new()
                .with("starting_portfolio", 250_000)
                .with("phase_start_age", 62)
                .with("full_retirement_age", 62)
                .with("monthly_contribution", 500)
                .with("annual_withdrawal", 12_000)
                .with("expected_return", 6),
            dec!(250_000),
        ),
        (
            PhaseKind::ActiveRetirement,
            FieldMap::new()
                .with("starting_portfolio", 800_000)
                .with("active_retirement_start_age", 67)
                .with("active_retirement_end_age", 67)
                .with("annual_expenses", 60_000)
                .with("annual_healthcare_costs", 8_000)
                .with("expected_return", 5)
                .with("inflation_rate", 3),
            dec!(800_000),
        ),
        (
            PhaseKind::LateRetirement,
            late_fields(300_000, 40_000, 15_000, 4, 0).with("life_expectancy", 85),
            dec!(300_000),
        ),
    ];

    for (kind, fields, start) in cases {
        let out = phases::calculate_phase(kind, &fields).unwrap();
        assert_eq!(out.result.duration_years(), 0, "{kind}");
        assert_eq!(out.result.ending_portfolio(), start, "{kind}");
        assert!(out.result.year_by_year().is_empty(), "{kind}");
    }
}

#[test]
fn test_year_rows_chain_balances() {
    let fields = FieldMap::new()
        .with("starting_portfolio", 900_000)
        .with("active_retirement_start_age", 65)
        .with("active_retirement_end_age", 75)
        .with("annual_expenses", 50_000)
        .with("annual_healthcare_costs", 6_000)
        .with("social_security_annual", 24_000)
        .with("expected_return", 5)
        .with("inflation_rate", 2.5);
    let out = phases::calculate_phase(PhaseKind::ActiveRetirement, &fields).unwrap();
    let rows = out.result.year_by_year();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].age, 65);
    assert_eq!(rows[0].beginning_balance, dec!(900_000));
    for pair in rows.windows(2) {
        assert_eq!(pair[0].ending_balance, pair[1].beginning_balance);
    }
    assert_eq!(rows[9].ending_balance, out.result.ending_portfolio());
}

#[test]
fn test_string_inputs_match_numeric_inputs() {
    let numeric = accumulation_fields();
    let strings = FieldMap::new()
        .with("current_age", "30")
        .with("retirement_start_age", "65")
        .with("current_savings", "10000")
        .with("monthly_contribution", "500.00")
        .with("expected_return", "7");
    let a = phases::calculate_phase(PhaseKind::Accumulation, &numeric).unwrap();
    let b = phases::calculate_phase(PhaseKind::Accumulation, &strings).unwrap();
    assert_eq!(a.result.ending_portfolio(), b.result.ending_portfolio());
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_missing_required_field() {
    let mut fields = accumulation_fields();
    fields.insert("expected_return", serde_json::Value::Null);
    let err = phases::calculate_phase(PhaseKind::Accumulation, &fields).unwrap_err();
    match err {
        PlannerError::MissingField { field } => assert_eq!(field, "expected_return"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_non_numeric_field_is_invalid() {
    let fields = accumulation_fields().with("current_savings", "ten thousand");
    let err = phases::calculate_phase(PhaseKind::Accumulation, &fields).unwrap_err();
    assert!(err.is_input_error());
    assert!(matches!(err, PlannerError::InvalidInput { .. }));
}

#[test]
fn test_end_before_start_rejected_consistently() {
    let accumulation = accumulation_fields().with("retirement_start_age", 25);
    let late = late_fields(100_000, 10_000, 1_000, 5, 0).with("life_expectancy", 80);
    for (kind, fields, end_field) in [
        (PhaseKind::Accumulation, accumulation, "retirement_start_age"),
        (PhaseKind::LateRetirement, late, "life_expectancy"),
    ] {
        match phases::calculate_phase(kind, &fields).unwrap_err() {
            PlannerError::InvalidInput { field, .. } => assert_eq!(field, end_field),
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn test_unrealistic_return_warns() {
    let fields = accumulation_fields().with("expected_return", 20);
    let out = phases::calculate_phase(PhaseKind::Accumulation, &fields).unwrap();
    assert!(out.warnings.iter().any(|w| w.contains("unrealistic")));
}
