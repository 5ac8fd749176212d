use napi::Result as NapiResult;
use napi_derive::napi;

use retirement_core::cache::PhaseCache;
use retirement_core::lifecycle::{self, LifecycleInput};
use retirement_core::monte_carlo::{self, AccumulationMcInput, WithdrawalMcInput};
use retirement_core::savings::{self, SavingsProjectionInput};
use retirement_core::{FieldMap, PhaseKind};
use std::sync::OnceLock;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_fields(input_json: &str) -> NapiResult<FieldMap> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

/// Process-wide cache, bounded at `DEFAULT_CAPACITY` entries.
fn phase_cache() -> &'static PhaseCache {
    static CACHE: OnceLock<PhaseCache> = OnceLock::new();
    CACHE.get_or_init(PhaseCache::new)
}

fn run_phase(kind: PhaseKind, input_json: &str) -> NapiResult<String> {
    let fields = parse_fields(input_json)?;
    let output = phase_cache()
        .calculate(kind, &fields)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Deterministic phases
// ---------------------------------------------------------------------------

/// `phase` is one of accumulation, phased_retirement, active_retirement, late_retirement.
#[napi]
pub fn calculate_phase(phase: String, input_json: String) -> NapiResult<String> {
    let kind: PhaseKind = phase.parse().map_err(to_napi_error)?;
    run_phase(kind, &input_json)
}

#[napi]
pub fn calculate_accumulation(input_json: String) -> NapiResult<String> {
    run_phase(PhaseKind::Accumulation, &input_json)
}

#[napi]
pub fn calculate_phased_retirement(input_json: String) -> NapiResult<String> {
    run_phase(PhaseKind::PhasedRetirement, &input_json)
}

#[napi]
pub fn calculate_active_retirement(input_json: String) -> NapiResult<String> {
    run_phase(PhaseKind::ActiveRetirement, &input_json)
}

#[napi]
pub fn calculate_late_retirement(input_json: String) -> NapiResult<String> {
    run_phase(PhaseKind::LateRetirement, &input_json)
}

#[napi]
pub fn clear_phase_cache() {
    phase_cache().clear();
}

// ---------------------------------------------------------------------------
// Monte Carlo
// ---------------------------------------------------------------------------

#[napi]
pub fn run_accumulation_monte_carlo(input_json: String) -> NapiResult<String> {
    let input = AccumulationMcInput::from_fields(&parse_fields(&input_json)?)
        .map_err(to_napi_error)?;
    let output = monte_carlo::run_accumulation_monte_carlo(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn run_withdrawal_monte_carlo(input_json: String) -> NapiResult<String> {
    let input =
        WithdrawalMcInput::from_fields(&parse_fields(&input_json)?).map_err(to_napi_error)?;
    let output = monte_carlo::run_withdrawal_monte_carlo(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

#[napi]
pub fn project_lifecycle(input_json: String) -> NapiResult<String> {
    let input: LifecycleInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = lifecycle::project_lifecycle(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_retirement_savings(input_json: String) -> NapiResult<String> {
    let input =
        SavingsProjectionInput::from_fields(&parse_fields(&input_json)?).map_err(to_napi_error)?;
    let output = savings::project_retirement_savings(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Phase kinds accepted by `calculatePhase`.
#[napi]
pub fn phase_kinds() -> Vec<String> {
    PhaseKind::ALL.iter().map(|k| k.as_str().to_string()).collect()
}

