//! Chains phases into one life-cycle projection.
//!
//! Each step names a phase and its fields. When a step after the first
//! omits its opening balance, the previous phase's ending portfolio is
//! carried into it.

use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::PlannerError;
use crate::fields::FieldMap;
use crate::phases::{calculate_phase, PhaseResult};
use crate::types::{with_metadata, Age, ComputationOutput, Money, PhaseKind};
use crate::PlannerResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleStep {
    pub phase: PhaseKind,
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleInput {
    pub steps: Vec<LifecycleStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleResult {
    pub phases: Vec<PhaseResult>,
    pub final_portfolio: Money,
    pub total_years: u32,
    /// First phase in which the portfolio ran out or went overdrawn.
    pub depleted_in: Option<PhaseKind>,
    /// Set only for phases that stop at depletion (active and late retirement).
    pub depletion_age: Option<Age>,
}

/// Field holding a phase's opening balance.
fn opening_balance_field(kind: PhaseKind) -> &'static str {
    match kind {
        PhaseKind::Accumulation => "current_savings",
        _ => "starting_portfolio",
    }
}

pub fn project_lifecycle(
    input: &LifecycleInput,
) -> PlannerResult<ComputationOutput<LifecycleResult>> {
    let start = Instant::now();
    if input.steps.is_empty() {
        return Err(PlannerError::invalid("steps", "At least one phase is required"));
    }

    let mut warnings: Vec<String> = Vec::new();
    let mut phases = Vec::with_capacity(input.steps.len());
    let mut carried: Option<Money> = None;
    let mut depleted_in = None;
    let mut depletion_age = None;

    for step in &input.steps {
        let field = opening_balance_field(step.phase);
        let fields = match carried {
            Some(balance) if !step.fields.has(field) => {
                debug!("carrying {balance} into {} as {field}", step.phase);
                step.fields.clone().with(field, balance.to_string())
            }
            _ => step.fields.clone(),
        };

        let output = calculate_phase(step.phase, &fields)?;
        warnings.extend(
            output
                .warnings
                .into_iter()
                .map(|w| format!("[{}] {w}", step.phase)),
        );

        let result = output.result;
        if depleted_in.is_none() {
            if let Some(age) = result.depletion_age() {
                warn!("portfolio depleted during {} at age {age}", step.phase);
                depleted_in = Some(step.phase);
                depletion_age = Some(age);
            }
        }
        let ending = result.ending_portfolio();
        if ending < Decimal::ZERO {
            warn!("{} ended overdrawn at {ending}; carrying zero forward", step.phase);
            warnings.push(format!(
                "[{}] Ending balance {} is negative; the next phase starts from zero",
                step.phase,
                ending.round_dp(2)
            ));
            depleted_in.get_or_insert(step.phase);
        }
        carried = Some(ending.max(Decimal::ZERO));
        phases.push(result);
    }

    let final_portfolio = phases
        .last()
        .map(PhaseResult::ending_portfolio)
        .unwrap_or_default();
    let total_years = phases.iter().map(PhaseResult::duration_years).sum();

    let order: Vec<&str> = input.steps.iter().map(|s| s.phase.as_str()).collect();
    let output = LifecycleResult {
        phases,
        final_portfolio,
        total_years,
        depleted_in,
        depletion_age,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sequential phase projection with carried-forward portfolio balance",
        &serde_json::json!({ "phases": order }),
        warnings,
        elapsed,
        output,
    ))
}
