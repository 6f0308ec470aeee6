use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::evaluator::{self, CovenantStatus};
use super::model::{Covenant, CovenantOperator, CovenantRecord, Loan, RatioCategory};
use super::stress::{self, StressScenario};
use crate::error::CovenantRiskError;
use crate::types::*;
use crate::CovenantRiskResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// One covenant's outcome under a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantEvaluationResult {
    pub covenant_id: String,
    pub name: String,
    pub clause_ref: String,
    pub ratio_category: RatioCategory,
    pub operator: CovenantOperator,
    pub threshold: Decimal,
    pub unit: String,
    pub current_value: Decimal,
    pub stressed_value: Decimal,
    pub status: CovenantStatus,
    pub cushion_percent: Option<Percent>,
    pub breach_margin: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanEvaluationResult {
    pub loan_id: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub overall_status: CovenantStatus,
    pub breached_count: usize,
    pub at_risk_count: usize,
    pub compliant_count: usize,
    /// Covenants that had a current value and were evaluated.
    pub evaluated_count: usize,
    /// Covenants without a current value.
    pub skipped_count: usize,
    /// Covenants whose stressed value or cushion left the decimal range.
    /// Each one is also reported as an item failure.
    pub failed_count: usize,
    pub per_covenant: Vec<CovenantEvaluationResult>,
}

/// A loan result together with the per-covenant problems found on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanEvaluation {
    pub result: LoanEvaluationResult,
    pub failures: Vec<ItemFailure>,
}

/// Request to stress a single covenant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovenantStressInput {
    pub covenant: CovenantRecord,
    #[serde(default)]
    pub scenario: StressScenario,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Stress and classify one covenant. Returns `Ok(None)` when the covenant has
/// no current value.
pub fn evaluate_covenant(
    covenant: &Covenant,
    scenario: &StressScenario,
) -> CovenantRiskResult<Option<CovenantEvaluationResult>> {
    let Some(current) = covenant.current_value else {
        return Ok(None);
    };
    let stressed = stress::stress(current, covenant.ratio_category, scenario)?;
    let eval = evaluator::evaluate(covenant.threshold_value, covenant.operator, stressed)?;

    Ok(Some(CovenantEvaluationResult {
        covenant_id: covenant.id.clone(),
        name: covenant.name.clone(),
        clause_ref: covenant.clause_ref.clone(),
        ratio_category: covenant.ratio_category,
        operator: covenant.operator,
        threshold: covenant.threshold_value,
        unit: covenant.unit.clone(),
        current_value: current,
        stressed_value: stressed,
        status: eval.status,
        cushion_percent: eval.cushion_percent,
        breach_margin: eval.breach_margin,
    }))
}

/// Evaluate every covenant of a loan and derive the worst-of status.
///
/// Covenants without a current value neither help nor hurt the loan. A
/// covenant whose arithmetic overflows is reported as a failure and left out,
/// the rest of the loan is still evaluated. A loan with nothing to evaluate
/// is compliant with `evaluated_count == 0`.
pub fn evaluate_loan(loan: &Loan, scenario: &StressScenario) -> LoanEvaluation {
    let mut per_covenant = Vec::with_capacity(loan.covenants.len());
    let mut failures = Vec::new();
    let mut skipped_count = 0;
    let mut failed_count = 0;

    for covenant in &loan.covenants {
        match evaluate_covenant(covenant, scenario) {
            Ok(Some(r)) => {
                if r.cushion_percent.is_none() {
                    let err = CovenantRiskError::DivisionUndefined {
                        context: format!(
                            "cushion for covenant '{}' (threshold is zero)",
                            covenant.name
                        ),
                    };
                    failures.push(ItemFailure::from_error(&loan.id, Some(&covenant.id), &err));
                }
                per_covenant.push(r);
            }
            Ok(None) => skipped_count += 1,
            Err(err) => {
                failed_count += 1;
                failures.push(ItemFailure::from_error(&loan.id, Some(&covenant.id), &err));
            }
        }
    }

    let count = |status: CovenantStatus| per_covenant.iter().filter(|r| r.status == status).count();
    let breached_count = count(CovenantStatus::Breached);
    let at_risk_count = count(CovenantStatus::AtRisk);
    let compliant_count = count(CovenantStatus::Compliant);

    let overall_status = per_covenant
        .iter()
        .map(|r| r.status)
        .fold(CovenantStatus::Compliant, CovenantStatus::worst);

    LoanEvaluation {
        result: LoanEvaluationResult {
            loan_id: loan.id.clone(),
            company_name: loan.company_name.clone(),
            sector: loan.sector.clone(),
            amount: loan.amount,
            currency: loan.currency.clone(),
            overall_status,
            breached_count,
            at_risk_count,
            compliant_count,
            evaluated_count: per_covenant.len(),
            skipped_count,
            failed_count,
            per_covenant,
        },
        failures,
    }
}

/// Ingest and stress a single covenant record.
pub fn stress_covenant(
    input: &CovenantStressInput,
) -> CovenantRiskResult<ComputationOutput<CovenantEvaluationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.scenario.validate()?;
    let covenant = Covenant::ingest(&input.covenant)?;

    let result = evaluate_covenant(&covenant, &input.scenario)?.ok_or_else(|| {
        CovenantRiskError::InsufficientData(format!(
            "Covenant '{}' has no current value to evaluate.",
            covenant.name
        ))
    })?;

    if result.cushion_percent.is_none() {
        warnings.push(format!(
            "Covenant '{}': threshold is zero; cushion is undefined and status uses the breach test only.",
            covenant.name
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "ratio_category": covenant.ratio_category,
        "ebitda_drop_percent": input.scenario.ebitda_drop_percent.to_string(),
        "interest_rate_hike_bps": input.scenario.interest_rate_hike_bps.to_string(),
        "at_risk_cushion_pct": evaluator::AT_RISK_CUSHION_PCT.to_string(),
    });

    Ok(with_metadata(
        "Covenant Stress Evaluation",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
