//! Recalculation of a covenant when a borrower reports a new value.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::evaluator::{self, CovenantStatus};
use super::model::{Covenant, CovenantRecord};
use crate::types::*;
use crate::CovenantRiskResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovenantUpdateInput {
    pub covenant: CovenantRecord,
    pub new_value: Decimal,
    /// Where the figure came from, e.g. "Q4 Financial Statements".
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub submission_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantValueUpdate {
    pub covenant_id: String,
    pub old_value: Option<Decimal>,
    pub new_value: Decimal,
    pub old_status: Option<CovenantStatus>,
    pub new_status: CovenantStatus,
    pub status_changed: bool,
    pub cushion_percent: Option<Percent>,
    pub breach_margin: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_date: Option<NaiveDate>,
}

/// Classify `new_value` against the covenant and compare with the status
/// implied by its previous value. No stress is applied.
pub fn recalculate_covenant(
    covenant: &Covenant,
    new_value: Decimal,
) -> CovenantRiskResult<CovenantValueUpdate> {
    let old_status = covenant
        .current_value
        .map(|v| evaluator::evaluate(covenant.threshold_value, covenant.operator, v))
        .transpose()?
        .map(|e| e.status);
    let eval = evaluator::evaluate(covenant.threshold_value, covenant.operator, new_value)?;

    Ok(CovenantValueUpdate {
        covenant_id: covenant.id.clone(),
        old_value: covenant.current_value,
        new_value,
        old_status,
        new_status: eval.status,
        status_changed: old_status != Some(eval.status),
        cushion_percent: eval.cushion_percent,
        breach_margin: eval.breach_margin,
        source: None,
        submission_date: None,
    })
}

pub fn update_covenant_value(
    input: &CovenantUpdateInput,
) -> CovenantRiskResult<ComputationOutput<CovenantValueUpdate>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let covenant = Covenant::ingest(&input.covenant)?;
    let mut update = recalculate_covenant(&covenant, input.new_value)?;
    update.source = input.source.clone();
    update.submission_date = input.submission_date;

    if update.cushion_percent.is_none() {
        warnings.push(format!(
            "Covenant '{}': threshold is zero; cushion is undefined.",
            covenant.name
        ));
    }
    if update.old_status.is_none() {
        warnings.push(format!(
            "Covenant '{}' had no previous value; first reading recorded.",
            covenant.name
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "operator": covenant.operator.symbol(),
        "threshold": covenant.threshold_value.to_string(),
        "at_risk_cushion_pct": evaluator::AT_RISK_CUSHION_PCT.to_string(),
    });

    Ok(with_metadata(
        "Covenant Value Recalculation",
        &assumptions,
        warnings,
        elapsed,
        update,
    ))
}
