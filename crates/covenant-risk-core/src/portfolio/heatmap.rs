use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use super::parallel::maybe_parallel_map;
use crate::config::EngineConfig;
use crate::covenants::evaluator::{CovenantStatus, AT_RISK_CUSHION_PCT};
use crate::covenants::loan::{evaluate_loan, LoanEvaluationResult};
use crate::covenants::model::{ingest_loans, CovenantOperator, Loan, LoanRecord};
use crate::covenants::stress::StressScenario;
use crate::types::*;
use crate::CovenantRiskResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressTestInput {
    pub loans: Vec<LoanRecord>,
    #[serde(default)]
    pub scenario: StressScenario,
    /// Restrict the run to these loan ids.
    #[serde(default)]
    pub loan_ids: Option<Vec<String>>,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Every loan handed to the engine that passed ingestion.
    pub total_loans_in_scope: usize,
    /// Loans with at least one evaluable covenant; the status counts below
    /// cover exactly these.
    pub loans_evaluated: usize,
    pub loans_without_covenants: usize,
    pub breached_count: usize,
    pub at_risk_count: usize,
    pub safe_count: usize,
    /// Sum of evaluated loan amounts. Equals the sum of `amount_by_status`.
    pub total_amount: Money,
    pub total_amount_in_scope: Money,
    pub amount_by_status: BTreeMap<CovenantStatus, Money>,
    pub amount_by_sector: BTreeMap<String, Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEvaluation {
    pub summary: PortfolioSummary,
    pub heatmap: Vec<LoanEvaluationResult>,
    pub unevaluated_loan_ids: Vec<String>,
    pub partial_failures: Vec<ItemFailure>,
}

/// One (loan, covenant) cell of the heatmap, flattened for tabular export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub loan_id: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub loan_amount: Money,
    pub currency: String,
    pub loan_status: CovenantStatus,
    pub covenant_id: String,
    pub covenant_name: String,
    pub clause_ref: String,
    pub operator: CovenantOperator,
    pub threshold: Decimal,
    pub unit: String,
    pub current_value: Decimal,
    pub stressed_value: Decimal,
    pub status: CovenantStatus,
    pub cushion_percent: Option<Percent>,
    pub breach_margin: Decimal,
}

impl PortfolioEvaluation {
    pub fn heatmap_rows(&self) -> Vec<HeatmapRow> {
        self.heatmap
            .iter()
            .flat_map(|loan| {
                loan.per_covenant.iter().map(move |c| HeatmapRow {
                    loan_id: loan.loan_id.clone(),
                    company_name: loan.company_name.clone(),
                    sector: loan.sector.clone(),
                    loan_amount: loan.amount,
                    currency: loan.currency.code().to_string(),
                    loan_status: loan.overall_status,
                    covenant_id: c.covenant_id.clone(),
                    covenant_name: c.name.clone(),
                    clause_ref: c.clause_ref.clone(),
                    operator: c.operator,
                    threshold: c.threshold,
                    unit: c.unit.clone(),
                    current_value: c.current_value,
                    stressed_value: c.stressed_value,
                    status: c.status,
                    cushion_percent: c.cushion_percent,
                    breach_margin: c.breach_margin,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run one scenario across a set of ingested loans.
///
/// Failures are returned, not logged; the `run_*` entry points log them
/// together with ingestion failures. Loans with no evaluable covenant stay out of the heatmap, the status
/// buckets and `total_amount`; they are still counted in scope and listed
/// in `unevaluated_loan_ids`.
pub fn evaluate_portfolio(
    loans: &[Loan],
    scenario: &StressScenario,
    config: &EngineConfig,
) -> PortfolioEvaluation {
    tracing::debug!(
        loans = loans.len(),
        parallel = config.should_parallelize(loans.len()),
        ebitda_drop_percent = %scenario.ebitda_drop_percent,
        interest_rate_hike_bps = %scenario.interest_rate_hike_bps,
        "evaluating portfolio"
    );

    let evaluations = maybe_parallel_map(loans, config, |loan| evaluate_loan(loan, scenario));

    let mut amount_by_status: BTreeMap<CovenantStatus, Money> = CovenantStatus::ALL
        .iter()
        .map(|s| (*s, Decimal::ZERO))
        .collect();
    let mut amount_by_sector: BTreeMap<String, Money> = BTreeMap::new();
    let mut heatmap = Vec::with_capacity(evaluations.len());
    let mut unevaluated_loan_ids = Vec::new();
    let mut partial_failures = Vec::new();
    let mut total_amount_in_scope = Decimal::ZERO;

    for evaluation in evaluations {
        partial_failures.extend(evaluation.failures);
        let result = evaluation.result;
        total_amount_in_scope += result.amount;

        if result.evaluated_count == 0 {
            unevaluated_loan_ids.push(result.loan_id);
            continue;
        }

        *amount_by_status
            .entry(result.overall_status)
            .or_insert(Decimal::ZERO) += result.amount;
        let sector = result
            .sector
            .clone()
            .unwrap_or_else(|| "Unclassified".to_string());
        *amount_by_sector.entry(sector).or_insert(Decimal::ZERO) += result.amount;
        heatmap.push(result);
    }

    let count = |status: CovenantStatus| {
        heatmap
            .iter()
            .filter(|l: &&LoanEvaluationResult| l.overall_status == status)
            .count()
    };

    let summary = PortfolioSummary {
        total_loans_in_scope: loans.len(),
        loans_evaluated: heatmap.len(),
        loans_without_covenants: unevaluated_loan_ids.len(),
        breached_count: count(CovenantStatus::Breached),
        at_risk_count: count(CovenantStatus::AtRisk),
        safe_count: count(CovenantStatus::Compliant),
        total_amount: heatmap.iter().map(|l| l.amount).sum(),
        total_amount_in_scope,
        amount_by_status,
        amount_by_sector,
    };

    PortfolioEvaluation {
        summary,
        heatmap,
        unevaluated_loan_ids,
        partial_failures,
    }
}

/// Ingest loan records, run the scenario and wrap the heatmap in the
/// standard computation envelope.
pub fn run_stress_test(
    input: &StressTestInput,
) -> CovenantRiskResult<ComputationOutput<PortfolioEvaluation>> {
    let start = Instant::now();
    input.scenario.validate()?;

    let (records, mut warnings) = select_records(&input.loans, input.loan_ids.as_deref());
    let ingestion = ingest_loans(&records);

    let mut evaluation = evaluate_portfolio(&ingestion.loans, &input.scenario, &input.config);
    let mut failures = ingestion.failures;
    failures.append(&mut evaluation.partial_failures);
    report_failures(&failures);
    evaluation.partial_failures = failures;

    warnings.extend(portfolio_warnings(
        &ingestion.loans,
        evaluation.unevaluated_loan_ids.len(),
        evaluation.partial_failures.len(),
    ));

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "ebitda_drop_percent": input.scenario.ebitda_drop_percent.to_string(),
        "interest_rate_hike_bps": input.scenario.interest_rate_hike_bps.to_string(),
        "at_risk_cushion_pct": AT_RISK_CUSHION_PCT.to_string(),
        "loans_submitted": input.loans.len(),
        "covenant_less_loans": "excluded from status buckets, counted in scope",
    });

    Ok(with_metadata(
        "Covenant Stress Test (ratio-sensitivity model, worst-of loan status)",
        &assumptions,
        warnings,
        elapsed,
        evaluation,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Apply the optional loan id filter, warning about ids that matched nothing.
pub(crate) fn select_records(
    records: &[LoanRecord],
    loan_ids: Option<&[String]>,
) -> (Vec<LoanRecord>, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(ids) = loan_ids else {
        return (records.to_vec(), warnings);
    };

    let wanted: BTreeSet<&str> = ids.iter().map(String::as_str).collect();
    let selected: Vec<LoanRecord> = records
        .iter()
        .filter(|r| wanted.contains(r.id.as_str()))
        .cloned()
        .collect();

    let found: BTreeSet<&str> = selected.iter().map(|r| r.id.as_str()).collect();
    for id in wanted.difference(&found) {
        warnings.push(format!("Loan '{id}' requested but not present in input; ignored."));
    }
    (selected, warnings)
}

/// One `warn!` per failed item, ingestion and evaluation alike.
pub(crate) fn report_failures(failures: &[ItemFailure]) {
    for failure in failures {
        tracing::warn!(
            loan_id = %failure.loan_id,
            covenant_id = ?failure.covenant_id,
            kind = ?failure.kind,
            "{}",
            failure.message
        );
    }
}

pub(crate) fn portfolio_warnings(loans: &[Loan], unevaluated: usize, failures: usize) -> Vec<String> {
    let mut warnings = Vec::new();

    let currencies: BTreeSet<&str> = loans.iter().map(|l| l.currency.code()).collect();
    if currencies.len() > 1 {
        warnings.push(format!(
            "Loan amounts span several currencies ({}); amount totals are not FX-converted.",
            currencies.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    if unevaluated > 0 {
        warnings.push(format!(
            "{unevaluated} loan(s) had no evaluable covenants and were excluded from the heatmap."
        ));
    }
    if failures > 0 {
        warnings.push(format!(
            "{failures} item(s) could not be fully evaluated; see partial_failures."
        ));
    }
    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
