//! Named stress scenarios and baseline-versus-stressed comparison.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use super::heatmap::{
    evaluate_portfolio, portfolio_warnings, report_failures, select_records, PortfolioSummary,
};
use crate::config::EngineConfig;
use crate::covenants::evaluator::CovenantStatus;
use crate::covenants::loan::LoanEvaluationResult;
use crate::covenants::model::{ingest_loans, Loan, LoanRecord};
use crate::covenants::stress::StressScenario;
use crate::error::CovenantRiskError;
use crate::types::*;
use crate::CovenantRiskResult;

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioPreset {
    #[serde(rename = "baseline")]
    Baseline,
    #[serde(rename = "rate_plus_200bps")]
    RatePlus200Bps,
    #[serde(rename = "ebitda_minus_10")]
    EbitdaMinus10,
    #[serde(rename = "combined")]
    Combined,
}

impl ScenarioPreset {
    pub const ALL: [ScenarioPreset; 4] = [
        ScenarioPreset::Baseline,
        ScenarioPreset::RatePlus200Bps,
        ScenarioPreset::EbitdaMinus10,
        ScenarioPreset::Combined,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ScenarioPreset::Baseline => "baseline",
            ScenarioPreset::RatePlus200Bps => "rate_plus_200bps",
            ScenarioPreset::EbitdaMinus10 => "ebitda_minus_10",
            ScenarioPreset::Combined => "combined",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ScenarioPreset::Baseline => "Baseline (No Stress)",
            ScenarioPreset::RatePlus200Bps => "Interest Rate +2%",
            ScenarioPreset::EbitdaMinus10 => "EBITDA -10%",
            ScenarioPreset::Combined => "Combined Stress",
        }
    }

    pub fn scenario(self) -> StressScenario {
        let (drop, bps) = match self {
            ScenarioPreset::Baseline => (Decimal::ZERO, Decimal::ZERO),
            ScenarioPreset::RatePlus200Bps => (Decimal::ZERO, dec!(200)),
            ScenarioPreset::EbitdaMinus10 => (dec!(10), Decimal::ZERO),
            ScenarioPreset::Combined => (dec!(10), dec!(200)),
        };
        StressScenario {
            ebitda_drop_percent: drop,
            interest_rate_hike_bps: bps,
        }
    }
}

impl fmt::Display for ScenarioPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ScenarioPreset {
    type Err = CovenantRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ScenarioPreset::ALL
            .into_iter()
            .find(|p| p.id() == wanted)
            .ok_or_else(|| CovenantRiskError::InvalidInput {
                field: "preset".into(),
                reason: format!(
                    "Unknown scenario preset '{s}'; expected one of: {}",
                    ScenarioPreset::ALL.map(|p| p.id()).join(", ")
                ),
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub id: String,
    pub name: String,
    pub scenario: StressScenario,
}

pub fn list_presets() -> Vec<PresetInfo> {
    ScenarioPreset::ALL
        .iter()
        .map(|p| PresetInfo {
            id: p.id().to_string(),
            name: p.display_name().to_string(),
            scenario: p.scenario(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Comparison types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonInput {
    pub loans: Vec<LoanRecord>,
    /// Explicit scenario; takes precedence over `preset`.
    #[serde(default)]
    pub scenario: Option<StressScenario>,
    #[serde(default)]
    pub preset: Option<ScenarioPreset>,
    #[serde(default)]
    pub loan_ids: Option<Vec<String>>,
    #[serde(default)]
    pub config: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantStatusChange {
    pub covenant_id: String,
    pub name: String,
    pub current_value: Decimal,
    pub stressed_value: Decimal,
    pub baseline_status: CovenantStatus,
    pub stressed_status: CovenantStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactedLoan {
    pub loan_id: String,
    pub company_name: String,
    pub amount: Money,
    pub baseline_status: CovenantStatus,
    pub stressed_status: CovenantStatus,
    pub new_breaches: usize,
    pub changed_covenants: Vec<CovenantStatusChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenario: StressScenario,
    pub baseline: PortfolioSummary,
    pub stressed: PortfolioSummary,
    /// Covenants breached under stress that were not breached at baseline.
    pub total_new_breaches: usize,
    /// Loans with at least one new breach.
    pub affected_loans: usize,
    /// Largest number of breached covenants on a single loan under stress.
    pub worst_case_breaches: usize,
    /// Loans at risk or breached under stress.
    pub impacted_loans: Vec<ImpactedLoan>,
    pub partial_failures: Vec<ItemFailure>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate the same loans at baseline and under `scenario` and report what
/// moved.
pub fn compare_scenario(
    loans: &[Loan],
    scenario: &StressScenario,
    config: &EngineConfig,
) -> ScenarioComparison {
    let baseline = evaluate_portfolio(loans, &StressScenario::baseline(), config);
    let stressed = evaluate_portfolio(loans, scenario, config);

    // A covenant can fail under stress and still evaluate at baseline, so
    // results are matched by id rather than by position.
    let mut baseline_by_loan: BTreeMap<&str, &LoanEvaluationResult> = BTreeMap::new();
    for loan in &baseline.heatmap {
        baseline_by_loan.entry(loan.loan_id.as_str()).or_insert(loan);
    }

    let mut impacted_loans = Vec::new();
    let mut total_new_breaches = 0;
    let mut affected_loans = 0;

    for stress in &stressed.heatmap {
        let base = baseline_by_loan.get(stress.loan_id.as_str()).copied();
        let baseline_status = |covenant_id: &str| {
            base.and_then(|b| b.per_covenant.iter().find(|c| c.covenant_id == covenant_id))
                .map(|c| c.status)
        };

        let new_breaches = stress
            .per_covenant
            .iter()
            .filter(|s| {
                s.status == CovenantStatus::Breached
                    && baseline_status(s.covenant_id.as_str()) != Some(CovenantStatus::Breached)
            })
            .count();
        total_new_breaches += new_breaches;
        if new_breaches > 0 {
            affected_loans += 1;
        }

        if stress.overall_status == CovenantStatus::Compliant {
            continue;
        }

        let changed_covenants = stress
            .per_covenant
            .iter()
            .filter_map(|s| {
                let before = baseline_status(s.covenant_id.as_str())?;
                (before != s.status).then(|| CovenantStatusChange {
                    covenant_id: s.covenant_id.clone(),
                    name: s.name.clone(),
                    current_value: s.current_value,
                    stressed_value: s.stressed_value,
                    baseline_status: before,
                    stressed_status: s.status,
                })
            })
            .collect();

        impacted_loans.push(ImpactedLoan {
            loan_id: stress.loan_id.clone(),
            company_name: stress.company_name.clone(),
            amount: stress.amount,
            baseline_status: base.map_or(CovenantStatus::Compliant, |b| b.overall_status),
            stressed_status: stress.overall_status,
            new_breaches,
            changed_covenants,
        });
    }

    let worst_case_breaches = stressed
        .heatmap
        .iter()
        .map(|l| l.breached_count)
        .max()
        .unwrap_or(0);

    ScenarioComparison {
        scenario: *scenario,
        baseline: baseline.summary,
        stressed: stressed.summary,
        total_new_breaches,
        affected_loans,
        worst_case_breaches,
        impacted_loans,
        partial_failures: stressed.partial_failures,
    }
}

pub fn run_scenario_comparison(
    input: &ScenarioComparisonInput,
) -> CovenantRiskResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();

    let (scenario, scenario_name) = match (input.scenario, input.preset) {
        (Some(s), _) => (s, "Custom".to_string()),
        (None, Some(p)) => (p.scenario(), p.display_name().to_string()),
        (None, None) => {
            return Err(CovenantRiskError::InvalidInput {
                field: "scenario".into(),
                reason: "Provide either a scenario or a preset to compare against baseline".into(),
            })
        }
    };
    scenario.validate()?;

    let (records, mut warnings) = select_records(&input.loans, input.loan_ids.as_deref());
    let ingestion = ingest_loans(&records);
    let mut comparison = compare_scenario(&ingestion.loans, &scenario, &input.config);

    let mut failures = ingestion.failures;
    failures.append(&mut comparison.partial_failures);
    report_failures(&failures);
    comparison.partial_failures = failures;

    if scenario.is_baseline() {
        warnings.push("Scenario is the baseline; no movement expected.".into());
    }
    warnings.extend(portfolio_warnings(
        &ingestion.loans,
        comparison.stressed.loans_without_covenants,
        comparison.partial_failures.len(),
    ));

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "scenario_name": scenario_name,
        "ebitda_drop_percent": scenario.ebitda_drop_percent.to_string(),
        "interest_rate_hike_bps": scenario.interest_rate_hike_bps.to_string(),
    });

    Ok(with_metadata(
        "Baseline vs Stressed Covenant Comparison",
        &assumptions,
        warnings,
        elapsed,
        comparison,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covenants::model::{Covenant, CovenantKind, CovenantOperator, RatioCategory};

    fn covenant(id: &str, category: RatioCategory, op: CovenantOperator, t: Decimal, v: Decimal) -> Covenant {
        Covenant {
            id: id.into(),
            name: id.into(),
            clause_ref: String::new(),
            kind: CovenantKind::Financial,
            threshold_value: t,
            operator: op,
            unit: "x".into(),
            current_value: Some(v),
            ratio_category: category,
        }
    }

    fn loans() -> Vec<Loan> {
        vec![
            Loan {
                id: "loan-1".into(),
                company_name: "Fragile Co".into(),
                sector: None,
                amount: dec!(500),
                currency: Currency::EUR,
                covenants: vec![
                    covenant("lev", RatioCategory::LeverageRatio, CovenantOperator::LT, dec!(4.0), dec!(3.2)),
                    covenant("icr", RatioCategory::CoverageRatio, CovenantOperator::GTE, dec!(2.0), dec!(4.0)),
                ],
            },
            Loan {
                id: "loan-2".into(),
                company_name: "Sturdy Co".into(),
                sector: None,
                amount: dec!(300),
                currency: Currency::EUR,
                covenants: vec![covenant(
                    "lev",
                    RatioCategory::LeverageRatio,
                    CovenantOperator::LT,
                    dec!(5.0),
                    dec!(1.0),
                )],
            },
        ]
    }

    #[test]
    fn test_presets_round_trip_by_id() {
        for p in ScenarioPreset::ALL {
            assert_eq!(p.id().parse::<ScenarioPreset>().unwrap(), p);
        }
        assert!("esg_miss".parse::<ScenarioPreset>().is_err());
        assert!(ScenarioPreset::Baseline.scenario().is_baseline());
    }

    #[test]
    fn test_combined_preset_values() {
        let s = ScenarioPreset::Combined.scenario();
        assert_eq!(s.ebitda_drop_percent, dec!(10));
        assert_eq!(s.interest_rate_hike_bps, dec!(200));
        assert_eq!(list_presets().len(), 4);
    }

    #[test]
    fn test_comparison_finds_new_breach() {
        let scenario = StressScenario::new(dec!(20), Decimal::ZERO).unwrap();
        let cmp = compare_scenario(&loans(), &scenario, &EngineConfig::sequential());

        assert_eq!(cmp.baseline.breached_count, 0);
        assert_eq!(cmp.stressed.breached_count, 1);
        assert_eq!(cmp.total_new_breaches, 1);
        assert_eq!(cmp.affected_loans, 1);
        assert_eq!(cmp.worst_case_breaches, 1);

        assert_eq!(cmp.impacted_loans.len(), 1);
        let hit = &cmp.impacted_loans[0];
        assert_eq!(hit.loan_id, "loan-1");
        assert_eq!(hit.baseline_status, CovenantStatus::Compliant);
        assert_eq!(hit.stressed_status, CovenantStatus::Breached);
        assert_eq!(hit.changed_covenants.len(), 1);
        assert_eq!(hit.changed_covenants[0].covenant_id, "lev");
    }

    #[test]
    fn test_covenant_failing_only_under_stress_does_not_shift_pairs() {
        // 1e25 against 9.6e24 is at risk at baseline and overflows at a 100% drop.
        let huge = covenant(
            "huge",
            RatioCategory::LeverageRatio,
            CovenantOperator::GTE,
            Decimal::from_i128_with_scale(96 * 10_i128.pow(23), 0),
            Decimal::from_i128_with_scale(10_i128.pow(25), 0),
        );
        let lev = covenant("lev", RatioCategory::LeverageRatio, CovenantOperator::LT, dec!(4.0), dec!(3.2));
        let book = vec![Loan {
            id: "loan-1".into(),
            company_name: "Outlier Co".into(),
            sector: None,
            amount: dec!(100),
            currency: Currency::EUR,
            covenants: vec![huge, lev],
        }];

        let scenario = StressScenario::new(dec!(100), Decimal::ZERO).unwrap();
        let cmp = compare_scenario(&book, &scenario, &EngineConfig::sequential());

        assert_eq!(cmp.partial_failures.len(), 1);
        assert_eq!(cmp.total_new_breaches, 1);
        let hit = &cmp.impacted_loans[0];
        assert_eq!(hit.baseline_status, CovenantStatus::AtRisk);
        assert_eq!(hit.changed_covenants.len(), 1);
        assert_eq!(hit.changed_covenants[0].covenant_id, "lev");
        assert_eq!(hit.changed_covenants[0].baseline_status, CovenantStatus::Compliant);
    }

    #[test]
    fn test_baseline_comparison_is_flat() {
        let cmp = compare_scenario(&loans(), &StressScenario::baseline(), &EngineConfig::sequential());
        assert_eq!(cmp.total_new_breaches, 0);
        assert_eq!(cmp.baseline, cmp.stressed);
    }

    #[test]
    fn test_comparison_requires_a_scenario() {
        let input = ScenarioComparisonInput {
            loans: vec![],
            scenario: None,
            preset: None,
            loan_ids: None,
            config: EngineConfig::default(),
        };
        assert!(run_scenario_comparison(&input).is_err());
    }

    #[test]
    fn test_preset_deserializes_from_id() {
        let p: ScenarioPreset = serde_json::from_str("\"ebitda_minus_10\"").unwrap();
        assert_eq!(p, ScenarioPreset::EbitdaMinus10);
    }
}
