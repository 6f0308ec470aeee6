use covenant_risk_core::covenants::{
    ingest_loans, stress_covenant, update_covenant_value, CovenantStatus, CovenantStressInput,
    CovenantUpdateInput, LoanRecord, RatioCategory, StressScenario,
};
use covenant_risk_core::covenants::evaluate_loan;
use covenant_risk_core::{CovenantRiskError, FailureKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Ingestion
// ===========================================================================

fn acme_record() -> LoanRecord {
    serde_json::from_value(serde_json::json!({
        "id": "loan-001",
        "company_name": "Acme Manufacturing",
        "sector": "Manufacturing",
        "amount": "25000000",
        "currency": "GBP",
        "covenants": [
            {
                "id": "cov-001-1",
                "name": "Total Net Debt to EBITDA",
                "clause_ref": "Clause 21.1",
                "threshold_value": "4.0",
                "operator": "<",
                "current_value": "3.2"
            },
            {
                "id": "cov-001-2",
                "name": "Interest Cover",
                "threshold_value": "2.0",
                "operator": "GTE",
                "current_value": "3.0"
            },
            {
                "id": "cov-001-3",
                "name": "DSCR",
                "threshold_value": "1.2",
                "operator": ">=",
                "current_value": null
            },
            {
                "id": "cov-001-4",
                "name": "Capex Limit",
                "threshold_value": "5",
                "operator": "equals",
                "current_value": "3"
            }
        ]
    }))
    .unwrap()
}

#[test]
fn test_ingestion_classifies_and_isolates_bad_covenants() {
    let ingestion = ingest_loans(&[acme_record()]);
    assert_eq!(ingestion.loans.len(), 1);

    let loan = &ingestion.loans[0];
    let categories: Vec<RatioCategory> = loan.covenants.iter().map(|c| c.ratio_category).collect();
    assert_eq!(
        categories,
        vec![
            RatioCategory::LeverageRatio,
            RatioCategory::CoverageRatio,
            RatioCategory::ServiceCoverageRatio,
        ]
    );

    assert_eq!(ingestion.failures.len(), 1);
    let failure = &ingestion.failures[0];
    assert_eq!(failure.loan_id, "loan-001");
    assert_eq!(failure.covenant_id.as_deref(), Some("cov-001-4"));
    assert_eq!(failure.kind, FailureKind::InvalidInput);
}

#[test]
fn test_rejected_loan_does_not_stop_the_batch() {
    let mut broken = acme_record();
    broken.id = String::new();
    let ingestion = ingest_loans(&[broken, acme_record()]);
    assert_eq!(ingestion.loans.len(), 1);
    assert!(ingestion
        .failures
        .iter()
        .any(|f| f.kind == FailureKind::InvalidInput && f.covenant_id.is_none()));
}

// ===========================================================================
// Loan evaluation
// ===========================================================================

#[test]
fn test_loan_under_twenty_percent_ebitda_drop() {
    let ingestion = ingest_loans(&[acme_record()]);
    let scenario = StressScenario::new(dec!(20), Decimal::ZERO).unwrap();
    let eval = evaluate_loan(&ingestion.loans[0], &scenario);
    let r = &eval.result;

    // Leverage 3.2 / 0.8 = 4.0 hits the strict `<` bound.
    assert_eq!(r.per_covenant[0].stressed_value, dec!(4.0));
    assert_eq!(r.per_covenant[0].status, CovenantStatus::Breached);
    assert_eq!(r.per_covenant[0].breach_margin, Decimal::ZERO);

    // Coverage 3.0 * 0.8 = 2.4, cushion 20%.
    assert_eq!(r.per_covenant[1].stressed_value, dec!(2.4));
    assert_eq!(r.per_covenant[1].status, CovenantStatus::Compliant);

    assert_eq!(r.overall_status, CovenantStatus::Breached);
    assert_eq!(r.evaluated_count, 2);
    assert_eq!(r.skipped_count, 1);
    assert_eq!(r.breached_count, 1);
    assert!(eval.failures.is_empty());
}

#[test]
fn test_baseline_leaves_values_untouched() {
    let ingestion = ingest_loans(&[acme_record()]);
    let eval = evaluate_loan(&ingestion.loans[0], &StressScenario::baseline());
    for c in &eval.result.per_covenant {
        assert_eq!(c.stressed_value, c.current_value);
    }
    assert_eq!(eval.result.overall_status, CovenantStatus::Compliant);
}

// ===========================================================================
// Single covenant requests
// ===========================================================================

#[test]
fn test_stress_single_covenant_request() {
    let input: CovenantStressInput = serde_json::from_str(
        r#"{
            "covenant": {
                "id": "c1",
                "name": "Debt/EBITDA",
                "threshold_value": "4.0",
                "operator": "LT",
                "current_value": "3.2"
            },
            "scenario": { "ebitda_drop_percent": "10" }
        }"#,
    )
    .unwrap();

    let out = stress_covenant(&input).unwrap();
    let r = &out.result;
    assert_eq!(r.status, CovenantStatus::Compliant);
    // 3.2 / 0.9 = 3.5556; cushion (4.0 - 3.5556) / 4.0 = 11.1%
    assert_eq!(r.stressed_value.round_dp(4), dec!(3.5556));
    assert_eq!(r.cushion_percent.map(|c| c.round_dp(1)), Some(dec!(11.1)));
    assert_eq!(out.methodology, "Covenant Stress Evaluation");
}

#[test]
fn test_stress_rejects_out_of_range_scenario() {
    let input: CovenantStressInput = serde_json::from_str(
        r#"{
            "covenant": {
                "id": "c1",
                "name": "Debt/EBITDA",
                "threshold_value": "4.0",
                "operator": "LT",
                "current_value": "3.2"
            },
            "scenario": { "ebitda_drop_percent": "120" }
        }"#,
    )
    .unwrap();
    let err = stress_covenant(&input).unwrap_err();
    assert!(matches!(err, CovenantRiskError::InvalidInput { ref field, .. } if field == "ebitda_drop_percent"));
}

#[test]
fn test_value_update_flags_status_change() {
    let input: CovenantUpdateInput = serde_json::from_str(
        r#"{
            "covenant": {
                "id": "c2",
                "name": "Minimum Liquidity Ratio",
                "threshold_value": "1.2",
                "operator": ">",
                "current_value": "1.5"
            },
            "new_value": "1.1",
            "source": "Q3 Compliance Certificate",
            "submission_date": "2024-10-31"
        }"#,
    )
    .unwrap();

    let out = update_covenant_value(&input).unwrap();
    let u = &out.result;
    assert_eq!(u.old_value, Some(dec!(1.5)));
    assert_eq!(u.old_status, Some(CovenantStatus::Compliant));
    assert_eq!(u.new_status, CovenantStatus::Breached);
    assert!(u.status_changed);
    assert_eq!(u.breach_margin, dec!(0.1));
}
