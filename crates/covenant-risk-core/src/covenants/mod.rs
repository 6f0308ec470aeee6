pub mod evaluator;
pub mod loan;
pub mod model;
pub mod monitor;
pub mod stress;

pub use evaluator::{evaluate, CovenantEvaluation, CovenantStatus, AT_RISK_CUSHION_PCT};
pub use loan::{
    evaluate_covenant, evaluate_loan, stress_covenant, CovenantEvaluationResult,
    CovenantStressInput, LoanEvaluation, LoanEvaluationResult,
};
pub use monitor::{recalculate_covenant, update_covenant_value, CovenantUpdateInput, CovenantValueUpdate};
pub use model::{
    ingest_loans, Covenant, CovenantKind, CovenantOperator, CovenantRecord, Loan, LoanRecord,
    RatioCategory, MAX_LOAN_AMOUNT,
};
pub use stress::{stress, StressScenario};
