//! Covenant and loan records, and their ingestion into engine types.
//!
//! Callers hand over loosely-typed records (the operator is a string, the
//! ratio category may be missing). Ingestion validates each record once and
//! assigns its `RatioCategory`, so stress evaluation never has to look at
//! covenant names again.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CovenantRiskError;
use crate::types::{Currency, ItemFailure, Money};
use crate::CovenantRiskResult;

/// Largest accepted loan amount. Keeps portfolio totals inside the
/// `Decimal` range for any realistic number of loans.
pub const MAX_LOAN_AMOUNT: Money = dec!(1_000_000_000_000_000);

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovenantKind {
    #[default]
    Financial,
    Esg,
    Operational,
}

/// Comparison the covenant must satisfy: `value <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CovenantOperator {
    LT,
    LTE,
    GT,
    GTE,
}

/// Which side of the threshold the value has to stay on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Value must stay below the threshold (LT, LTE).
    Upper,
    /// Value must stay above the threshold (GT, GTE).
    Lower,
}

impl CovenantOperator {
    pub fn bound(self) -> Bound {
        match self {
            CovenantOperator::LT | CovenantOperator::LTE => Bound::Upper,
            CovenantOperator::GT | CovenantOperator::GTE => Bound::Lower,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CovenantOperator::LT => "<",
            CovenantOperator::LTE => "<=",
            CovenantOperator::GT => ">",
            CovenantOperator::GTE => ">=",
        }
    }
}

impl fmt::Display for CovenantOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for CovenantOperator {
    type Err = CovenantRiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LT" | "<" | "LESS_THAN" => Ok(CovenantOperator::LT),
            "LTE" | "<=" | "LESS_THAN_EQUAL" => Ok(CovenantOperator::LTE),
            "GT" | ">" | "GREATER_THAN" => Ok(CovenantOperator::GT),
            "GTE" | ">=" | "GREATER_THAN_EQUAL" => Ok(CovenantOperator::GTE),
            other => Err(CovenantRiskError::InvalidInput {
                field: "operator".into(),
                reason: format!("Unrecognized covenant operator '{other}'; expected LT, LTE, GT or GTE"),
            }),
        }
    }
}

/// How a covenant's value reacts to an EBITDA or rate shock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatioCategory {
    /// Debt / EBITDA style, lower is better.
    LeverageRatio,
    /// EBITDA / interest style, higher is better.
    CoverageRatio,
    /// DSCR style, higher is better.
    ServiceCoverageRatio,
    /// Current ratio, minimum liquidity.
    LiquidityRatio,
    Other,
}

impl RatioCategory {
    /// Classify a covenant from its name and kind.
    ///
    /// Only used at ingestion when the caller did not tag the covenant
    /// explicitly. The name is split into lowercase alphanumeric tokens so
    /// that "Debt-to-EBITDA", "Net Debt / EBITDA" and "debt_ebitda" agree.
    pub fn classify(name: &str, kind: CovenantKind) -> Self {
        if kind != CovenantKind::Financial {
            return RatioCategory::Other;
        }

        let lowered = name.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let has = |t: &str| tokens.contains(&t);

        if has("dscr") || (has("debt") && has("service")) {
            RatioCategory::ServiceCoverageRatio
        } else if has("leverage") || has("gearing") || (has("debt") && has("ebitda")) {
            RatioCategory::LeverageRatio
        } else if has("icr")
            || (has("interest") && (has("coverage") || has("cover") || has("ebitda")))
            || (has("fixed") && has("charge"))
        {
            RatioCategory::CoverageRatio
        } else if has("liquidity") || ((has("current") || has("quick")) && has("ratio")) {
            RatioCategory::LiquidityRatio
        } else {
            RatioCategory::Other
        }
    }
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

fn default_unit() -> String {
    "x".to_string()
}

/// A covenant as supplied by persistence or the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovenantRecord {
    pub id: String,
    pub name: String,
    /// Free text reference into the facility agreement, e.g. "Clause 18.2".
    #[serde(default)]
    pub clause_ref: String,
    #[serde(default)]
    pub kind: CovenantKind,
    pub threshold_value: Decimal,
    pub operator: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub current_value: Option<Decimal>,
    /// Explicit capability tag; when absent the name is classified.
    #[serde(default)]
    pub ratio_category: Option<RatioCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: String,
    pub company_name: String,
    #[serde(default)]
    pub sector: Option<String>,
    pub amount: Money,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub covenants: Vec<CovenantRecord>,
}

// ---------------------------------------------------------------------------
// Validated types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covenant {
    pub id: String,
    pub name: String,
    pub clause_ref: String,
    pub kind: CovenantKind,
    pub threshold_value: Decimal,
    pub operator: CovenantOperator,
    pub unit: String,
    pub current_value: Option<Decimal>,
    pub ratio_category: RatioCategory,
}

impl Covenant {
    /// Validate a raw record and resolve its operator and ratio category.
    pub fn ingest(record: &CovenantRecord) -> CovenantRiskResult<Self> {
        if record.id.trim().is_empty() {
            return Err(CovenantRiskError::InvalidInput {
                field: "id".into(),
                reason: "Covenant id must not be empty".into(),
            });
        }
        if record.name.trim().is_empty() {
            return Err(CovenantRiskError::InvalidInput {
                field: format!("covenant:{} name", record.id),
                reason: "Covenant name must not be empty".into(),
            });
        }

        let operator: CovenantOperator = record.operator.parse()?;
        let ratio_category = record
            .ratio_category
            .unwrap_or_else(|| RatioCategory::classify(&record.name, record.kind));

        if ratio_category != RatioCategory::Other && record.threshold_value.is_sign_negative() {
            return Err(CovenantRiskError::InvalidInput {
                field: format!("covenant:{} threshold_value", record.id),
                reason: format!(
                    "{ratio_category:?} thresholds cannot be negative (got {})",
                    record.threshold_value
                ),
            });
        }

        Ok(Covenant {
            id: record.id.clone(),
            name: record.name.clone(),
            clause_ref: record.clause_ref.clone(),
            kind: record.kind,
            threshold_value: record.threshold_value,
            operator,
            unit: record.unit.clone(),
            current_value: record.current_value,
            ratio_category,
        })
    }
}

impl TryFrom<&CovenantRecord> for Covenant {
    type Error = CovenantRiskError;

    fn try_from(record: &CovenantRecord) -> Result<Self, Self::Error> {
        Covenant::ingest(record)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub covenants: Vec<Covenant>,
}

impl Loan {
    /// Ingest a loan record.
    ///
    /// A malformed loan header is an error. Malformed covenants are dropped
    /// from the loan and returned as failures; the remaining covenants are
    /// kept in input order.
    pub fn ingest(record: &LoanRecord) -> CovenantRiskResult<(Self, Vec<ItemFailure>)> {
        if record.id.trim().is_empty() {
            return Err(CovenantRiskError::InvalidInput {
                field: "loan id".into(),
                reason: "Loan id must not be empty".into(),
            });
        }
        if record.amount.is_sign_negative() {
            return Err(CovenantRiskError::InvalidInput {
                field: format!("loan:{} amount", record.id),
                reason: format!("Loan amount cannot be negative (got {})", record.amount),
            });
        }
        if record.amount > MAX_LOAN_AMOUNT {
            return Err(CovenantRiskError::InvalidInput {
                field: format!("loan:{} amount", record.id),
                reason: format!(
                    "Loan amount {} exceeds the supported maximum of {}",
                    record.amount, MAX_LOAN_AMOUNT
                ),
            });
        }

        let mut failures = Vec::new();
        let mut covenants = Vec::with_capacity(record.covenants.len());
        for cov in &record.covenants {
            match Covenant::ingest(cov) {
                Ok(c) => covenants.push(c),
                Err(e) => failures.push(ItemFailure::from_error(&record.id, Some(&cov.id), &e)),
            }
        }

        let loan = Loan {
            id: record.id.clone(),
            company_name: record.company_name.clone(),
            sector: record.sector.clone(),
            amount: record.amount,
            currency: record.currency.clone(),
            covenants,
        };
        Ok((loan, failures))
    }
}

/// Loans that survived ingestion plus everything that was rejected.
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    pub loans: Vec<Loan>,
    pub failures: Vec<ItemFailure>,
}

/// Ingest a batch of loan records, never stopping at the first bad record.
pub fn ingest_loans(records: &[LoanRecord]) -> Ingestion {
    let mut out = Ingestion {
        loans: Vec::with_capacity(records.len()),
        failures: Vec::new(),
    };
    for record in records {
        match Loan::ingest(record) {
            Ok((loan, failures)) => {
                out.loans.push(loan);
                out.failures.extend(failures);
            }
            Err(e) => out.failures.push(ItemFailure::from_error(&record.id, None, &e)),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
