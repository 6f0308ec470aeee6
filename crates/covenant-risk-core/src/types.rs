use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CovenantRiskError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages expressed as percent points (5 = 5%), matching how covenant
/// cushions and EBITDA shocks are quoted.
pub type Percent = Decimal;

/// Currency code
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    GBP,
    #[default]
    USD,
    EUR,
    CHF,
    JPY,
    CAD,
    AUD,
    HKD,
    SGD,
    Other(String),
}

impl Currency {
    /// ISO-style code for flat exports.
    pub fn code(&self) -> &str {
        match self {
            Currency::GBP => "GBP",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::CHF => "CHF",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::AUD => "AUD",
            Currency::HKD => "HKD",
            Currency::SGD => "SGD",
            Currency::Other(code) => code,
        }
    }
}

/// Classification of a per-item problem that was reported instead of
/// aborting the surrounding loan or portfolio run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    InsufficientData,
    DivisionUndefined,
    Serialization,
}

/// A covenant or loan that could not be (fully) evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub loan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub covenant_id: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl ItemFailure {
    pub fn from_error(
        loan_id: &str,
        covenant_id: Option<&str>,
        error: &CovenantRiskError,
    ) -> Self {
        let kind = match error {
            CovenantRiskError::InvalidInput { .. } => FailureKind::InvalidInput,
            CovenantRiskError::InsufficientData(_) => FailureKind::InsufficientData,
            CovenantRiskError::DivisionUndefined { .. } => FailureKind::DivisionUndefined,
            CovenantRiskError::SerializationError(_) => FailureKind::Serialization,
        };
        ItemFailure {
            loan_id: loan_id.to_string(),
            covenant_id: covenant_id.map(str::to_string),
            kind,
            message: error.to_string(),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_failure_maps_error_kind() {
        let err = CovenantRiskError::DivisionUndefined {
            context: "cushion".into(),
        };
        let failure = ItemFailure::from_error("loan-1", Some("cov-1"), &err);
        assert_eq!(failure.kind, FailureKind::DivisionUndefined);
        assert_eq!(failure.covenant_id.as_deref(), Some("cov-1"));
        assert!(failure.message.contains("cushion"));
    }

    #[test]
    fn test_item_failure_omits_missing_covenant_id() {
        let err = CovenantRiskError::InsufficientData("no covenants".into());
        let failure = ItemFailure::from_error("loan-9", None, &err);
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("covenant_id").is_none());
        assert_eq!(json["kind"], "insufficient_data");
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(Currency::EUR.code(), "EUR");
        assert_eq!(Currency::Other("SEK".into()).code(), "SEK");
    }

    #[test]
    fn test_metadata_envelope() {
        let out = with_metadata("Test", &serde_json::json!({"a": 1}), vec![], 7, 42u32);
        assert_eq!(out.result, 42);
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}
