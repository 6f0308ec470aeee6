use thiserror::Error;

#[derive(Debug, Error)]
pub enum CovenantRiskError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division undefined in {context}")]
    DivisionUndefined { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CovenantRiskError {
    fn from(e: serde_json::Error) -> Self {
        CovenantRiskError::SerializationError(e.to_string())
    }
}

impl CovenantRiskError {
    /// Arithmetic on `field` left the representable `Decimal` range.
    pub fn out_of_range(field: &str) -> Self {
        CovenantRiskError::InvalidInput {
            field: field.to_string(),
            reason: "result is outside the representable decimal range".into(),
        }
    }
}
