pub mod config;
pub mod covenants;
pub mod error;
pub mod types;

#[cfg(feature = "portfolio")]
pub mod portfolio;

#[cfg(feature = "forecast")]
pub mod forecast;

pub use config::EngineConfig;
pub use error::CovenantRiskError;
pub use types::*;

/// Standard result type for all covenant-risk operations
pub type CovenantRiskResult<T> = Result<T, CovenantRiskError>;
