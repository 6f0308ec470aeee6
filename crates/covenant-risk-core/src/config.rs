//! Engine configuration.
//!
//! Only execution settings live here. The classification policy (at-risk
//! band, EBITDA floor, liquidity haircut) is fixed in code so that every
//! caller classifies covenants the same way.

use serde::{Deserialize, Serialize};

/// Controls how portfolio evaluation is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Enable parallel evaluation across loans (requires the `parallel` feature).
    pub parallel: bool,

    /// Minimum loan count before parallel evaluation kicks in.
    /// Below this, sequential evaluation is faster than spawning work.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 100,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A config that always evaluates loans one after another.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if `count` loans should be evaluated in parallel.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = EngineConfig::default();
        assert!(config.parallel);
        assert_eq!(config.parallel_threshold, 100);
    }

    #[test]
    fn test_sequential_never_parallelizes() {
        let config = EngineConfig::sequential();
        assert!(!config.parallel);
        assert!(!config.should_parallelize(10_000));
    }

    #[test]
    fn test_should_parallelize() {
        let config = EngineConfig::new().with_threshold(50);

        #[cfg(feature = "parallel")]
        {
            assert!(!config.should_parallelize(49));
            assert!(config.should_parallelize(50));
        }

        #[cfg(not(feature = "parallel"))]
        {
            assert!(!config.should_parallelize(49));
            assert!(!config.should_parallelize(50));
        }
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"parallel_threshold": 8}"#).unwrap();
        assert!(config.parallel);
        assert_eq!(config.parallel_threshold, 8);
    }
}
