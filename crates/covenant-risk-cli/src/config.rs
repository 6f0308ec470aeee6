//! Optional YAML settings passed with `--config`.
//!
//! ```yaml
//! engine:
//!   parallel: true
//!   parallel_threshold: 50
//! log_filter: covenant_risk_core=debug
//! ```

use covenant_risk_core::EngineConfig;
use serde::Deserialize;

use crate::input;

/// Tracing filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "warn,covenant_risk_core=info,covrisk=info";
const VERBOSE_LOG_FILTER: &str = "info,covenant_risk_core=debug,covrisk=debug";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Replaces any `config` block embedded in a request.
    pub engine: Option<EngineConfig>,
    pub log_filter: Option<String>,
}

impl CliConfig {
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => input::file::read_yaml(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Fallback filter when `RUST_LOG` is unset.
    pub fn log_filter(&self, verbose: bool) -> &str {
        if verbose {
            VERBOSE_LOG_FILTER
        } else {
            self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
        }
    }

    pub fn apply_engine(&self, embedded: &mut EngineConfig) {
        if let Some(engine) = &self.engine {
            *embedded = engine.clone();
        }
    }
}
