use clap::Args;
use serde_json::Value;

use covenant_risk_core::portfolio::{self, StressTestInput};

use super::ScenarioFlags;
use crate::config::CliConfig;
use crate::input;

/// Arguments for a portfolio stress test
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct StressTestArgs {
    /// Path to JSON input file with a `loans` array
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub scenario: ScenarioFlags,

    /// Restrict the run to these loan ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub loan_ids: Option<Vec<String>>,

    /// Emit one flat row per loan covenant instead of the full result
    #[arg(long)]
    pub rows: bool,
}

pub fn run_stress_test(
    args: StressTestArgs,
    settings: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: StressTestInput = input::load(args.input.as_deref())?
        .ok_or("--input file or piped JSON with a `loans` array is required")?;

    if let Some(scenario) = args.scenario.resolve() {
        request.scenario = scenario;
    }
    if args.loan_ids.is_some() {
        request.loan_ids = args.loan_ids;
    }
    settings.apply_engine(&mut request.config);

    let output = portfolio::run_stress_test(&request)?;
    tracing::info!(
        loans = output.result.summary.total_loans_in_scope,
        breached = output.result.summary.breached_count,
        at_risk = output.result.summary.at_risk_count,
        failures = output.result.partial_failures.len(),
        "stress test complete"
    );

    if args.rows {
        return Ok(serde_json::to_value(output.result.heatmap_rows())?);
    }
    Ok(serde_json::to_value(output)?)
}
