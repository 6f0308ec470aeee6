use clap::Args;
use serde_json::Value;

use covenant_risk_core::portfolio::{self, ScenarioComparisonInput};

use super::ScenarioFlags;
use crate::config::CliConfig;
use crate::input;

/// Arguments for baseline versus stressed comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to JSON input file with a `loans` array
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub scenario: ScenarioFlags,

    /// Restrict the run to these loan ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub loan_ids: Option<Vec<String>>,
}

pub fn run_compare(
    args: CompareArgs,
    settings: &CliConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: ScenarioComparisonInput = input::load(args.input.as_deref())?
        .ok_or("--input file or piped JSON with a `loans` array is required")?;

    // A bare preset keeps its display name in the assumptions.
    if args.scenario.has_explicit_shock() {
        request.scenario = args.scenario.resolve();
    } else if let Some(preset) = args.scenario.preset {
        request.scenario = None;
        request.preset = Some(preset);
    }
    if args.loan_ids.is_some() {
        request.loan_ids = args.loan_ids;
    }
    settings.apply_engine(&mut request.config);

    let output = portfolio::run_scenario_comparison(&request)?;
    tracing::info!(
        new_breaches = output.result.total_new_breaches,
        affected_loans = output.result.affected_loans,
        "scenario comparison complete"
    );
    Ok(serde_json::to_value(output)?)
}
