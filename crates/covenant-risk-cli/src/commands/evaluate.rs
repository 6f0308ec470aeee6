use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use covenant_risk_core::covenants::{self, CovenantStressInput};

use super::{CovenantFlags, ScenarioFlags};
use crate::input;

/// Arguments for single covenant evaluation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub covenant: CovenantFlags,

    /// Current observed value
    #[arg(long)]
    pub current: Option<Decimal>,

    #[command(flatten)]
    pub scenario: ScenarioFlags,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: CovenantStressInput = match input::load(args.input.as_deref())? {
        Some(request) => request,
        None => CovenantStressInput {
            covenant: args.covenant.to_record(args.current)?,
            scenario: Default::default(),
        },
    };
    if let Some(scenario) = args.scenario.resolve() {
        request.scenario = scenario;
    }

    let result = covenants::stress_covenant(&request)?;
    Ok(serde_json::to_value(result)?)
}
