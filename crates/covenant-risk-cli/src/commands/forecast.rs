use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use covenant_risk_core::forecast::{self, ForecastInput};

use crate::input;

/// Arguments for covenant trend projection
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ForecastArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Historical values, oldest first (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub values: Option<Vec<Decimal>>,

    /// Covenant threshold
    #[arg(long)]
    pub threshold: Option<Decimal>,

    /// Comparison the value must satisfy: <, <=, >, >=
    #[arg(long)]
    pub operator: Option<String>,

    /// Observation dates, YYYY-MM-DD (comma-separated, one per value)
    #[arg(long, value_delimiter = ',')]
    pub dates: Option<Vec<NaiveDate>>,
}

pub fn run_forecast(args: ForecastArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: ForecastInput = match input::load(args.input.as_deref())? {
        Some(request) => request,
        None => ForecastInput {
            loan_id: None,
            covenant_id: None,
            historical_values: args.values.ok_or("--values is required")?,
            threshold: args.threshold.ok_or("--threshold is required")?,
            operator: args.operator.ok_or("--operator is required")?,
            historical_dates: args.dates,
        },
    };

    let result = forecast::forecast_covenant(&request)?;
    Ok(serde_json::to_value(result)?)
}
