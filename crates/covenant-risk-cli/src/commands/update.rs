use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use covenant_risk_core::covenants::{self, CovenantUpdateInput};

use super::CovenantFlags;
use crate::input;

/// Arguments for recording a newly reported covenant value
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct UpdateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub covenant: CovenantFlags,

    /// Previously reported value
    #[arg(long)]
    pub previous: Option<Decimal>,

    /// Newly reported value
    #[arg(long)]
    pub new_value: Option<Decimal>,

    /// Where the figure came from, e.g. "Q4 Financial Statements"
    #[arg(long)]
    pub source: Option<String>,

    /// Submission date, YYYY-MM-DD
    #[arg(long)]
    pub submission_date: Option<NaiveDate>,
}

pub fn run_update(args: UpdateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: CovenantUpdateInput = match input::load(args.input.as_deref())? {
        Some(request) => request,
        None => CovenantUpdateInput {
            covenant: args.covenant.to_record(args.previous)?,
            new_value: args.new_value.ok_or("--new-value is required")?,
            source: args.source,
            submission_date: args.submission_date,
        },
    };

    let result = covenants::update_covenant_value(&request)?;
    Ok(serde_json::to_value(result)?)
}
