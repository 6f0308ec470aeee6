mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::compare::CompareArgs;
use commands::evaluate::EvaluateArgs;
use commands::forecast::ForecastArgs;
use commands::stress::StressTestArgs;
use commands::update::UpdateArgs;
use config::CliConfig;

/// Loan covenant stress testing and breach forecasting
#[derive(Parser)]
#[command(
    name = "covrisk",
    version,
    about = "Loan covenant stress testing and breach forecasting",
    long_about = "Classifies loan covenants as compliant, at risk or breached under \
                  macro stress scenarios (EBITDA decline, interest rate shock), \
                  aggregates portfolio exposure by status and projects covenant trends. \
                  Requests are JSON, read from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// YAML settings file (engine config, log filter)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Debug logging to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stress and classify a single covenant
    Evaluate(EvaluateArgs),
    /// Run a stress scenario across a loan portfolio
    StressTest(StressTestArgs),
    /// Compare a stress scenario against the baseline
    Compare(CompareArgs),
    /// Project a covenant's trend toward its threshold
    Forecast(ForecastArgs),
    /// Recalculate a covenant after a new reported value
    UpdateCovenant(UpdateArgs),
    /// List the named scenario presets
    Presets,
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let settings = match CliConfig::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    init_tracing(settings.log_filter(cli.verbose));

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::evaluate::run_evaluate(args),
        Commands::StressTest(args) => commands::stress::run_stress_test(args, &settings),
        Commands::Compare(args) => commands::compare::run_compare(args, &settings),
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::UpdateCovenant(args) => commands::update::run_update(args),
        Commands::Presets => commands::presets::run_presets(),
        Commands::Version => {
            println!("covrisk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
