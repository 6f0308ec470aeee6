pub mod heatmap;
pub mod parallel;
pub mod scenarios;

pub use heatmap::{
    evaluate_portfolio, run_stress_test, HeatmapRow, PortfolioEvaluation, PortfolioSummary,
    StressTestInput,
};
pub use scenarios::{
    compare_scenario, list_presets, run_scenario_comparison, ImpactedLoan, PresetInfo,
    ScenarioComparison, ScenarioComparisonInput, ScenarioPreset,
};
