//! Node.js entry points. Every function takes a JSON request string and
//! returns the JSON computation envelope.

use napi::Result as NapiResult;
use napi_derive::napi;

use covenant_risk_core::covenants;
use covenant_risk_core::forecast;
use covenant_risk_core::portfolio;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Covenants
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_covenant(input_json: String) -> NapiResult<String> {
    let input: covenants::CovenantStressInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = covenants::stress_covenant(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn update_covenant_value(input_json: String) -> NapiResult<String> {
    let input: covenants::CovenantUpdateInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = covenants::update_covenant_value(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Portfolio
// ---------------------------------------------------------------------------

#[napi]
pub fn run_stress_test(input_json: String) -> NapiResult<String> {
    let input: portfolio::StressTestInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = portfolio::run_stress_test(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Flat (loan, covenant) rows for spreadsheet export.
#[napi]
pub fn stress_test_rows(input_json: String) -> NapiResult<String> {
    let input: portfolio::StressTestInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = portfolio::run_stress_test(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output.result.heatmap_rows()).map_err(to_napi_error)
}

#[napi]
pub fn compare_scenario(input_json: String) -> NapiResult<String> {
    let input: portfolio::ScenarioComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = portfolio::run_scenario_comparison(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn list_presets() -> NapiResult<String> {
    serde_json::to_string(&portfolio::list_presets()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

#[napi]
pub fn forecast_covenant(input_json: String) -> NapiResult<String> {
    let input: forecast::ForecastInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = forecast::forecast_covenant(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
