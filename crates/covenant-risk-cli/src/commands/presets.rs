use serde_json::Value;

use covenant_risk_core::portfolio::list_presets;

pub fn run_presets() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(list_presets())?)
}
